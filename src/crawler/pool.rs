//! Reusable pool of transport clients
//!
//! Each fetch attempt checks a client out and the guard puts it back when it
//! is dropped, on every path including early returns and failures.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A pool of idle resources, created on demand
#[derive(Debug)]
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    max_idle: usize,
    created: AtomicUsize,
}

impl<T> Pool<T> {
    /// Creates an empty pool that keeps at most `max_idle` resources around
    pub fn new(max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
            created: AtomicUsize::new(0),
        })
    }

    /// Takes an idle resource, or builds one with `create` if none is idle
    pub fn checkout<E>(
        self: &Arc<Self>,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<Pooled<T>, E> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let item = match reused {
            Some(item) => item,
            None => {
                let item = create()?;
                self.created.fetch_add(1, Ordering::Relaxed);
                item
            }
        };

        Ok(Pooled {
            item: Some(item),
            pool: Arc::clone(self),
        })
    }

    /// Number of resources waiting to be reused
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of resources built over the pool's lifetime
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    fn give_back(&self, item: T) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(item);
        }
    }
}

/// A resource checked out of a [`Pool`]; returned on drop
#[derive(Debug)]
pub struct Pooled<T> {
    /// `Some` for the guard's whole life; `drop` is the only place it is taken
    item: Option<T>,
    pool: Arc<Pool<T>>,
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item
            .as_ref()
            .expect("pooled item is only taken when the guard drops")
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.give_back(item);
        }
    }
}
