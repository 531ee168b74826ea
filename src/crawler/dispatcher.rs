//! Dispatcher - bounded-concurrency round scheduler
//!
//! All bookkeeping lives behind one mutex:
//! - the frontier and both filter chains
//! - the pending and retry queues
//! - the in-flight set, keyed by task id
//! - the phase and the round statistics
//!
//! The lock is never held across an await. Fetch tasks run on the tokio
//! runtime and send their [`Completion`] over a channel; the event loop in
//! [`Dispatcher::run`] applies each one under the lock and refills the
//! in-flight set. The round-completion callback runs after the lock is
//! released, on whichever task observed quiescence.

use crate::crawler::task::{Collaborators, Completion, FetchTask, TaskId, TaskOutcome, TaskPlan};
use crate::crawler::{Frontier, Link};
use crate::filter::{DownloadFilterChain, LinkFilterChain};
use crate::output::RoundStatistics;
use crate::state::{DispatchPhase, FailureKind};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;

/// Invoked once every time a round reaches quiescence
pub type RoundCallback = Arc<dyn Fn() + Send + Sync>;

/// Everything guarded by the dispatcher lock
#[derive(Debug)]
pub struct DispatchState {
    pub frontier: Frontier,
    pub pending: VecDeque<Link>,
    pub retry: VecDeque<FetchTask>,
    pub in_flight: HashMap<TaskId, AbortHandle>,
    pub link_filters: LinkFilterChain,
    pub download_filters: DownloadFilterChain,
    pub output_dir: PathBuf,
    pub phase: DispatchPhase,
    pub stats: RoundStatistics,
    pub round: u64,
}

impl DispatchState {
    fn new(output_dir: PathBuf) -> Self {
        Self {
            frontier: Frontier::new(),
            pending: VecDeque::new(),
            retry: VecDeque::new(),
            in_flight: HashMap::new(),
            link_filters: LinkFilterChain::new(),
            download_filters: DownloadFilterChain::new(),
            output_dir,
            phase: DispatchPhase::Idle,
            stats: RoundStatistics::default(),
            round: 0,
        }
    }

    fn set_phase(&mut self, next: DispatchPhase) {
        debug_assert!(self.phase.can_transition_to(next));
        tracing::debug!("Dispatch phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}

/// Admission limits for a dispatcher
#[derive(Debug, Clone, Copy)]
pub struct DispatchLimits {
    /// Maximum number of tasks in flight at once
    pub max_concurrency: usize,
    /// Total attempts allowed for a download that keeps failing to write
    pub max_retries: u32,
}

/// Admission-controlled scheduler for fetch tasks
pub struct Dispatcher {
    state: Mutex<DispatchState>,
    collaborators: Collaborators,
    completions: UnboundedSender<Completion>,
    runtime: Handle,
    limits: DispatchLimits,
    next_task_id: AtomicU64,
    on_round_complete: RoundCallback,
}

impl Dispatcher {
    /// Creates a dispatcher and the receiving end of its completion channel
    ///
    /// The receiver must be handed to [`Dispatcher::run`] for completions to
    /// be applied.
    pub fn new(
        limits: DispatchLimits,
        collaborators: Collaborators,
        output_dir: PathBuf,
        runtime: Handle,
        on_round_complete: RoundCallback,
    ) -> (Arc<Self>, UnboundedReceiver<Completion>) {
        let (completions, receiver) = mpsc::unbounded_channel();

        let dispatcher = Arc::new(Self {
            state: Mutex::new(DispatchState::new(output_dir)),
            collaborators,
            completions,
            runtime,
            limits,
            next_task_id: AtomicU64::new(1),
            on_round_complete,
        });

        (dispatcher, receiver)
    }

    /// Applies completions until the channel closes
    pub async fn run(self: Arc<Self>, mut completions: UnboundedReceiver<Completion>) {
        while let Some(completion) = completions.recv().await {
            self.complete(completion);
        }
        tracing::debug!("Dispatcher event loop finished");
    }

    /// Runs `f` with exclusive access to the dispatcher state
    ///
    /// `f` must not block; it runs under the dispatcher lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut DispatchState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Starts a round: filters the frontier into the pending queue and admits work
    ///
    /// Returns false without doing anything if a round is already draining.
    pub fn start_round(&self) -> bool {
        let quiescent = {
            let mut guard = self.lock();
            let state = &mut *guard;

            if state.phase.is_draining() {
                tracing::warn!("Round {} is still running; ignoring go", state.round);
                return false;
            }

            state.round += 1;
            state.pending = state.frontier.begin_round(&state.link_filters);
            state.stats = RoundStatistics::new(state.round);
            state.stats.seeded = state.pending.len();
            state.set_phase(DispatchPhase::Draining);

            tracing::info!(
                "Round {} started with {} links",
                state.round,
                state.pending.len()
            );

            self.pump(state)
        };

        if quiescent {
            (self.on_round_complete)();
        }
        true
    }

    /// Aborts all in-flight work and forgets every link and filter
    ///
    /// Returns without waiting for aborted tasks to wind down; anything they
    /// still report is ignored.
    pub fn stop(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;

        let aborted = state.in_flight.len();
        for (_, handle) in state.in_flight.drain() {
            handle.abort();
        }

        state.pending.clear();
        state.retry.clear();
        state.frontier.clear();
        state.link_filters.clear();
        state.download_filters.clear();
        state.stats.finish();
        state.set_phase(DispatchPhase::Idle);

        tracing::info!("Dispatcher stopped, {} tasks aborted", aborted);
    }

    /// Applies one finished attempt and refills the in-flight set
    pub fn complete(&self, completion: Completion) {
        let quiescent = {
            let mut guard = self.lock();
            let state = &mut *guard;

            if state.in_flight.remove(&completion.task.id()).is_none() {
                tracing::trace!(
                    "Ignoring late completion for {}",
                    completion.task.link().url()
                );
                return;
            }

            self.apply(state, completion);
            self.pump(state)
        };

        if quiescent {
            (self.on_round_complete)();
        }
    }

    fn apply(&self, state: &mut DispatchState, completion: Completion) {
        let Completion { mut task, outcome } = completion;
        let url = task.link().url().to_string();

        match outcome {
            TaskOutcome::Page { discovered } => {
                state.stats.pages_parsed += 1;
                let found = discovered.len();
                let mut added = 0;
                for link in discovered {
                    if state.frontier.add_link(link, &state.link_filters) {
                        added += 1;
                    }
                }
                state.stats.links_discovered += added;
                tracing::debug!("{}: {} links found, {} new", url, found, added);
            }
            TaskOutcome::Saved { path, bytes } => {
                state.stats.files_saved += 1;
                state.stats.bytes_saved += bytes;
                tracing::info!("Saved {} ({} bytes)", path.display(), bytes);
            }
            TaskOutcome::Skipped { content_type } => {
                state.stats.skipped += 1;
                tracing::debug!(
                    "{}: no download filter wants {}",
                    url,
                    content_type.as_deref().unwrap_or("unknown content type")
                );
            }
            TaskOutcome::WriteFailed { error } => {
                state.stats.record_failure(FailureKind::Write);
                if task.attempts() < self.limits.max_retries {
                    tracing::warn!(
                        "Attempt {} for {} failed: {}; queued for retry",
                        task.attempts(),
                        url,
                        error
                    );
                    task.readmit(self.next_id());
                    state.stats.retries_queued += 1;
                    state.retry.push_back(task);
                } else {
                    tracing::warn!(
                        "Giving up on {} after {} attempts: {}",
                        url,
                        task.attempts(),
                        error
                    );
                    state.stats.downloads_dropped += 1;
                }
            }
            TaskOutcome::Failed { kind, message } => {
                state.stats.record_failure(kind);
                tracing::debug!("{} failed ({}): {}", url, kind, message);
            }
        }
    }

    /// Admits queued work up to the concurrency cap
    ///
    /// Retries go first, then pending links in FIFO order. Returns true if the
    /// round just became quiescent.
    fn pump(&self, state: &mut DispatchState) -> bool {
        if !state.phase.is_draining() {
            return false;
        }

        while state.in_flight.len() < self.limits.max_concurrency {
            if let Some(task) = state.retry.pop_front() {
                self.admit(state, task);
            } else if let Some(link) = state.pending.pop_front() {
                let task = FetchTask::new(self.next_id(), link);
                self.admit(state, task);
            } else {
                break;
            }
        }

        if state.retry.is_empty() && state.pending.is_empty() && state.in_flight.is_empty() {
            state.set_phase(DispatchPhase::Quiescent);
            state.stats.finish();
            tracing::info!(
                "Round {} complete: {} attempts, {} new links, {} files saved, {} failures",
                state.round,
                state.stats.attempts,
                state.stats.links_discovered,
                state.stats.files_saved,
                state.stats.total_failures()
            );
            return true;
        }

        false
    }

    fn admit(&self, state: &mut DispatchState, task: FetchTask) {
        let id = task.id();
        tracing::debug!("Admitting task {} for {}", id, task.link().url());

        let collaborators = self.collaborators.clone();
        let plan = TaskPlan {
            download_filters: state.download_filters.clone(),
            output_dir: state.output_dir.clone(),
        };
        let completions = self.completions.clone();

        let handle = self.runtime.spawn(async move {
            let completion = task.run(&collaborators, &plan).await;
            if completions.send(completion).is_err() {
                tracing::trace!("Dispatcher gone; dropping completion of task {}", id);
            }
        });

        state.in_flight.insert(id, handle.abort_handle());
        state.stats.attempts += 1;
        state.stats.peak_in_flight = state.stats.peak_in_flight.max(state.in_flight.len());
    }

    fn next_id(&self) -> TaskId {
        self.next_task_id.fetch_add(1, Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
