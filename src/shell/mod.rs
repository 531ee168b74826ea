//! Interactive command shell
//!
//! Reads one command per line, applies it to the coordinator and, for
//! commands that start a round, waits for the round to finish before printing
//! the desired links and the round statistics.

mod command;

pub use command::{parse_command, Command, CommandError, HELP};

use crate::crawler::Coordinator;
use crate::filter::{
    DomainFilter, DownloadFilter, LinkFilter, MimeFilter, RegexFilter, TitleFilter,
    WildcardFilter,
};
use crate::output::{print_links, print_statistics};
use crate::CrawlError;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;

/// Whether the shell keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Drives a [`Coordinator`] from text commands
pub struct Shell {
    coordinator: Coordinator,
    round_done: Arc<Notify>,
}

impl Shell {
    /// Creates a shell; `round_done` must be notified by the coordinator's
    /// round-completion callback
    pub fn new(coordinator: Coordinator, round_done: Arc<Notify>) -> Self {
        Self {
            coordinator,
            round_done,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Reads and executes commands until `quit`, end of input or Ctrl-C at
    /// the prompt
    pub async fn run<R>(&self, input: R) -> Result<(), CrawlError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.run_until(input, interrupted).await
    }

    async fn run_until<R, F, Fut>(&self, input: R, interrupt: F) -> Result<(), CrawlError>
    where
        R: AsyncBufRead + Unpin,
        F: Fn() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut lines = input.lines();

        loop {
            prompt();
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = interrupt() => {
                    println!();
                    tracing::info!("Interrupted at the prompt, leaving");
                    break;
                }
            };
            let Some(line) = line else {
                break;
            };

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            match self.execute(command).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => println!("{}", e),
            }
        }

        self.coordinator.stop();
        Ok(())
    }

    /// Executes a single command
    ///
    /// Filter arguments are validated before anything changes, so a bad
    /// pattern leaves the current filters in place and starts no round.
    pub async fn execute(&self, command: Command) -> Result<Flow, CrawlError> {
        tracing::debug!("Executing {:?}", command);
        let starts_round = command.starts_round();

        match command {
            Command::Go(seed) => {
                if let Some(url) = seed {
                    self.coordinator.add_seed(&url);
                }
            }
            Command::Regex(patterns) => {
                self.install_link_filters(compile(&patterns, RegexFilter::new)?);
            }
            Command::Title(patterns) => {
                self.install_link_filters(compile(&patterns, TitleFilter::new)?);
            }
            Command::Wildcard(patterns) => {
                let filters = patterns
                    .iter()
                    .map(|p| Arc::new(WildcardFilter::containing(p)) as Arc<dyn LinkFilter>)
                    .collect();
                self.install_link_filters(filters);
            }
            Command::Domain(domains) => {
                let filters = domains
                    .iter()
                    .map(|d| Arc::new(DomainFilter::new(d.as_str())) as Arc<dyn LinkFilter>)
                    .collect();
                self.install_link_filters(filters);
            }
            Command::Mime(types) => {
                if !types.is_empty() {
                    let filters = types
                        .iter()
                        .map(|t| Arc::new(MimeFilter::from_alias(t)) as Arc<dyn DownloadFilter>)
                        .collect();
                    self.coordinator.set_download_filters(filters);
                }
            }
            Command::Save(dir) => self.coordinator.set_output_dir(dir)?,
            Command::Clear => self.coordinator.stop(),
            Command::Links => print_links(&self.coordinator.desired_links()),
            Command::Stats => print_statistics(&self.coordinator.round_statistics()),
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::Empty => {}
        }

        if starts_round {
            self.run_round().await;
        }

        Ok(Flow::Continue)
    }

    /// A command without arguments keeps the current filters
    fn install_link_filters(&self, filters: Vec<Arc<dyn LinkFilter>>) {
        if !filters.is_empty() {
            self.coordinator.set_link_filters(filters);
        }
    }

    async fn run_round(&self) {
        if !self.coordinator.go() {
            println!("A round is already running");
            return;
        }

        tokio::select! {
            _ = self.round_done.notified() => {}
            _ = interrupted() => {
                tracing::warn!("Interrupted, stopping the crawl");
                self.coordinator.stop();
            }
        }

        print_links(&self.coordinator.desired_links());
        print_statistics(&self.coordinator.round_statistics());
    }
}

/// Builds one filter per pattern, failing on the first invalid one
fn compile<F>(
    patterns: &[String],
    build: impl Fn(&str) -> Result<F, regex::Error>,
) -> Result<Vec<Arc<dyn LinkFilter>>, regex::Error>
where
    F: LinkFilter + 'static,
{
    patterns
        .iter()
        .map(|p| build(p).map(|f| Arc::new(f) as Arc<dyn LinkFilter>))
        .collect()
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn prompt() {
    print!("> ");
    // A failed flush only loses the prompt
    let _ = std::io::stdout().flush();
}
