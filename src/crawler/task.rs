//! Fetch task: one request attempt for one link
//!
//! A task never touches dispatcher state. It runs to completion on the
//! runtime and hands back a [`Completion`] describing what happened; the
//! dispatcher applies it under its lock.

use crate::crawler::fetcher::{read_body, Transport};
use crate::crawler::parser::{decode_html, LinkExtractor};
use crate::crawler::Link;
use crate::filter::DownloadFilterChain;
use crate::state::FailureKind;
use crate::storage::{download_path, FileSink, WriteError};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Identifies one admission of a task into the in-flight set
pub type TaskId = u64;

/// The collaborators every fetch task works through
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub sink: Arc<dyn FileSink>,
}

impl Collaborators {
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn LinkExtractor>,
        sink: Arc<dyn FileSink>,
    ) -> Self {
        Self {
            transport,
            extractor,
            sink,
        }
    }
}

/// Settings captured when a task is admitted
///
/// Changing filters or the output directory mid-round only affects tasks
/// admitted afterwards.
#[derive(Debug, Clone)]
pub struct TaskPlan {
    pub download_filters: DownloadFilterChain,
    pub output_dir: PathBuf,
}

/// What a single attempt produced
#[derive(Debug)]
pub enum TaskOutcome {
    /// An HTML page was parsed; these links were found on it
    Page { discovered: Vec<Link> },

    /// A download was written to disk
    Saved { path: PathBuf, bytes: u64 },

    /// A non-HTML response that no download filter wanted
    Skipped { content_type: Option<String> },

    /// A wanted download could not be written
    WriteFailed { error: WriteError },

    /// The request or the page itself failed
    Failed { kind: FailureKind, message: String },
}

/// A finished attempt, sent back to the dispatcher
#[derive(Debug)]
pub struct Completion {
    pub task: FetchTask,
    pub outcome: TaskOutcome,
}

/// A link plus the number of attempts made on it so far
#[derive(Debug, Clone)]
pub struct FetchTask {
    id: TaskId,
    link: Link,
    attempts: u32,
}

impl FetchTask {
    pub fn new(id: TaskId, link: Link) -> Self {
        Self {
            id,
            link,
            attempts: 0,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Attempts made so far, including one currently running
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Gives the task a new identity for its next admission
    pub(crate) fn readmit(&mut self, id: TaskId) {
        self.id = id;
    }

    /// Performs exactly one attempt
    pub async fn run(mut self, collaborators: &Collaborators, plan: &TaskPlan) -> Completion {
        self.attempts += 1;
        tracing::debug!("Attempt {} for {}", self.attempts, self.link.url());

        let outcome = self.attempt(collaborators, plan).await;
        Completion {
            task: self,
            outcome,
        }
    }

    async fn attempt(&self, collaborators: &Collaborators, plan: &TaskPlan) -> TaskOutcome {
        let url = self.link.url();

        let response = match collaborators.transport.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                return TaskOutcome::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        if response.status != 200 {
            return TaskOutcome::Failed {
                kind: FailureKind::HttpError,
                message: format!("{} returned status {}", url, response.status),
            };
        }

        if is_html(&response.headers) {
            let body = match read_body(response.body).await {
                Ok(body) => body,
                Err(e) => {
                    return TaskOutcome::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };

            return match decode_html(url, body) {
                Ok(html) => TaskOutcome::Page {
                    discovered: self.resolve_links(collaborators.extractor.as_ref(), &html),
                },
                Err(e) => TaskOutcome::Failed {
                    kind: FailureKind::Parse,
                    message: e.to_string(),
                },
            };
        }

        if !plan.download_filters.is_desired(&response.headers) {
            return TaskOutcome::Skipped {
                content_type: content_type(&response.headers),
            };
        }

        let path = download_path(&plan.output_dir, url);
        match collaborators.sink.write_stream(&path, response.body).await {
            Ok(bytes) => TaskOutcome::Saved { path, bytes },
            Err(error) => TaskOutcome::WriteFailed { error },
        }
    }

    fn resolve_links(&self, extractor: &dyn LinkExtractor, html: &str) -> Vec<Link> {
        let page = match Url::parse(self.link.url()) {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!("Cannot resolve links of {}: {}", self.link.url(), e);
                return Vec::new();
            }
        };

        extractor
            .extract_links(html)
            .into_iter()
            .filter_map(|raw| {
                crate::url::resolve_link(&raw.href, &page)
                    .map(|url| Link::with_markup(url, raw.text, raw.markup))
            })
            .collect()
    }
}

/// Returns true if any Content-Type value announces HTML
fn is_html(headers: &HeaderMap) -> bool {
    headers.get_all(CONTENT_TYPE).iter().any(|value| {
        value
            .to_str()
            .map(|v| v.trim_start().to_ascii_lowercase().starts_with("text/html"))
            .unwrap_or(false)
    })
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{FakeTransport, MemorySink};
    use crate::crawler::HtmlLinkExtractor;
    use crate::filter::{DownloadFilter, MimeFilter};
    use std::path::Path;

    fn collaborators(transport: FakeTransport, sink: Arc<MemorySink>) -> Collaborators {
        Collaborators::new(Arc::new(transport), Arc::new(HtmlLinkExtractor), sink)
    }

    fn plan(filters: Vec<Arc<dyn DownloadFilter>>) -> TaskPlan {
        TaskPlan {
            download_filters: DownloadFilterChain::from_filters(filters),
            output_dir: PathBuf::from("/downloads"),
        }
    }

    #[tokio::test]
    async fn test_html_page_yields_resolved_links() {
        let transport = FakeTransport::new().html(
            "http://x.test/dir/a",
            r##"<a href="/b">B</a><a href="c.html">C</a><a href="d">D</a>
                <a href="#top">top</a><a href="mailto:m@x.test">m</a>"##,
        );
        let sink = Arc::new(MemorySink::new());

        let completion = FetchTask::new(1, Link::new("http://x.test/dir/a"))
            .run(&collaborators(transport, sink), &plan(vec![]))
            .await;

        assert_eq!(completion.task.attempts(), 1);
        match completion.outcome {
            TaskOutcome::Page { discovered } => {
                let urls: Vec<_> = discovered.iter().map(|l| l.url()).collect();
                assert_eq!(urls, vec!["http://x.test/b", "http://x.test/dir/c.html"]);
                assert_eq!(discovered[0].text(), "B");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_200_is_http_error() {
        let transport = FakeTransport::new().status("http://x.test/gone", 404);
        let completion = FetchTask::new(1, Link::new("http://x.test/gone"))
            .run(&collaborators(transport, Arc::new(MemorySink::new())), &plan(vec![]))
            .await;

        assert!(matches!(
            completion.outcome,
            TaskOutcome::Failed {
                kind: FailureKind::HttpError,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_page_is_parse_failure() {
        let transport =
            FakeTransport::new().file("http://x.test/bad", "text/html", vec![0xff, 0xfe, 0xfd]);
        let completion = FetchTask::new(1, Link::new("http://x.test/bad"))
            .run(&collaborators(transport, Arc::new(MemorySink::new())), &plan(vec![]))
            .await;

        assert!(matches!(
            completion.outcome,
            TaskOutcome::Failed {
                kind: FailureKind::Parse,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_latin1_byte_does_not_hide_links() {
        let transport = FakeTransport::new().file(
            "http://x.test/cafe",
            "text/html",
            b"<p>caf\xE9</p><a href=\"/b\">B</a><a href=\"/f.zip\">F</a>".to_vec(),
        );
        let completion = FetchTask::new(1, Link::new("http://x.test/cafe"))
            .run(&collaborators(transport, Arc::new(MemorySink::new())), &plan(vec![]))
            .await;

        match completion.outcome {
            TaskOutcome::Page { discovered } => {
                let urls: Vec<_> = discovered.iter().map(|l| l.url()).collect();
                assert_eq!(urls, vec!["http://x.test/b", "http://x.test/f.zip"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_desired_download_is_saved_under_output_dir() {
        let transport = FakeTransport::new().file(
            "http://x.test/files/f.zip",
            "application/zip",
            b"PK".to_vec(),
        );
        let sink = Arc::new(MemorySink::new());
        let filters: Vec<Arc<dyn DownloadFilter>> = vec![Arc::new(MimeFilter::new("application/"))];

        let completion = FetchTask::new(1, Link::new("http://x.test/files/f.zip"))
            .run(&collaborators(transport, Arc::clone(&sink)), &plan(filters))
            .await;

        match completion.outcome {
            TaskOutcome::Saved { path, bytes } => {
                assert_eq!(path, Path::new("/downloads/f.zip"));
                assert_eq!(bytes, 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(sink.file(Path::new("/downloads/f.zip")), Some(b"PK".to_vec()));
    }

    #[tokio::test]
    async fn test_unwanted_download_is_skipped() {
        let transport =
            FakeTransport::new().file("http://x.test/pic.png", "image/png", b"\x89PNG".to_vec());
        let sink = Arc::new(MemorySink::new());
        let filters: Vec<Arc<dyn DownloadFilter>> = vec![Arc::new(MimeFilter::new("audio/"))];

        let completion = FetchTask::new(1, Link::new("http://x.test/pic.png"))
            .run(&collaborators(transport, Arc::clone(&sink)), &plan(filters))
            .await;

        match completion.outcome {
            TaskOutcome::Skipped { content_type } => {
                assert_eq!(content_type.as_deref(), Some("image/png"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(sink.write_count(), 0);
    }

    #[tokio::test]
    async fn test_attempts_accumulate_across_runs() {
        let transport = FakeTransport::new().status("http://x.test/a", 500);
        let collaborators = collaborators(transport, Arc::new(MemorySink::new()));

        let first = FetchTask::new(1, Link::new("http://x.test/a"))
            .run(&collaborators, &plan(vec![]))
            .await;
        let second = first.task.run(&collaborators, &plan(vec![])).await;

        assert_eq!(second.task.attempts(), 2);
    }

    #[test]
    fn test_is_html() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/html; charset=utf-8".parse().unwrap());
        assert!(is_html(&headers));

        headers.insert(CONTENT_TYPE, "application/xhtml+xml".parse().unwrap());
        assert!(!is_html(&headers));

        headers.append(CONTENT_TYPE, "text/html".parse().unwrap());
        assert!(is_html(&headers));
    }
}
