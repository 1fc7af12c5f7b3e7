use chota_core::{Repository, ShortUrlRecord};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, trace};

/// Who followed a short link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickSource {
    Browser,
    Api,
}

impl ClickSource {
    /// Browsers announce themselves as `Mozilla/...`; anything else is an API client.
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.contains("Mozilla") {
            ClickSource::Browser
        } else {
            ClickSource::Api
        }
    }
}

/// Counts resolutions without holding up the request that caused them.
///
/// Counters are best-effort: the update is written through in a detached
/// task, concurrent clicks on the same record may overwrite each other, and
/// failures are only logged.
#[derive(Debug)]
pub struct ClickTracker<R> {
    repository: Arc<R>,
}

impl<R> Clone for ClickTracker<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: Repository> ClickTracker<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Bumps the counter for `source` on `record` and persists it in the
    /// background. Awaiting the returned handle is optional.
    pub fn track(&self, record: &mut ShortUrlRecord, source: ClickSource) -> JoinHandle<()> {
        match source {
            ClickSource::Browser => {
                record.browser_click_count = record.browser_click_count.saturating_add(1)
            }
            ClickSource::Api => record.api_click_count = record.api_click_count.saturating_add(1),
        }

        let repository = Arc::clone(&self.repository);
        let snapshot = record.clone();
        tokio::spawn(async move {
            match repository.update_counters(&snapshot).await {
                Ok(()) => trace!(code = %snapshot.short_code, ?source, "Click recorded"),
                Err(e) => error!(
                    code = %snapshot.short_code,
                    ?source,
                    error = %e,
                    "Failed to record click"
                ),
            }
        })
    }
}
