use crate::domain::{Article, User};
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Outbound announcement hook fired when an article is approved.
/// Failures are reported to the caller but must never roll back approval.
#[async_trait]
pub trait ShareNotifier: Send + Sync {
    async fn share_article(&self, article: &Article, author: &User) -> Result<()>;
}

/// Default notifier: logs the announcement and succeeds.
pub struct NoopNotifier;

#[async_trait]
impl ShareNotifier for NoopNotifier {
    async fn share_article(&self, article: &Article, author: &User) -> Result<()> {
        debug!(
            "Share hook (noop): '{}' by {}",
            article.title, author.username
        );
        Ok(())
    }
}

/// POSTs an announcement to a configured webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ShareNotifier for WebhookNotifier {
    async fn share_article(&self, article: &Article, author: &User) -> Result<()> {
        let payload = serde_json::json!({
            "article_id": article.id,
            "title": article.title,
            "author": author.username,
        });
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        debug!("Shared article '{}' to webhook", article.title);
        Ok(())
    }
}
