use anyhow::Result;
use async_trait::async_trait;
use domain::CommentState;
use serde::Serialize;

/// Everything the classifier gets to see about a submission.
#[derive(Debug, Clone, Default)]
pub struct SpamCheck<'a> {
    pub domain: &'a str,
    pub ip: &'a str,
    pub user_agent: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub link: &'a str,
    pub text: &'a str,
}

#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn is_spam(&self, check: &SpamCheck<'_>) -> Result<bool>;
}

/// Price of commenting on a post. Not authoritative about balances.
#[async_trait]
pub trait PricingService: Send + Sync {
    async fn price_of(&self, post_id: &str) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// A moderator is told about a comment on their domain.
    Moderator,
    /// A commenter is told someone replied to them.
    Reply,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundNotification {
    pub kind: NotificationKind,
    pub to: String,
    pub domain: String,
    pub path: String,
    pub comment_hex: String,
    pub author_name: String,
    pub html: String,
    pub state: CommentState,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &OutboundNotification) -> Result<()>;
}
