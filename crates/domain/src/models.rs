use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author id stored on comments posted without an identity.
pub const ANONYMOUS: &str = "anonymous";

/// Parent id of top-level comments.
pub const ROOT_PARENT: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    Approved,
    Unapproved,
    Flagged,
}

impl CommentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentState::Approved => "approved",
            CommentState::Unapproved => "unapproved",
            CommentState::Flagged => "flagged",
        }
    }
}

impl fmt::Display for CommentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(CommentState::Approved),
            "unapproved" => Ok(CommentState::Unapproved),
            "flagged" => Ok(CommentState::Flagged),
            other => Err(format!("unknown comment state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment_hex: String,
    pub domain: String,
    pub path: String,
    pub post_id: String,
    pub commenter_hex: String,
    pub parent_hex: String,
    pub markdown: String,
    pub html: String,
    pub creation_date: NaiveDateTime,
    pub state: CommentState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainState {
    #[default]
    Unfrozen,
    Frozen,
}

impl FromStr for DomainState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfrozen" => Ok(DomainState::Unfrozen),
            "frozen" => Ok(DomainState::Frozen),
            other => Err(format!("unknown domain state: {}", other)),
        }
    }
}

impl DomainState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainState::Unfrozen => "unfrozen",
            DomainState::Frozen => "frozen",
        }
    }
}

/// Who gets told about a freshly admitted comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationPolicy {
    All,
    #[default]
    PendingModeration,
    None,
}

impl NotificationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPolicy::All => "all",
            NotificationPolicy::PendingModeration => "pending-moderation",
            NotificationPolicy::None => "none",
        }
    }
}

impl FromStr for NotificationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(NotificationPolicy::All),
            "pending-moderation" => Ok(NotificationPolicy::PendingModeration),
            "none" => Ok(NotificationPolicy::None),
            other => Err(format!("unknown notification policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub domain: String,
    pub name: String,
    pub state: DomainState,
    pub require_identification: bool,
    pub require_moderation: bool,
    pub moderate_all_anonymous: bool,
    pub notification_policy: NotificationPolicy,
    /// Moderator emails.
    pub moderators: Vec<String>,
}

impl DomainConfig {
    pub fn is_frozen(&self) -> bool {
        self.state == DomainState::Frozen
    }

    pub fn is_moderator(&self, email: &str) -> bool {
        self.moderators.iter().any(|m| m == email)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub domain: String,
    pub path: String,
    pub is_locked: bool,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commenter {
    pub commenter_hex: String,
    pub email: String,
    pub name: String,
    pub link: String,
    pub cnt_tokens: i64,
    pub available_likes: i64,
}

/// Resolved author of a submission.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Commenter(Commenter),
}

impl Identity {
    pub fn commenter_hex(&self) -> &str {
        match self {
            Identity::Anonymous => ANONYMOUS,
            Identity::Commenter(c) => &c.commenter_hex,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// Vote direction, always one of -1, 0, +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Neutral,
    Up,
}

impl Direction {
    pub fn value(self) -> i64 {
        match self {
            Direction::Down => -1,
            Direction::Neutral => 0,
            Direction::Up => 1,
        }
    }
}

impl From<i64> for Direction {
    fn from(raw: i64) -> Self {
        match raw.signum() {
            1 => Direction::Up,
            -1 => Direction::Down,
            _ => Direction::Neutral,
        }
    }
}

/// Reduces a widget-supplied domain ("https://example.com/blog/") to the bare host.
pub fn strip_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .split('/')
        .next()
        .unwrap_or("")
        .to_string()
}
