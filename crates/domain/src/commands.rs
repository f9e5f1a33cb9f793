use chrono::NaiveDateTime;

/// Request context the spam classifier needs.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

/// A new comment as it arrives from the widget, before anything is resolved.
#[derive(Debug, Clone, Default)]
pub struct SubmitComment {
    pub commenter_token: String,
    pub domain: String,
    // may be empty
    pub path: String,
    pub post_id: String,
    pub parent_hex: String,
    pub markdown: String,
}

/// Submission with the domain already normalised; identity and config are passed alongside.
#[derive(Debug, Clone)]
pub struct Submission {
    pub domain: String,
    pub path: String,
    pub post_id: String,
    pub parent_hex: String,
    pub markdown: String,
    /// Overrides the creation date (bulk import). `None` means now.
    pub creation_date: Option<NaiveDateTime>,
    pub client: ClientInfo,
}

impl Submission {
    pub fn has_required_fields(&self) -> bool {
        !(self.domain.is_empty()
            || self.post_id.is_empty()
            || self.parent_hex.is_empty()
            || self.markdown.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CastVote {
    pub commenter_token: String,
    pub comment_hex: String,
    pub direction: i64,
}
