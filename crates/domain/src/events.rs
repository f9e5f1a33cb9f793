use crate::models::CommentState;
use serde::{Deserialize, Serialize};

/// Emitted after a comment write has committed. Consumers must not feed back into admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommentEvent {
    Admitted {
        domain: String,
        path: String,
        commenter_hex: String,
        comment_hex: String,
        parent_hex: String,
        html: String,
        state: CommentState,
    },
}
