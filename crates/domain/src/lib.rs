pub mod admission;
mod commands;
mod error;
mod events;
mod models;

pub use commands::{CastVote, ClientInfo, SubmitComment, Submission};
pub use error::EngineError;
pub use events::CommentEvent;
pub use models::{
    strip_domain, Comment, CommentState, Commenter, DomainConfig, DomainState, Identity,
    NotificationPolicy, Page, Direction, ANONYMOUS, ROOT_PARENT,
};
