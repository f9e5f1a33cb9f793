use thiserror::Error;

/// Everything admission and voting can fail with. `Display` is what the widget sees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("missing field")]
    MissingField,

    #[error("not authorised")]
    NotAuthorised,

    #[error("domain is frozen")]
    DomainFrozen,

    #[error("thread is locked")]
    ThreadLocked,

    #[error("not enough tokens to post this comment")]
    InsufficientFunds,

    #[error("you have already voted on this comment")]
    AlreadyVoted,

    #[error("you cannot vote on your own comment")]
    SelfVote,

    #[error("no likes left")]
    NoLikesLeft,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("internal error")]
    Internal,
}
