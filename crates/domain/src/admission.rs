//! Initial state of a new comment, as an ordered rule list.
//!
//! Rules are evaluated top to bottom and the first one that answers wins.
//! The spam verdict is only computed when a rule actually needs it, so a
//! moderator's comment never reaches the classifier.

use crate::models::{CommentState, DomainConfig, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionFacts {
    pub anonymous: bool,
    pub moderator: bool,
    pub require_moderation: bool,
    pub moderate_all_anonymous: bool,
    /// `None` until the classifier has been asked.
    pub spam: Option<bool>,
}

impl AdmissionFacts {
    pub fn new(identity: &Identity, domain: &DomainConfig) -> Self {
        let moderator = match identity {
            Identity::Anonymous => false,
            Identity::Commenter(c) => domain.is_moderator(&c.email),
        };
        Self {
            anonymous: identity.is_anonymous(),
            moderator,
            require_moderation: domain.require_moderation,
            moderate_all_anonymous: domain.moderate_all_anonymous,
            spam: None,
        }
    }

    pub fn with_spam(mut self, spam: bool) -> Self {
        self.spam = Some(spam);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    State(CommentState),
    NeedsSpamCheck,
}

pub struct Rule {
    pub name: &'static str,
    pub check: fn(&AdmissionFacts) -> Option<Verdict>,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "moderator",
        check: |f| (!f.anonymous && f.moderator).then_some(Verdict::State(CommentState::Approved)),
    },
    Rule {
        name: "spam",
        check: |f| match f.spam {
            None => Some(Verdict::NeedsSpamCheck),
            Some(true) => Some(Verdict::State(CommentState::Flagged)),
            Some(false) => None,
        },
    },
    Rule {
        name: "anonymous-moderation",
        check: |f| {
            (f.anonymous && (f.moderate_all_anonymous || f.require_moderation))
                .then_some(Verdict::State(CommentState::Unapproved))
        },
    },
    Rule {
        name: "moderation",
        check: |f| {
            (!f.anonymous && f.require_moderation)
                .then_some(Verdict::State(CommentState::Unapproved))
        },
    },
    Rule {
        name: "default",
        check: |_| Some(Verdict::State(CommentState::Approved)),
    },
];

/// Returns the verdict and the name of the rule that produced it.
pub fn decide(facts: &AdmissionFacts) -> (Verdict, &'static str) {
    RULES
        .iter()
        .find_map(|rule| (rule.check)(facts).map(|v| (v, rule.name)))
        .unwrap_or((Verdict::State(CommentState::Approved), "default"))
}
