use adapter::{render_markdown, PricingService, SpamCheck, SpamClassifier};
use chrono::Utc;
use domain::admission::{decide, AdmissionFacts, Verdict};
use domain::{
    strip_domain, ClientInfo, CommentEvent, CommentState, DomainConfig, EngineError, Identity,
    SubmitComment, Submission, ANONYMOUS,
};
use std::sync::Arc;
use storage::{AdmitOutcome, Db, NewComment};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::internal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted {
    pub comment_hex: String,
    pub state: CommentState,
    pub html: String,
}

#[derive(Clone)]
pub struct AdmissionEngine {
    db: Db,
    spam: Arc<dyn SpamClassifier>,
    pricing: Arc<dyn PricingService>,
    events: mpsc::Sender<CommentEvent>,
}

impl AdmissionEngine {
    pub fn new(
        db: Db,
        spam: Arc<dyn SpamClassifier>,
        pricing: Arc<dyn PricingService>,
        events: mpsc::Sender<CommentEvent>,
    ) -> Self {
        Self {
            db,
            spam,
            pricing,
            events,
        }
    }

    /// Resolves the domain and the commenter token, then admits.
    pub async fn submit(
        &self,
        req: SubmitComment,
        client: ClientInfo,
    ) -> Result<Admitted, EngineError> {
        if req.commenter_token.is_empty() || req.domain.is_empty() {
            return Err(EngineError::MissingField);
        }

        let domain = strip_domain(&req.domain);
        let config = self
            .db
            .get_domain(&domain)
            .await
            .map_err(internal("cannot load domain"))?
            .ok_or(EngineError::NotFound("domain"))?;

        // checked again in admit; failing here skips the identity lookup
        if config.is_frozen() {
            return Err(EngineError::DomainFrozen);
        }
        if config.require_identification && req.commenter_token == ANONYMOUS {
            return Err(EngineError::NotAuthorised);
        }

        let identity = if req.commenter_token == ANONYMOUS {
            Identity::Anonymous
        } else {
            let commenter = self
                .db
                .get_commenter_by_token(&req.commenter_token)
                .await
                .map_err(internal("cannot load commenter"))?
                .ok_or(EngineError::NotFound("commenter"))?;
            Identity::Commenter(commenter)
        };

        let submission = Submission {
            domain,
            path: req.path,
            post_id: req.post_id,
            parent_hex: req.parent_hex,
            markdown: req.markdown,
            creation_date: None,
            client,
        };
        self.admit(&identity, &config, submission).await
    }

    pub async fn admit(
        &self,
        identity: &Identity,
        config: &DomainConfig,
        submission: Submission,
    ) -> Result<Admitted, EngineError> {
        if !submission.has_required_fields() {
            return Err(EngineError::MissingField);
        }
        if config.is_frozen() {
            return Err(EngineError::DomainFrozen);
        }
        if config.require_identification && identity.is_anonymous() {
            return Err(EngineError::NotAuthorised);
        }

        let page = self
            .db
            .get_page(&submission.domain, &submission.path)
            .await
            .map_err(internal("cannot get page attributes"))?;
        if page.is_locked {
            return Err(EngineError::ThreadLocked);
        }

        let debit = match identity {
            Identity::Anonymous => None,
            Identity::Commenter(c) => {
                let price = self
                    .pricing
                    .price_of(&submission.post_id)
                    .await
                    .map_err(internal("cannot get comment price"))?;
                let price = i64::try_from(price)
                    .map_err(|e| internal("comment price out of range")(e.into()))?;
                if c.cnt_tokens < price {
                    return Err(EngineError::InsufficientFunds);
                }
                Some((c.commenter_hex.clone(), price))
            }
        };

        let state = self.decide_state(identity, config, &submission).await?;

        let html = render_markdown(&submission.markdown);
        let comment_hex = hex::encode(rand::random::<[u8; 32]>());
        let commenter_hex = identity.commenter_hex().to_string();

        let row = NewComment {
            comment_hex: comment_hex.clone(),
            domain: submission.domain.clone(),
            path: submission.path.clone(),
            post_id: submission.post_id.clone(),
            commenter_hex: commenter_hex.clone(),
            parent_hex: submission.parent_hex.clone(),
            markdown: submission.markdown,
            html: html.clone(),
            creation_date: submission
                .creation_date
                .unwrap_or_else(|| Utc::now().naive_utc()),
            state,
            debit,
        };

        match self
            .db
            .insert_comment(&row)
            .await
            .map_err(internal("cannot insert comment"))?
        {
            AdmitOutcome::Inserted => {}
            // balance moved between the check above and the write
            AdmitOutcome::InsufficientFunds => return Err(EngineError::InsufficientFunds),
        }

        info!(
            "Comment {} admitted on {}{} as {} by {}",
            comment_hex, submission.domain, submission.path, state, commenter_hex
        );

        self.announce(CommentEvent::Admitted {
            domain: submission.domain,
            path: submission.path,
            commenter_hex,
            comment_hex: comment_hex.clone(),
            parent_hex: submission.parent_hex,
            html: html.clone(),
            state,
        });

        Ok(Admitted {
            comment_hex,
            state,
            html,
        })
    }

    async fn decide_state(
        &self,
        identity: &Identity,
        config: &DomainConfig,
        submission: &Submission,
    ) -> Result<CommentState, EngineError> {
        let mut facts = AdmissionFacts::new(identity, config);
        loop {
            match decide(&facts) {
                (Verdict::State(state), rule) => {
                    debug!("Admission rule '{}' chose {}", rule, state);
                    return Ok(state);
                }
                (Verdict::NeedsSpamCheck, _) => {
                    let spam = self.classify(identity, submission).await?;
                    facts = facts.with_spam(spam);
                }
            }
        }
    }

    async fn classify(
        &self,
        identity: &Identity,
        submission: &Submission,
    ) -> Result<bool, EngineError> {
        let (name, email, link) = match identity {
            Identity::Anonymous => ("", "", ""),
            Identity::Commenter(c) => (c.name.as_str(), c.email.as_str(), c.link.as_str()),
        };
        let check = SpamCheck {
            domain: &submission.domain,
            ip: &submission.client.ip,
            user_agent: &submission.client.user_agent,
            name,
            email,
            link,
            text: &submission.markdown,
        };
        self.spam
            .is_spam(&check)
            .await
            .map_err(internal("spam classifier failed"))
    }

    fn announce(&self, event: CommentEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Notification queue full, dropping event"),
            Err(TrySendError::Closed(_)) => warn!("Notification queue closed, dropping event"),
        }
    }
}
