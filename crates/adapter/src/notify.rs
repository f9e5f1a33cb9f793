use anyhow::Result;
use domain::{
    CommentEvent, CommentState, Commenter, DomainConfig, NotificationPolicy, ANONYMOUS,
    ROOT_PARENT,
};
use std::sync::Arc;
use storage::Db;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::traits::{NotificationKind, NotificationSink, OutboundNotification};

/// Fields of an admitted comment the planner needs.
pub struct AdmittedComment<'a> {
    pub path: &'a str,
    pub comment_hex: &'a str,
    pub html: &'a str,
    pub state: CommentState,
}

/// Decides who hears about a new comment.
///
/// Moderators follow the domain policy and never get mail about their own
/// comments. The parent author hears about approved replies unless they are
/// anonymous or replying to themselves.
pub fn plan_notifications(
    comment: &AdmittedComment<'_>,
    domain: &DomainConfig,
    author: Option<&Commenter>,
    parent_author: Option<&Commenter>,
) -> Vec<OutboundNotification> {
    let author_name = author.map(|a| a.name.as_str()).unwrap_or("Anonymous");
    let make = |kind, to: &str| OutboundNotification {
        kind,
        to: to.to_string(),
        domain: domain.domain.clone(),
        path: comment.path.to_string(),
        comment_hex: comment.comment_hex.to_string(),
        author_name: author_name.to_string(),
        html: comment.html.to_string(),
        state: comment.state,
    };

    let notify_moderators = match domain.notification_policy {
        NotificationPolicy::None => return Vec::new(),
        NotificationPolicy::All => true,
        NotificationPolicy::PendingModeration => comment.state != CommentState::Approved,
    };

    let mut out = Vec::new();
    if notify_moderators {
        out.extend(
            domain
                .moderators
                .iter()
                .filter(|m| author.map_or(true, |a| &a.email != *m))
                .map(|m| make(NotificationKind::Moderator, m.as_str())),
        );
    }

    if comment.state == CommentState::Approved {
        if let Some(parent) = parent_author {
            let is_self_reply = author.map_or(false, |a| a.commenter_hex == parent.commenter_hex);
            let already_told = out.iter().any(|n| n.to == parent.email);
            if !is_self_reply && !already_told {
                out.push(make(NotificationKind::Reply, parent.email.as_str()));
            }
        }
    }

    out
}

/// Consumes admission events until the channel closes or the token is cancelled.
pub async fn start_notifier(
    db: Db,
    mut rx: mpsc::Receiver<CommentEvent>,
    sink: Arc<dyn NotificationSink>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Notification dispatcher started");
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Notification dispatcher stopping");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                if let Err(e) = dispatch(&db, sink.as_ref(), event).await {
                    warn!("Notification dispatch failed: {:?}", e);
                }
            }
        }
    }
    Ok(())
}

async fn dispatch(db: &Db, sink: &dyn NotificationSink, event: CommentEvent) -> Result<()> {
    let CommentEvent::Admitted {
        domain,
        path,
        commenter_hex,
        comment_hex,
        parent_hex,
        html,
        state,
    } = event;

    let Some(domain_cfg) = db.get_domain(&domain).await? else {
        warn!("Dropping notification for unknown domain {}", domain);
        return Ok(());
    };

    let author = lookup_commenter(db, &commenter_hex).await?;
    let parent_author = if parent_hex == ROOT_PARENT {
        None
    } else {
        match db.get_comment_author(&parent_hex).await? {
            Some(hex) => lookup_commenter(db, &hex).await?,
            None => None,
        }
    };

    let comment = AdmittedComment {
        path: &path,
        comment_hex: &comment_hex,
        html: &html,
        state,
    };
    for n in plan_notifications(&comment, &domain_cfg, author.as_ref(), parent_author.as_ref()) {
        if let Err(e) = sink.deliver(&n).await {
            warn!("Failed to notify {} about {}: {:?}", n.to, n.comment_hex, e);
        }
    }
    Ok(())
}

async fn lookup_commenter(db: &Db, commenter_hex: &str) -> Result<Option<Commenter>> {
    if commenter_hex == ANONYMOUS {
        return Ok(None);
    }
    db.get_commenter(commenter_hex).await
}
