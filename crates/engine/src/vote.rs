use chrono::Utc;
use domain::{CastVote, Direction, EngineError, ANONYMOUS};
use storage::{Db, VoteOutcome};
use tracing::info;

use crate::internal;

/// One vote per (comment, voter), never on one's own comment, one like spent per vote.
#[derive(Clone)]
pub struct VoteLedger {
    db: Db,
}

impl VoteLedger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Resolves the voter's token and allowance, then records the vote.
    pub async fn cast(&self, req: CastVote) -> Result<(), EngineError> {
        if req.commenter_token.is_empty() || req.comment_hex.is_empty() {
            return Err(EngineError::MissingField);
        }
        if req.commenter_token == ANONYMOUS {
            return Err(EngineError::NotAuthorised);
        }

        let voter = self
            .db
            .get_commenter_by_token(&req.commenter_token)
            .await
            .map_err(internal("cannot load commenter"))?
            .ok_or(EngineError::NotFound("commenter"))?;

        if voter.available_likes <= 0 {
            return Err(EngineError::NoLikesLeft);
        }

        self.vote(
            &voter.commenter_hex,
            &req.comment_hex,
            voter.available_likes,
            req.direction,
        )
        .await
    }

    /// `available_likes` is the caller's snapshot and must already be positive.
    /// The store applies the decrement itself.
    pub async fn vote(
        &self,
        voter_hex: &str,
        comment_hex: &str,
        available_likes: i64,
        direction: i64,
    ) -> Result<(), EngineError> {
        if voter_hex.is_empty() || comment_hex.is_empty() {
            return Err(EngineError::MissingField);
        }

        if self
            .db
            .get_vote(comment_hex, voter_hex)
            .await
            .map_err(internal("cannot look up vote"))?
            .is_some()
        {
            return Err(EngineError::AlreadyVoted);
        }

        let author = self
            .db
            .get_comment_author(comment_hex)
            .await
            .map_err(internal("cannot select author for vote"))?
            .ok_or(EngineError::NotFound("comment"))?;
        if author == voter_hex {
            return Err(EngineError::SelfVote);
        }

        let direction = Direction::from(direction);
        match self
            .db
            .insert_vote(comment_hex, voter_hex, direction, Utc::now().naive_utc())
            .await
            .map_err(internal("cannot insert vote"))?
        {
            VoteOutcome::Recorded => {
                info!(
                    "Vote {} on {} by {} ({} likes before)",
                    direction.value(),
                    comment_hex,
                    voter_hex,
                    available_likes
                );
                Ok(())
            }
            // lost the race against a concurrent first vote for the same pair
            VoteOutcome::Duplicate => Err(EngineError::AlreadyVoted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{domain_config, env_with_price, TestEnv};
    use domain::{ClientInfo, SubmitComment, ROOT_PARENT};

    async fn comment_by(env: &TestEnv, token: &str) -> String {
        env.engine
            .submit(
                SubmitComment {
                    commenter_token: token.to_string(),
                    domain: "example.com".into(),
                    path: "/post".into(),
                    post_id: "post-1".into(),
                    parent_hex: ROOT_PARENT.into(),
                    markdown: "vote on me".into(),
                },
                ClientInfo::default(),
            )
            .await
            .unwrap()
            .comment_hex
    }

    async fn setup() -> (TestEnv, String) {
        let env = env_with_price(Some(0)).await;
        env.add_domain(&domain_config()).await;
        env.add_commenter("author", 0, 5).await;
        env.add_commenter("voter", 0, 5).await;
        let hex = comment_by(&env, "tok-author").await;
        (env, hex)
    }

    fn cast(token: &str, comment_hex: &str, direction: i64) -> CastVote {
        CastVote {
            commenter_token: token.to_string(),
            comment_hex: comment_hex.to_string(),
            direction,
        }
    }

    #[tokio::test]
    async fn test_second_vote_is_rejected() {
        let (env, hex) = setup().await;

        env.ledger.cast(cast("tok-voter", &hex, 1)).await.unwrap();
        let err = env.ledger.cast(cast("tok-voter", &hex, -1)).await.unwrap_err();
        assert_eq!(err, EngineError::AlreadyVoted);
        let err = env.ledger.cast(cast("tok-voter", &hex, 1)).await.unwrap_err();
        assert_eq!(err, EngineError::AlreadyVoted);

        assert_eq!(env.db.get_vote(&hex, "voter").await.unwrap(), Some(1));
        assert_eq!(env.balance("voter").await.1, 4);
    }

    #[tokio::test]
    async fn test_self_vote_is_rejected() {
        let (env, hex) = setup().await;

        let err = env.ledger.cast(cast("tok-author", &hex, 1)).await.unwrap_err();
        assert_eq!(err, EngineError::SelfVote);
        assert_eq!(env.balance("author").await.1, 5);
        assert_eq!(env.db.count_votes(&hex).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_direction_is_normalised() {
        let (env, _) = setup().await;

        for (raw, stored) in [(5, 1), (1, 1), (0, 0), (-1, -1), (-5, -1)] {
            let hex = comment_by(&env, "tok-author").await;
            env.ledger.vote("voter", &hex, 5, raw).await.unwrap();
            assert_eq!(env.db.get_vote(&hex, "voter").await.unwrap(), Some(stored));
        }
        // one like per vote, whatever the direction
        assert_eq!(env.balance("voter").await.1, 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_votes_decrement_once() {
        let (env, hex) = setup().await;

        let attempts = (0..6).map(|i| {
            let ledger = env.ledger.clone();
            let hex = hex.clone();
            async move { ledger.vote("voter", &hex, 5, if i % 2 == 0 { 1 } else { -1 }).await }
        });
        let results = futures::future::join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == EngineError::AlreadyVoted));
        assert_eq!(env.db.count_votes(&hex).await.unwrap(), 1);
        assert_eq!(env.balance("voter").await.1, 4);
    }

    #[tokio::test]
    async fn test_caller_side_rejections() {
        let (env, hex) = setup().await;
        env.add_commenter("broke", 0, 0).await;

        assert_eq!(
            env.ledger.cast(cast(ANONYMOUS, &hex, 1)).await.unwrap_err(),
            EngineError::NotAuthorised
        );
        assert_eq!(
            env.ledger.cast(cast("tok-broke", &hex, 1)).await.unwrap_err(),
            EngineError::NoLikesLeft
        );
        assert_eq!(
            env.ledger.cast(cast("tok-nobody", &hex, 1)).await.unwrap_err(),
            EngineError::NotFound("commenter")
        );
        assert_eq!(
            env.ledger.cast(cast("tok-voter", "", 1)).await.unwrap_err(),
            EngineError::MissingField
        );
        assert_eq!(
            env.ledger.cast(cast("tok-voter", "deadbeef", 1)).await.unwrap_err(),
            EngineError::NotFound("comment")
        );
        assert_eq!(env.balance("voter").await.1, 5);
    }

    #[tokio::test]
    async fn test_anonymous_comment_can_be_voted() {
        let (env, _) = setup().await;
        let hex = comment_by(&env, ANONYMOUS).await;

        env.ledger.cast(cast("tok-voter", &hex, -3)).await.unwrap();
        assert_eq!(env.db.get_vote(&hex, "voter").await.unwrap(), Some(-1));
    }
}
