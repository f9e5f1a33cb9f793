use crate::Db;
use chrono::NaiveDateTime;
use domain::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded,
    /// A row for the pair already existed; the allowance was left alone.
    Duplicate,
}

impl Db {
    pub async fn get_vote(
        &self,
        comment_hex: &str,
        commenter_hex: &str,
    ) -> anyhow::Result<Option<i64>> {
        let direction = sqlx::query_scalar::<_, i64>(
            "SELECT direction FROM votes WHERE comment_hex = ? AND commenter_hex = ?",
        )
        .bind(comment_hex)
        .bind(commenter_hex)
        .fetch_optional(&self.pool)
        .await?;
        Ok(direction)
    }

    /// Insert-if-absent on (comment, voter) plus a single clamped decrement of the
    /// voter's likes allowance, committed together.
    pub async fn insert_vote(
        &self,
        comment_hex: &str,
        commenter_hex: &str,
        direction: Direction,
        vote_date: NaiveDateTime,
    ) -> anyhow::Result<VoteOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO votes (comment_hex, commenter_hex, direction, vote_date)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(comment_hex, commenter_hex) DO NOTHING
            "#,
        )
        .bind(comment_hex)
        .bind(commenter_hex)
        .bind(direction.value())
        .bind(vote_date)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(VoteOutcome::Duplicate);
        }

        sqlx::query(
            r#"
            UPDATE commenters
            SET available_likes = MAX(available_likes - 1, 0)
            WHERE commenter_hex = ?
            "#,
        )
        .bind(commenter_hex)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(VoteOutcome::Recorded)
    }

    pub async fn count_votes(&self, comment_hex: &str) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes WHERE comment_hex = ?")
            .bind(comment_hex)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{commenter, test_db};
    use chrono::Utc;

    #[tokio::test]
    async fn test_duplicate_vote_keeps_first_direction() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("voter", 0, 3)).await.unwrap();
        let now = Utc::now().naive_utc();

        let first = t.db.insert_vote("c1", "voter", Direction::Up, now).await.unwrap();
        let second = t.db.insert_vote("c1", "voter", Direction::Down, now).await.unwrap();
        assert_eq!(first, VoteOutcome::Recorded);
        assert_eq!(second, VoteOutcome::Duplicate);

        assert_eq!(t.db.get_vote("c1", "voter").await.unwrap(), Some(1));
        assert_eq!(t.db.count_votes("c1").await.unwrap(), 1);
        let voter = t.db.get_commenter("voter").await.unwrap().unwrap();
        assert_eq!(voter.available_likes, 2);
    }

    #[tokio::test]
    async fn test_decrement_clamps_at_zero() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("voter", 0, 0)).await.unwrap();
        let now = Utc::now().naive_utc();

        t.db.insert_vote("c1", "voter", Direction::Neutral, now).await.unwrap();
        let voter = t.db.get_commenter("voter").await.unwrap().unwrap();
        assert_eq!(voter.available_likes, 0);
        assert_eq!(t.db.get_vote("c1", "voter").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_concurrent_first_votes_collapse() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("voter", 0, 10)).await.unwrap();

        let attempts = (0..8).map(|i| {
            let db = t.db.clone();
            let dir = if i % 2 == 0 { Direction::Up } else { Direction::Down };
            async move {
                db.insert_vote("c1", "voter", dir, Utc::now().naive_utc())
                    .await
                    .unwrap()
            }
        });
        let outcomes = futures::future::join_all(attempts).await;

        let recorded = outcomes
            .iter()
            .filter(|o| **o == VoteOutcome::Recorded)
            .count();
        assert_eq!(recorded, 1);
        assert_eq!(t.db.count_votes("c1").await.unwrap(), 1);
        let voter = t.db.get_commenter("voter").await.unwrap().unwrap();
        assert_eq!(voter.available_likes, 9);
    }
}
