use crate::{models::SqlComment, Db};
use chrono::NaiveDateTime;
use domain::{Comment, CommentState};
use tracing::debug;

/// Row to insert; `debit` is `Some((commenter_hex, price))` for paid comments.
#[derive(Debug, Clone)]
pub struct NewComment {
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
    pub debit: Option<(String, i64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    Inserted,
    /// Balance was below the price at write time; nothing was written.
    InsufficientFunds,
}

impl Db {
    /// Inserts the comment and debits the author in one transaction.
    pub async fn insert_comment(&self, c: &NewComment) -> anyhow::Result<AdmitOutcome> {
        let mut tx = self.pool.begin().await?;

        // first statement is a write so SQLite takes the write lock up front
        sqlx::query(
            r#"
            INSERT INTO pages (domain, path)
            VALUES (?, ?)
            ON CONFLICT(domain, path) DO NOTHING
            "#,
        )
        .bind(&c.domain)
        .bind(&c.path)
        .execute(&mut *tx)
        .await?;

        if let Some((commenter_hex, price)) = &c.debit {
            let res = sqlx::query(
                r#"
                UPDATE commenters
                SET cnt_tokens = cnt_tokens - ?
                WHERE commenter_hex = ? AND cnt_tokens >= ?
                "#,
            )
            .bind(price)
            .bind(commenter_hex)
            .bind(price)
            .execute(&mut *tx)
            .await?;

            if res.rows_affected() == 0 {
                tx.rollback().await?;
                debug!("Debit of {} refused for {}", price, commenter_hex);
                return Ok(AdmitOutcome::InsufficientFunds);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO comments (
                comment_hex, domain, path, post_id, commenter_hex,
                parent_hex, markdown, html, creation_date, state
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&c.comment_hex)
        .bind(&c.domain)
        .bind(&c.path)
        .bind(&c.post_id)
        .bind(&c.commenter_hex)
        .bind(&c.parent_hex)
        .bind(&c.markdown)
        .bind(&c.html)
        .bind(c.creation_date)
        .bind(c.state.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE pages
            SET comment_count = comment_count + 1
            WHERE domain = ? AND path = ?
            "#,
        )
        .bind(&c.domain)
        .bind(&c.path)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AdmitOutcome::Inserted)
    }

    pub async fn get_comment(&self, comment_hex: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                comment_hex, domain, path, post_id, commenter_hex,
                parent_hex, markdown, html, creation_date, state
            FROM comments
            WHERE comment_hex = ?
            "#,
        )
        .bind(comment_hex)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Comment::try_from).transpose()
    }

    pub async fn get_comment_author(&self, comment_hex: &str) -> anyhow::Result<Option<String>> {
        let author = sqlx::query_scalar::<_, String>(
            "SELECT commenter_hex FROM comments WHERE comment_hex = ?",
        )
        .bind(comment_hex)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    pub async fn count_comments(&self, domain: &str, path: &str) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE domain = ? AND path = ?",
        )
        .bind(domain)
        .bind(path)
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

    fn new_comment(hex: &str, author: &str, debit: Option<(String, i64)>) -> NewComment {
        NewComment {
            comment_hex: hex.to_string(),
            domain: "example.com".into(),
            path: "/post".into(),
            post_id: "post-1".into(),
            commenter_hex: author.to_string(),
            parent_hex: "root".into(),
            markdown: "hi".into(),
            html: "<p>hi</p>\n".into(),
            creation_date: Utc::now().naive_utc(),
            state: CommentState::Approved,
            debit,
        }
    }

    #[tokio::test]
    async fn test_insert_debits_exactly_once() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("alice", 20, 0)).await.unwrap();

        let outcome = t
            .db
            .insert_comment(&new_comment("c1", "alice", Some(("alice".into(), 15))))
            .await
            .unwrap();
        assert_eq!(outcome, AdmitOutcome::Inserted);

        let alice = t.db.get_commenter("alice").await.unwrap().unwrap();
        assert_eq!(alice.cnt_tokens, 5);

        let stored = t.db.get_comment("c1").await.unwrap().unwrap();
        assert_eq!(stored.commenter_hex, "alice");
        assert_eq!(stored.state, CommentState::Approved);
        assert_eq!(t.db.get_page("example.com", "/post").await.unwrap().comment_count, 1);
    }

    #[tokio::test]
    async fn test_insufficient_balance_writes_nothing() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("bob", 10, 0)).await.unwrap();

        let outcome = t
            .db
            .insert_comment(&new_comment("c1", "bob", Some(("bob".into(), 15))))
            .await
            .unwrap();
        assert_eq!(outcome, AdmitOutcome::InsufficientFunds);

        assert!(t.db.get_comment("c1").await.unwrap().is_none());
        assert_eq!(t.db.count_comments("example.com", "/post").await.unwrap(), 0);
        let bob = t.db.get_commenter("bob").await.unwrap().unwrap();
        assert_eq!(bob.cnt_tokens, 10);
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_overdraw() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("carol", 10, 0)).await.unwrap();

        let attempts = (0..4).map(|i| {
            let db = t.db.clone();
            let c = new_comment(&format!("c{}", i), "carol", Some(("carol".into(), 4)));
            async move { db.insert_comment(&c).await.unwrap() }
        });
        let outcomes = futures::future::join_all(attempts).await;

        let inserted = outcomes
            .iter()
            .filter(|o| **o == AdmitOutcome::Inserted)
            .count();
        assert_eq!(inserted, 2);
        let carol = t.db.get_commenter("carol").await.unwrap().unwrap();
        assert_eq!(carol.cnt_tokens, 2);
        assert_eq!(t.db.count_comments("example.com", "/post").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_insert_has_no_debit() {
        let t = test_db().await;
        let outcome = t
            .db
            .insert_comment(&new_comment("c1", "anonymous", None))
            .await
            .unwrap();
        assert_eq!(outcome, AdmitOutcome::Inserted);
        assert_eq!(
            t.db.get_comment_author("c1").await.unwrap().as_deref(),
            Some("anonymous")
        );
        assert!(t.db.get_comment_author("missing").await.unwrap().is_none());
    }
}
