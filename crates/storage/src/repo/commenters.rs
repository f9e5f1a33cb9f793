use crate::{models::SqlCommenter, Db};
use chrono::Utc;
use domain::Commenter;

impl Db {
    pub async fn get_commenter_by_token(&self, token: &str) -> anyhow::Result<Option<Commenter>> {
        let row = sqlx::query_as::<_, SqlCommenter>(
            r#"
            SELECT
                c.commenter_hex, c.email, c.name, c.link,
                c.cnt_tokens, c.available_likes
            FROM commenters c
            JOIN commenter_sessions s ON s.commenter_hex = c.commenter_hex
            WHERE s.commenter_token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn get_commenter(&self, commenter_hex: &str) -> anyhow::Result<Option<Commenter>> {
        let row = sqlx::query_as::<_, SqlCommenter>(
            r#"
            SELECT commenter_hex, email, name, link, cnt_tokens, available_likes
            FROM commenters
            WHERE commenter_hex = ?
            "#,
        )
        .bind(commenter_hex)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn create_commenter(&self, c: &Commenter) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO commenters (
                commenter_hex, email, name, link, join_date, cnt_tokens, available_likes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&c.commenter_hex)
        .bind(&c.email)
        .bind(&c.name)
        .bind(&c.link)
        .bind(Utc::now().naive_utc())
        .bind(c.cnt_tokens)
        .bind(c.available_likes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create_session(&self, token: &str, commenter_hex: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO commenter_sessions (commenter_token, commenter_hex, creation_date)
            VALUES (?, ?, ?)
            ON CONFLICT(commenter_token) DO UPDATE SET commenter_hex = excluded.commenter_hex
            "#,
        )
        .bind(token)
        .bind(commenter_hex)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replenishes the likes allowance (periodic grant, admin tooling).
    pub async fn grant_likes(&self, commenter_hex: &str, likes: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "UPDATE commenters SET available_likes = available_likes + ? WHERE commenter_hex = ?",
        )
        .bind(likes)
        .bind(commenter_hex)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{commenter, test_db};

    #[tokio::test]
    async fn test_lookup_by_token() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("alice", 3, 7)).await.unwrap();
        t.db.create_session("tok-a", "alice").await.unwrap();

        let c = t.db.get_commenter_by_token("tok-a").await.unwrap().unwrap();
        assert_eq!(c.commenter_hex, "alice");
        assert_eq!(c.email, "alice@example.com");
        assert_eq!(c.cnt_tokens, 3);
        assert_eq!(c.available_likes, 7);

        assert!(t.db.get_commenter_by_token("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_grant_likes() {
        let t = test_db().await;
        t.db.create_commenter(&commenter("alice", 0, 1)).await.unwrap();
        assert!(t.db.grant_likes("alice", 4).await.unwrap());
        assert!(!t.db.grant_likes("ghost", 4).await.unwrap());
        let c = t.db.get_commenter("alice").await.unwrap().unwrap();
        assert_eq!(c.available_likes, 5);
    }
}
