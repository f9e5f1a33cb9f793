use crate::Db;
use domain::Page;
use sqlx::Row;

impl Db {
    /// Pages are created lazily by the first comment, so a missing row reads as an open page.
    pub async fn get_page(&self, domain: &str, path: &str) -> anyhow::Result<Page> {
        let row = sqlx::query(
            "SELECT is_locked, comment_count FROM pages WHERE domain = ? AND path = ?",
        )
        .bind(domain)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(r) => Page {
                domain: domain.to_string(),
                path: path.to_string(),
                is_locked: r.try_get("is_locked")?,
                comment_count: r.try_get("comment_count")?,
            },
            None => Page {
                domain: domain.to_string(),
                path: path.to_string(),
                ..Default::default()
            },
        })
    }

    pub async fn set_page_lock(&self, domain: &str, path: &str, locked: bool) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pages (domain, path, is_locked)
            VALUES (?, ?, ?)
            ON CONFLICT(domain, path) DO UPDATE SET is_locked = excluded.is_locked
            "#,
        )
        .bind(domain)
        .bind(path)
        .bind(locked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
