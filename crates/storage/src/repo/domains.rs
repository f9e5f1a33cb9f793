use crate::{models::SqlDomain, Db};
use chrono::Utc;
use domain::{DomainConfig, DomainState};

impl Db {
    pub async fn get_domain(&self, domain: &str) -> anyhow::Result<Option<DomainConfig>> {
        let row = sqlx::query_as::<_, SqlDomain>(
            r#"
            SELECT
                domain, name, state, require_identification, require_moderation,
                moderate_all_anonymous, email_notification_policy
            FROM domains
            WHERE domain = ?
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let moderators = sqlx::query_scalar::<_, String>(
            "SELECT email FROM moderators WHERE domain = ? ORDER BY email",
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;

        row.into_config(moderators).map(Some)
    }

    /// Writes the domain row and replaces its moderator list.
    pub async fn upsert_domain(&self, d: &DomainConfig) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO domains (
                domain, name, state, require_identification, require_moderation,
                moderate_all_anonymous, email_notification_policy, creation_date
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(domain) DO UPDATE SET
                name = excluded.name,
                state = excluded.state,
                require_identification = excluded.require_identification,
                require_moderation = excluded.require_moderation,
                moderate_all_anonymous = excluded.moderate_all_anonymous,
                email_notification_policy = excluded.email_notification_policy
            "#,
        )
        .bind(&d.domain)
        .bind(&d.name)
        .bind(d.state.as_str())
        .bind(d.require_identification)
        .bind(d.require_moderation)
        .bind(d.moderate_all_anonymous)
        .bind(d.notification_policy.as_str())
        .bind(Utc::now().naive_utc())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM moderators WHERE domain = ?")
            .bind(&d.domain)
            .execute(&mut *tx)
            .await?;

        for email in &d.moderators {
            sqlx::query("INSERT INTO moderators (domain, email, add_date) VALUES (?, ?, ?)")
                .bind(&d.domain)
                .bind(email)
                .bind(Utc::now().naive_utc())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn set_domain_state(&self, domain: &str, state: DomainState) -> anyhow::Result<()> {
        sqlx::query("UPDATE domains SET state = ? WHERE domain = ?")
            .bind(state.as_str())
            .bind(domain)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
