use anyhow::anyhow;
use chrono::NaiveDateTime;
use domain::{Comment, Commenter, DomainConfig};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub comment_hex: String,
    pub domain: String,
    pub path: String,
    pub post_id: String,
    pub commenter_hex: String,
    pub parent_hex: String,
    pub markdown: String,
    pub html: String,
    pub creation_date: NaiveDateTime,
    pub state: String,
}

impl TryFrom<SqlComment> for Comment {
    type Error = anyhow::Error;

    fn try_from(sql: SqlComment) -> Result<Self, Self::Error> {
        Ok(Comment {
            state: sql.state.parse().map_err(|e: String| anyhow!(e))?,
            comment_hex: sql.comment_hex,
            domain: sql.domain,
            path: sql.path,
            post_id: sql.post_id,
            commenter_hex: sql.commenter_hex,
            parent_hex: sql.parent_hex,
            markdown: sql.markdown,
            html: sql.html,
            creation_date: sql.creation_date,
        })
    }
}

#[derive(FromRow)]
pub struct SqlCommenter {
    pub commenter_hex: String,
    pub email: String,
    pub name: String,
    pub link: String,
    pub cnt_tokens: i64,
    pub available_likes: i64,
}

impl From<SqlCommenter> for Commenter {
    fn from(sql: SqlCommenter) -> Self {
        Commenter {
            commenter_hex: sql.commenter_hex,
            email: sql.email,
            name: sql.name,
            link: sql.link,
            cnt_tokens: sql.cnt_tokens,
            available_likes: sql.available_likes,
        }
    }
}

#[derive(FromRow)]
pub struct SqlDomain {
    pub domain: String,
    pub name: String,
    pub state: String,
    pub require_identification: bool,
    pub require_moderation: bool,
    pub moderate_all_anonymous: bool,
    pub email_notification_policy: String,
}

impl SqlDomain {
    pub fn into_config(self, moderators: Vec<String>) -> anyhow::Result<DomainConfig> {
        Ok(DomainConfig {
            state: self.state.parse().map_err(|e: String| anyhow!(e))?,
            notification_policy: self
                .email_notification_policy
                .parse()
                .map_err(|e: String| anyhow!(e))?,
            domain: self.domain,
            name: self.name,
            require_identification: self.require_identification,
            require_moderation: self.require_moderation,
            moderate_all_anonymous: self.moderate_all_anonymous,
            moderators,
        })
    }
}
