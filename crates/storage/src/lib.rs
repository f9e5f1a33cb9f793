use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};
use std::{fs, path::Path, str::FromStr, time::Duration};
use tracing::info;

mod models;
mod repo;

pub use repo::comments::{AdmitOutcome, NewComment};
pub use repo::votes::VoteOutcome;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection and on SQLite lock contention.
    pub timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 8,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        Self::with_options(db_url, StoreOptions::default()).await
    }

    pub async fn with_options(db_url: &str, opts: StoreOptions) -> anyhow::Result<Self> {
        if db_url.starts_with("sqlite://") && !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://");
            let path = Path::new(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        // busy_timeout makes concurrent writers queue instead of failing with SQLITE_BUSY
        let connect_opts = SqliteConnectOptions::from_str(db_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(opts.timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.timeout)
            .connect_with(connect_opts)
            .await?;

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database ready at {}", db_url);
        Ok(Self { pool })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Db;
    use domain::{Commenter, DomainConfig, DomainState, NotificationPolicy};
    use tempfile::TempDir;

    /// Keeps the temp dir alive as long as the handle.
    pub struct TestDb {
        pub db: Db,
        _dir: TempDir,
    }

    pub async fn test_db() -> TestDb {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let db = Db::new(&url).await.unwrap();
        TestDb { db, _dir: dir }
    }

    pub fn domain_config(name: &str) -> DomainConfig {
        DomainConfig {
            domain: name.to_string(),
            name: name.to_string(),
            state: DomainState::Unfrozen,
            require_identification: false,
            require_moderation: false,
            moderate_all_anonymous: false,
            notification_policy: NotificationPolicy::PendingModeration,
            moderators: vec![],
        }
    }

    pub fn commenter(hex: &str, tokens: i64, likes: i64) -> Commenter {
        Commenter {
            commenter_hex: hex.to_string(),
            email: format!("{}@example.com", hex),
            name: hex.to_string(),
            link: String::new(),
            cnt_tokens: tokens,
            available_likes: likes,
        }
    }
}
