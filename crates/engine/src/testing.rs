use adapter::{PricingService, SpamCheck, SpamClassifier};
use anyhow::{bail, Result};
use async_trait::async_trait;
use domain::{CommentEvent, Commenter, DomainConfig, DomainState, NotificationPolicy};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use storage::Db;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::{AdmissionEngine, VoteLedger};

pub const DOMAIN: &str = "example.com";

#[derive(Default)]
pub struct FakeSpam {
    pub verdict: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeSpam {
    pub fn set(&self, spam: bool) {
        self.verdict.store(spam, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpamClassifier for FakeSpam {
    async fn is_spam(&self, _check: &SpamCheck<'_>) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict.load(Ordering::SeqCst))
    }
}

/// Fixed price; `None` simulates the pricing service being down.
pub struct FakePricing(pub Option<u64>);

#[async_trait]
impl PricingService for FakePricing {
    async fn price_of(&self, _post_id: &str) -> Result<u64> {
        match self.0 {
            Some(p) => Ok(p),
            None => bail!("pricing service unavailable"),
        }
    }
}

pub struct TestEnv {
    pub db: Db,
    pub spam: Arc<FakeSpam>,
    pub engine: AdmissionEngine,
    pub ledger: VoteLedger,
    pub events: mpsc::Receiver<CommentEvent>,
    _dir: TempDir,
}

pub async fn env_with_price(price: Option<u64>) -> TestEnv {
    env_with(price, 16).await
}

pub async fn env_with(price: Option<u64>, queue: usize) -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("engine.db").display());
    let db = Db::new(&url).await.unwrap();

    let spam = Arc::new(FakeSpam::default());
    let (tx, rx) = mpsc::channel(queue);
    let engine = AdmissionEngine::new(
        db.clone(),
        spam.clone(),
        Arc::new(FakePricing(price)),
        tx,
    );
    let ledger = VoteLedger::new(db.clone());

    TestEnv {
        db,
        spam,
        engine,
        ledger,
        events: rx,
        _dir: dir,
    }
}

pub fn domain_config() -> DomainConfig {
    DomainConfig {
        domain: DOMAIN.to_string(),
        name: "Example".to_string(),
        state: DomainState::Unfrozen,
        require_identification: false,
        require_moderation: false,
        moderate_all_anonymous: false,
        notification_policy: NotificationPolicy::PendingModeration,
        moderators: vec!["mod@example.com".to_string()],
    }
}

impl TestEnv {
    pub async fn add_domain(&self, cfg: &DomainConfig) {
        self.db.upsert_domain(cfg).await.unwrap();
    }

    /// Creates a commenter with session token `tok-{hex}`.
    pub async fn add_commenter(&self, hex: &str, tokens: i64, likes: i64) -> Commenter {
        let c = Commenter {
            commenter_hex: hex.to_string(),
            email: format!("{}@example.com", hex),
            name: hex.to_string(),
            link: format!("https://{}.example.com", hex),
            cnt_tokens: tokens,
            available_likes: likes,
        };
        self.db.create_commenter(&c).await.unwrap();
        self.db
            .create_session(&format!("tok-{}", hex), hex)
            .await
            .unwrap();
        c
    }

    pub async fn balance(&self, hex: &str) -> (i64, i64) {
        let c = self.db.get_commenter(hex).await.unwrap().unwrap();
        (c.cnt_tokens, c.available_likes)
    }
}
