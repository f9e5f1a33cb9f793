mod common;
mod drivers;
mod notify;
mod traits;

pub use common::markdown::render_markdown;
pub use drivers::akismet::{AkismetClassifier, AkismetConfig, DisabledClassifier};
pub use drivers::pricing::HttpPricing;
pub use drivers::sinks::{LogSink, WebhookSink};
pub use notify::{plan_notifications, start_notifier, AdmittedComment};
pub use traits::{
    NotificationKind, NotificationSink, OutboundNotification, PricingService, SpamCheck,
    SpamClassifier,
};
