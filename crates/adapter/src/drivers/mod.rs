pub mod akismet;
pub mod pricing;
pub mod sinks;
