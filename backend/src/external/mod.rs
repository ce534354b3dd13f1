//! External API integrations

pub mod line;
pub mod sms;
pub mod statistics;

pub use line::LineMessagingClient;
pub use sms::SmsGatewayClient;
pub use statistics::{StatisticsClient, StatisticsProvider};
