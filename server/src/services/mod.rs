// paysync-server/src/services/mod.rs
pub mod notifier;
pub mod order_matcher;
pub mod status_mapper;

pub use notifier::{HttpNotifier, LogNotifier, NotificationGateway, PaymentNotification};
pub use order_matcher::{MatchOutcome, OrderMatcher};
pub use status_mapper::map_provider_status;
