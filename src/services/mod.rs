pub mod aggregator;
pub mod formatter;
pub mod intent;
pub mod providers;
pub mod recommendations;

pub use intent::{IntentResolver, RetryPolicy};
pub use recommendations::RecommendationService;
