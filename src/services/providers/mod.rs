//! External collaborators of the recommendation pipeline
//!
//! The language model and the destinations index both sit behind traits so the
//! pipeline can be driven by any backend (or a mock in tests). Implementations
//! perform a single request; retry policy belongs to the caller.

use crate::{
    error::AppResult,
    models::{IndexHit, ModelReply, SearchQuery, ToolInvocationRequest},
};

pub mod anthropic;
pub mod elasticsearch;

pub use anthropic::AnthropicModel;
pub use elasticsearch::ElasticsearchGateway;

/// A language model that accepts forced tool-call requests
///
/// Transport failures and timeouts surface as `UpstreamUnavailable`; requests
/// the endpoint refuses outright surface as `UpstreamRejected`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends one request and returns the reply as received
    async fn invoke(&self, request: &ToolInvocationRequest) -> AppResult<ModelReply>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Ranked retrieval against the destinations index
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchGateway: Send + Sync {
    /// Runs a bounded query and returns hits in the engine's rank order
    ///
    /// No hits is `Ok(vec![])`. An unreachable or timed-out index is `SearchUnavailable`.
    async fn search(&self, query: &SearchQuery) -> AppResult<Vec<IndexHit>>;

    fn name(&self) -> &'static str;
}
