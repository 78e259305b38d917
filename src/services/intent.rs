use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{
        AggregatedSummary, ModelReply, SearchQuery, ToolArguments, ToolInvocationRequest,
        ToolOutcome, ToolSpec,
    },
    services::providers::LanguageModel,
};

pub const SYSTEM_INSTRUCTION: &str = "You are an assistant that helps users find destinations \
based on their preferences. Be as specific as you can with the tool params.";

/// Bounded exponential backoff for transient model failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Delay after the given zero-based failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Turns an aggregated summary into a search query through one forced tool call
///
/// Every call hits the model; nothing is cached because the group may have changed.
pub struct IntentResolver {
    model: Arc<dyn LanguageModel>,
    tool: ToolSpec,
    retry: RetryPolicy,
}

impl IntentResolver {
    pub fn new(model: Arc<dyn LanguageModel>, retry: RetryPolicy) -> Self {
        Self {
            model,
            tool: ToolSpec::event_search(),
            retry,
        }
    }

    pub async fn resolve(&self, summary: &AggregatedSummary) -> AppResult<SearchQuery> {
        self.resolve_with(summary, None).await
    }

    /// Same as `resolve` with the previous defect spelled out to the model
    pub async fn resolve_clarified(
        &self,
        summary: &AggregatedSummary,
        defect: &str,
    ) -> AppResult<SearchQuery> {
        self.resolve_with(summary, Some(defect)).await
    }

    async fn resolve_with(
        &self,
        summary: &AggregatedSummary,
        defect: Option<&str>,
    ) -> AppResult<SearchQuery> {
        let request = self.build_request(summary, defect);
        let reply = self.invoke_with_retry(&request).await?;

        match classify(&reply, &self.tool.name) {
            ToolOutcome::ToolCall(query) => {
                tracing::info!(
                    field = ?query.field,
                    term = %query.term,
                    clarified = defect.is_some(),
                    "Shared interest resolved"
                );
                Ok(query)
            }
            ToolOutcome::NoCall => {
                tracing::warn!(text = ?reply.text, "Model answered without calling the tool");
                Err(AppError::IntentResolution(format!(
                    "model replied without calling {}",
                    self.tool.name
                )))
            }
            ToolOutcome::MalformedCall(reason) => {
                tracing::warn!(reason = %reason, "Model produced a malformed tool call");
                Err(AppError::IntentResolution(reason))
            }
        }
    }

    fn build_request(
        &self,
        summary: &AggregatedSummary,
        defect: Option<&str>,
    ) -> ToolInvocationRequest {
        let instructions = match defect {
            Some(defect) => format!(
                "{} Your previous answer was rejected ({}). Respond with exactly one call to {} \
                 with a non-empty \"term\" and, optionally, \"field\" set to \"name\" or \"description\".",
                SYSTEM_INSTRUCTION, defect, self.tool.name
            ),
            None => SYSTEM_INSTRUCTION.to_string(),
        };

        ToolInvocationRequest {
            instructions,
            summary: summary.clone(),
            tool: self.tool.clone(),
        }
    }

    async fn invoke_with_retry(&self, request: &ToolInvocationRequest) -> AppResult<ModelReply> {
        let mut attempt = 0;

        loop {
            match self.model.invoke(request).await {
                Ok(reply) => return Ok(reply),
                Err(AppError::UpstreamUnavailable(message)) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        tracing::error!(
                            attempts = attempt,
                            provider = self.model.name(),
                            error = %message,
                            "Model unavailable, giving up"
                        );
                        return Err(AppError::UpstreamUnavailable(format!(
                            "{} (after {} attempts)",
                            message, attempt
                        )));
                    }

                    let backoff = self.retry.backoff(attempt - 1);
                    tracing::warn!(
                        attempt,
                        max = self.retry.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %message,
                        "Model unavailable, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Checks a reply against the forced tool-call contract
///
/// Exactly one invocation of `tool_name` whose arguments carry a non-empty term
/// (and, if present, a known field) is a `ToolCall`. No invocation at all is
/// `NoCall`; anything else is `MalformedCall`.
pub fn classify(reply: &ModelReply, tool_name: &str) -> ToolOutcome {
    let call = match reply.tool_calls.as_slice() {
        [] => return ToolOutcome::NoCall,
        [call] => call,
        calls => {
            return ToolOutcome::MalformedCall(format!(
                "expected one tool call, got {}",
                calls.len()
            ))
        }
    };

    if call.name != tool_name {
        return ToolOutcome::MalformedCall(format!("unexpected tool {}", call.name));
    }

    let args: ToolArguments = match serde_json::from_value(call.input.clone()) {
        Ok(args) => args,
        Err(e) => return ToolOutcome::MalformedCall(format!("invalid tool arguments: {}", e)),
    };

    let Some(term) = args.search_term() else {
        return ToolOutcome::MalformedCall("tool call has no term".to_string());
    };

    match SearchQuery::new(args.field, term) {
        Ok(query) => ToolOutcome::ToolCall(query),
        Err(_) => ToolOutcome::MalformedCall("tool call has an empty term".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SearchField, ToolInvocation};
    use crate::services::providers::MockLanguageModel;
    use serde_json::{json, Value};

    fn call(name: &str, input: Value) -> ToolInvocation {
        ToolInvocation {
            name: name.to_string(),
            input,
        }
    }

    fn reply_with(calls: Vec<ToolInvocation>) -> ModelReply {
        ModelReply {
            tool_calls: calls,
            text: Vec::new(),
        }
    }

    fn summary() -> AggregatedSummary {
        AggregatedSummary::new(
            "alice: Likes: beach, Dislikes: crowds.\nbob: Likes: beach, hiking, Dislikes: None."
                .to_string(),
        )
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    fn resolver(mock: MockLanguageModel) -> IntentResolver {
        IntentResolver::new(Arc::new(mock), fast_retry())
    }

    #[test]
    fn test_classify_valid_call() {
        let reply = reply_with(vec![call(
            "event_search",
            json!({ "field": "name", "term": "Bali" }),
        )]);
        assert_eq!(
            classify(&reply, "event_search"),
            ToolOutcome::ToolCall(SearchQuery::new(Some(SearchField::Name), "Bali").unwrap())
        );
    }

    #[test]
    fn test_classify_field_is_optional() {
        let reply = reply_with(vec![call("event_search", json!({ "term": "beach" }))]);
        match classify(&reply, "event_search") {
            ToolOutcome::ToolCall(query) => {
                assert_eq!(query.field, None);
                assert_eq!(query.term, "beach");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_classify_accepts_historical_argument_names() {
        for key in ["query", "lobby_type"] {
            let reply = reply_with(vec![call("event_search", json!({ key: "street food" }))]);
            assert!(matches!(
                classify(&reply, "event_search"),
                ToolOutcome::ToolCall(q) if q.term == "street food"
            ));
        }

        // `term` alongside an older name is still one valid call
        let reply = reply_with(vec![call(
            "event_search",
            json!({ "field": "description", "term": "beach", "query": "surfing" }),
        )]);
        assert!(matches!(
            classify(&reply, "event_search"),
            ToolOutcome::ToolCall(q) if q.term == "beach" && q.field == Some(SearchField::Description)
        ));
    }

    #[test]
    fn test_classify_text_only_is_no_call() {
        let reply = ModelReply {
            tool_calls: Vec::new(),
            text: vec!["You should all go to the beach!".to_string()],
        };
        assert_eq!(classify(&reply, "event_search"), ToolOutcome::NoCall);
    }

    #[test]
    fn test_classify_rejects_contract_violations() {
        let cases = vec![
            reply_with(vec![
                call("event_search", json!({ "term": "beach" })),
                call("event_search", json!({ "term": "hiking" })),
            ]),
            reply_with(vec![call("weather", json!({ "term": "beach" }))]),
            reply_with(vec![call("event_search", json!({ "field": "name" }))]),
            reply_with(vec![call("event_search", json!({ "term": "   " }))]),
            reply_with(vec![call("event_search", json!({ "field": "location", "term": "x" }))]),
            reply_with(vec![call("event_search", json!({ "term": 7 }))]),
            reply_with(vec![call("event_search", json!("beach"))]),
        ];

        for reply in cases {
            assert!(
                matches!(classify(&reply, "event_search"), ToolOutcome::MalformedCall(_)),
                "expected malformed for {:?}",
                reply
            );
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_resolve_sends_forced_request() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_invoke()
            .withf(|req| {
                req.tool.name == "event_search"
                    && req.instructions == SYSTEM_INSTRUCTION
                    && req.summary.lines().count() == 2
            })
            .times(1)
            .returning(|_| Ok(reply_with(vec![call("event_search", json!({ "term": "beach" }))])));

        let query = resolver(mock).resolve(&summary()).await.unwrap();
        assert_eq!(query.term, "beach");
    }

    #[tokio::test]
    async fn test_resolve_no_call_is_intent_error() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_invoke()
            .times(1)
            .returning(|_| Ok(ModelReply::default()));

        let result = resolver(mock).resolve(&summary()).await;
        assert!(matches!(result, Err(AppError::IntentResolution(_))));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        let mut calls = 0;
        mock.expect_invoke().times(3).returning(move |_| {
            calls += 1;
            if calls < 3 {
                Err(AppError::UpstreamUnavailable("timed out".to_string()))
            } else {
                Ok(reply_with(vec![call("event_search", json!({ "term": "beach" }))]))
            }
        });

        let query = resolver(mock).resolve(&summary()).await.unwrap();
        assert_eq!(query.term, "beach");
    }

    #[tokio::test]
    async fn test_retries_exhausted_is_upstream_unavailable() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_invoke()
            .times(3)
            .returning(|_| Err(AppError::UpstreamUnavailable("connection refused".to_string())));

        let result = resolver(mock).resolve(&summary()).await;
        assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_rejected_request_not_retried() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_invoke()
            .times(1)
            .returning(|_| Err(AppError::UpstreamRejected("401".to_string())));

        let result = resolver(mock).resolve(&summary()).await;
        assert!(matches!(result, Err(AppError::UpstreamRejected(_))));
    }

    #[tokio::test]
    async fn test_malformed_reply_not_retried_by_transport_loop() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_invoke()
            .times(1)
            .returning(|_| Ok(reply_with(vec![call("event_search", json!({}))])));

        let result = resolver(mock).resolve(&summary()).await;
        assert!(matches!(result, Err(AppError::IntentResolution(_))));
    }

    #[tokio::test]
    async fn test_clarified_request_names_the_defect() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_invoke()
            .withf(|req| {
                req.instructions.starts_with(SYSTEM_INSTRUCTION)
                    && req.instructions.contains("model replied without calling event_search")
            })
            .times(1)
            .returning(|_| Ok(reply_with(vec![call("event_search", json!({ "term": "beach" }))])));

        let query = resolver(mock)
            .resolve_clarified(&summary(), "model replied without calling event_search")
            .await
            .unwrap();
        assert_eq!(query.term, "beach");
    }
}
