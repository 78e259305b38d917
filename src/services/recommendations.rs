use std::sync::Arc;

use crate::{
    db::PreferenceStore,
    error::{AppError, AppResult},
    models::{AggregatedSummary, DestinationHit, Group, GroupId, SearchQuery},
    services::{
        aggregator::aggregate, formatter::format, intent::IntentResolver,
        providers::SearchGateway,
    },
};

/// Generates shared recommendations for a group
///
/// Pipeline: aggregate the members' preferences, let the model pick a shared
/// interest, search the destinations index with it, then de-duplicate the hits.
/// Any stage failure short-circuits and is returned unchanged. Each call
/// recomputes from the group's current state.
pub struct RecommendationService {
    store: Arc<dyn PreferenceStore>,
    resolver: IntentResolver,
    gateway: Arc<dyn SearchGateway>,
    clarify_on_intent_error: bool,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        resolver: IntentResolver,
        gateway: Arc<dyn SearchGateway>,
        clarify_on_intent_error: bool,
    ) -> Self {
        Self {
            store,
            resolver,
            gateway,
            clarify_on_intent_error,
        }
    }

    /// Recommends for a stored group
    pub async fn recommend(&self, group_id: &GroupId) -> AppResult<Vec<DestinationHit>> {
        // Snapshot taken under the group's lock; no lock is held past this point.
        let group = self.store.get_group(group_id).await?;
        self.recommend_for(&group).await
    }

    pub async fn recommend_for(&self, group: &Group) -> AppResult<Vec<DestinationHit>> {
        let summary = aggregate(group)?;

        tracing::info!(
            group_id = %group.id,
            members = group.member_count(),
            "Resolving shared interest"
        );

        let query = self.resolve_intent(&summary).await?;
        let hits = self.gateway.search(&query).await?;
        let raw_count = hits.len();
        let results = format(hits);

        tracing::info!(
            group_id = %group.id,
            term = %query.term,
            raw_hits = raw_count,
            results = results.len(),
            "Recommendations generated"
        );

        Ok(results)
    }

    /// Resolves intent, retrying once with an amended instruction if the model broke the tool contract
    async fn resolve_intent(&self, summary: &AggregatedSummary) -> AppResult<SearchQuery> {
        match self.resolver.resolve(summary).await {
            Err(AppError::IntentResolution(defect)) if self.clarify_on_intent_error => {
                tracing::warn!(defect = %defect, "Retrying intent resolution with clarification");
                self.resolver.resolve_clarified(summary, &defect).await
            }
            other => other,
        }
    }
}
