use std::sync::Arc;

use crate::db::PreferenceStore;
use crate::services::RecommendationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PreferenceStore>,
    pub recommender: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(store: Arc<dyn PreferenceStore>, recommender: RecommendationService) -> Self {
        Self {
            store,
            recommender: Arc::new(recommender),
        }
    }
}
