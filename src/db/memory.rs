use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{
    db::PreferenceStore,
    error::{AppError, AppResult},
    models::{Group, GroupId, PreferenceRecord},
};

#[derive(Default)]
struct Registry {
    groups: HashMap<GroupId, Arc<Mutex<Group>>>,
    /// Creation order
    order: Vec<GroupId>,
}

/// Process-local preference store
///
/// The registry lock is only held to find a group's slot. Each group has its own
/// mutex, so a join and an aggregation read of the same group never interleave
/// while different groups proceed independently.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    registry: RwLock<Registry>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, group_id: &GroupId) -> AppResult<Arc<Mutex<Group>>> {
        let registry = self.registry.read().await;
        registry
            .groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))
    }
}

#[async_trait::async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn create_group(&self, name: String, description: String) -> AppResult<Group> {
        let group = Group::new(name, description);
        let snapshot = group.clone();

        let mut registry = self.registry.write().await;
        registry.order.push(group.id);
        registry.groups.insert(group.id, Arc::new(Mutex::new(group)));

        tracing::info!(group_id = %snapshot.id, name = %snapshot.name, "Group created");
        Ok(snapshot)
    }

    async fn add_member(&self, group_id: &GroupId, record: PreferenceRecord) -> AppResult<()> {
        let slot = self.slot(group_id).await?;
        let mut group = slot.lock().await;
        let member_id = record.member_id.clone();
        group.add_member(record)?;

        tracing::info!(
            group_id = %group_id,
            member_id = %member_id,
            members = group.member_count(),
            "Member joined group"
        );
        Ok(())
    }

    async fn get_group(&self, group_id: &GroupId) -> AppResult<Group> {
        let slot = self.slot(group_id).await?;
        let group = slot.lock().await;
        Ok(group.clone())
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let slots: Vec<Arc<Mutex<Group>>> = {
            let registry = self.registry.read().await;
            registry
                .order
                .iter()
                .filter_map(|id| registry.groups.get(id).cloned())
                .collect()
        };

        let mut groups = Vec::with_capacity(slots.len());
        for slot in slots {
            groups.push(slot.lock().await.clone());
        }
        Ok(groups)
    }
}
