pub mod memory;

pub use memory::InMemoryPreferenceStore;

use crate::{
    error::AppResult,
    models::{Group, GroupId, PreferenceRecord},
};

/// Storage for groups and their members' preferences
///
/// Reads return a snapshot taken under the group's lock, so a join is never
/// observed half-applied.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Creates an empty group
    async fn create_group(&self, name: String, description: String) -> AppResult<Group>;

    /// Appends a member; fails with NotFound or AlreadyMember
    async fn add_member(&self, group_id: &GroupId, record: PreferenceRecord) -> AppResult<()>;

    async fn get_group(&self, group_id: &GroupId) -> AppResult<Group>;

    /// All groups, oldest first
    async fn list_groups(&self) -> AppResult<Vec<Group>>;
}
