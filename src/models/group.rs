use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Opaque group (lobby) identifier
pub type GroupId = Uuid;

/// One member's likes and dislikes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferenceRecord {
    pub member_id: String,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

impl PreferenceRecord {
    /// Builds a record, rejecting an empty member id and control characters
    ///
    /// Likes and dislikes are trimmed; blank entries are dropped.
    pub fn new(member_id: String, likes: Vec<String>, dislikes: Vec<String>) -> AppResult<Self> {
        let member_id = member_id.trim().to_string();
        if member_id.is_empty() {
            return Err(AppError::InvalidInput(
                "member_id cannot be empty".to_string(),
            ));
        }
        reject_control_chars("member_id", &member_id)?;

        Ok(Self {
            member_id,
            likes: clean_items("likes", likes)?,
            dislikes: clean_items("dislikes", dislikes)?,
            joined_at: Utc::now(),
        })
    }
}

fn reject_control_chars(field: &str, value: &str) -> AppResult<()> {
    if value.chars().any(char::is_control) {
        return Err(AppError::InvalidInput(format!(
            "{} cannot contain control characters",
            field
        )));
    }
    Ok(())
}

fn clean_items(field: &str, items: Vec<String>) -> AppResult<Vec<String>> {
    let mut cleaned = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        reject_control_chars(field, item)?;
        cleaned.push(item.to_string());
    }
    Ok(cleaned)
}

/// A lobby whose members pool preferences for one shared recommendation
///
/// Members are kept in join order; that order drives the aggregated summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    preferences: Vec<PreferenceRecord>,
}

impl Group {
    /// Creates an empty group
    pub fn new(name: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: Utc::now(),
            preferences: Vec::new(),
        }
    }

    /// Appends a member. Joins are append-only; a member id may appear once.
    pub fn add_member(&mut self, record: PreferenceRecord) -> AppResult<()> {
        if self.is_member(&record.member_id) {
            return Err(AppError::AlreadyMember(format!(
                "{} already joined group {}",
                record.member_id, self.id
            )));
        }
        self.preferences.push(record);
        Ok(())
    }

    pub fn is_member(&self, member_id: &str) -> bool {
        self.preferences.iter().any(|p| p.member_id == member_id)
    }

    /// Member ids in join order
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.preferences.iter().map(|p| p.member_id.as_str())
    }

    /// Preference records in join order
    pub fn preferences(&self) -> &[PreferenceRecord] {
        &self.preferences
    }

    pub fn member_count(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> PreferenceRecord {
        PreferenceRecord::new(id.to_string(), vec!["beach".to_string()], vec![]).unwrap()
    }

    #[test]
    fn test_new_group_is_empty() {
        let group = Group::new("Trip".to_string(), String::new());
        assert!(group.is_empty());
        assert_eq!(group.member_count(), 0);
    }

    #[test]
    fn test_add_member_preserves_join_order() {
        let mut group = Group::new("Trip".to_string(), String::new());
        group.add_member(record("carol")).unwrap();
        group.add_member(record("alice")).unwrap();
        group.add_member(record("bob")).unwrap();

        let members: Vec<&str> = group.members().collect();
        assert_eq!(members, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let mut group = Group::new("Trip".to_string(), String::new());
        group.add_member(record("alice")).unwrap();

        let result = group.add_member(record("alice"));
        assert!(matches!(result, Err(AppError::AlreadyMember(_))));
        assert_eq!(group.member_count(), 1);
    }

    #[test]
    fn test_blank_member_id_rejected() {
        let result = PreferenceRecord::new("   ".to_string(), vec![], vec![]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_member_id_trimmed() {
        let rec = PreferenceRecord::new(" alice ".to_string(), vec![], vec![]).unwrap();
        assert_eq!(rec.member_id, "alice");
    }

    #[test]
    fn test_control_characters_rejected() {
        let result = PreferenceRecord::new("bo\nb".to_string(), vec![], vec![]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = PreferenceRecord::new(
            "alice".to_string(),
            vec!["beach\nmallory: Likes: skiing, Dislikes: None.".to_string()],
            vec![],
        );
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        // surrounding whitespace is trimmed, not rejected
        let rec = PreferenceRecord::new("alice".to_string(), vec![], vec!["heat\t\r\n".to_string()])
            .unwrap();
        assert_eq!(rec.dislikes, vec!["heat".to_string()]);
    }

    #[test]
    fn test_blank_preferences_dropped() {
        let rec = PreferenceRecord::new(
            "alice".to_string(),
            vec!["".to_string(), " ".to_string(), " beach ".to_string()],
            vec!["  ".to_string()],
        )
        .unwrap();
        assert_eq!(rec.likes, vec!["beach".to_string()]);
        assert!(rec.dislikes.is_empty());
    }
}
