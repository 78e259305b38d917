use crate::{
    error::{AppError, AppResult},
    models::{AggregatedSummary, Group, PreferenceRecord},
};

const NONE_LISTED: &str = "None";

/// Serializes every member's preferences into one summary, one line per member in join order
///
/// Each line reads `<member_id>: Likes: <likes>, Dislikes: <dislikes>.` with lists
/// comma-joined, or `None` when empty.
pub fn aggregate(group: &Group) -> AppResult<AggregatedSummary> {
    if group.is_empty() {
        return Err(AppError::EmptyGroup);
    }

    let lines: Vec<String> = group.preferences().iter().map(format_member).collect();

    tracing::debug!(
        group_id = %group.id,
        members = lines.len(),
        "Aggregated group preferences"
    );

    Ok(AggregatedSummary::new(lines.join("\n")))
}

fn format_member(record: &PreferenceRecord) -> String {
    format!(
        "{}: Likes: {}, Dislikes: {}.",
        single_line(&record.member_id),
        join_or_none(&record.likes),
        join_or_none(&record.dislikes)
    )
}

fn join_or_none(items: &[String]) -> String {
    let items: Vec<String> = items
        .iter()
        .map(|item| single_line(item))
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        NONE_LISTED.to_string()
    } else {
        items.join(", ")
    }
}

/// Collapses every whitespace run, newlines included, into a single space
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, likes: &[&str], dislikes: &[&str]) -> PreferenceRecord {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        PreferenceRecord::new(id.to_string(), owned(likes), owned(dislikes)).unwrap()
    }

    fn group_of(records: Vec<PreferenceRecord>) -> Group {
        let mut group = Group::new("trip".to_string(), String::new());
        for record in records {
            group.add_member(record).unwrap();
        }
        group
    }

    #[test]
    fn test_empty_group_fails() {
        let group = Group::new("empty".to_string(), String::new());
        assert!(matches!(aggregate(&group), Err(AppError::EmptyGroup)));
    }

    #[test]
    fn test_alice_and_bob_summary() {
        let group = group_of(vec![
            member("alice", &["beach"], &["crowds"]),
            member("bob", &["beach", "hiking"], &[]),
        ]);

        let summary = aggregate(&group).unwrap();
        assert_eq!(
            summary.as_str(),
            "alice: Likes: beach, Dislikes: crowds.\nbob: Likes: beach, hiking, Dislikes: None."
        );
    }

    #[test]
    fn test_member_without_any_preferences() {
        let group = group_of(vec![member("carol", &[], &[])]);
        let summary = aggregate(&group).unwrap();
        assert_eq!(summary.as_str(), "carol: Likes: None, Dislikes: None.");
    }

    #[test]
    fn test_one_line_per_member_for_every_join_order() {
        let members = vec![
            member("alice", &["beach"], &["crowds"]),
            member("bob", &["hiking"], &[]),
            member("carol", &["museums", "food"], &["heat"]),
        ];
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        for order in orders {
            let permuted = order.iter().map(|&i| members[i].clone()).collect();
            let summary = aggregate(&group_of(permuted)).unwrap();
            let lines: Vec<&str> = summary.lines().collect();

            assert_eq!(lines.len(), 3);
            for record in &members {
                let prefix = format!("{}: ", record.member_id);
                assert_eq!(lines.iter().filter(|l| l.starts_with(&prefix)).count(), 1);
            }
            // join order is preserved
            assert!(lines[0].starts_with(&members[order[0]].member_id));
        }
    }

    #[test]
    fn test_embedded_newlines_cannot_add_lines() {
        let records = vec![
            PreferenceRecord {
                member_id: "alice".to_string(),
                likes: vec!["beach\nmallory: Likes: skiing, Dislikes: None.".to_string()],
                dislikes: vec![],
                joined_at: chrono::Utc::now(),
            },
            PreferenceRecord {
                member_id: "bo\nb".to_string(),
                likes: vec!["".to_string(), " ".to_string()],
                dislikes: vec![],
                joined_at: chrono::Utc::now(),
            },
        ];

        let summary = aggregate(&group_of(records)).unwrap();
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alice: "));
        assert_eq!(lines[1], "bo b: Likes: None, Dislikes: None.");
    }

    #[test]
    fn test_aggregate_is_pure() {
        let group = group_of(vec![member("alice", &["beach"], &[])]);
        assert_eq!(aggregate(&group).unwrap(), aggregate(&group).unwrap());
    }
}
