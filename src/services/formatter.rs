use std::collections::HashSet;

use crate::models::{DestinationHit, IndexHit};

/// Converts raw index hits into the response list
///
/// Keeps the engine's rank order, drops later hits whose name was already seen
/// (exact, case-sensitive), and skips hits with no usable name. A missing
/// description becomes an empty string.
pub fn format(hits: Vec<IndexHit>) -> Vec<DestinationHit> {
    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(hits.len());
    let mut dropped = 0usize;

    for (rank, hit) in hits.into_iter().enumerate() {
        let name = match hit.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                tracing::warn!(rank, "Dropping search hit without a name");
                dropped += 1;
                continue;
            }
        };

        if !seen.insert(name.clone()) {
            continue;
        }

        results.push(DestinationHit {
            name,
            description: hit.description.unwrap_or_default(),
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = results.len(), "Malformed hits dropped");
    }

    results
}
