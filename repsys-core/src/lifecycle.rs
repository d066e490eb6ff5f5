//! Created / removed / retained sets for one entity class.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

/// Lifecycle of one entity class between two snapshots.
///
/// `created` and `retained` follow the current order, `removed` follows the
/// previous order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle<Id> {
    pub created: Vec<Id>,
    pub removed: Vec<Id>,
    pub retained: Vec<Id>,
    /// Ids listed more than once in either input. Each was kept once.
    pub duplicates: Vec<Id>,
}

impl<Id> Default for Lifecycle<Id> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            removed: Vec::new(),
            retained: Vec::new(),
            duplicates: Vec::new(),
        }
    }
}

impl<Id: Clone + Eq + Hash> Lifecycle<Id> {
    /// Enforce that an id both created and removed in one tick counts as
    /// removed: it is dropped from `created`. Returns the conflicting ids.
    pub fn sanitize(&mut self) -> Vec<Id> {
        let removed: HashSet<&Id> = self.removed.iter().collect();
        let conflicts: Vec<Id> = self
            .created
            .iter()
            .filter(|id| removed.contains(id))
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            let conflicting: HashSet<&Id> = conflicts.iter().collect();
            self.created.retain(|id| !conflicting.contains(id));
        }
        conflicts
    }

    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

/// Compare two id lists.
pub fn track<Id>(previous: &[Id], current: &[Id]) -> Lifecycle<Id>
where
    Id: Clone + Eq + Hash + Display,
{
    let mut out = Lifecycle::default();
    let prev = dedup(previous, &mut out.duplicates);
    let cur = dedup(current, &mut out.duplicates);

    let prev_set: HashSet<&Id> = prev.iter().collect();
    let cur_set: HashSet<&Id> = cur.iter().collect();

    for id in &cur {
        if prev_set.contains(id) {
            out.retained.push(id.clone());
        } else {
            out.created.push(id.clone());
        }
    }
    for id in &prev {
        if !cur_set.contains(id) {
            out.removed.push(id.clone());
        }
    }
    out
}

fn dedup<Id>(ids: &[Id], duplicates: &mut Vec<Id>) -> Vec<Id>
where
    Id: Clone + Eq + Hash + Display,
{
    let mut seen = HashSet::with_capacity(ids.len());
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.insert(id) {
            out.push(id.clone());
        } else {
            log::warn!(target: "reconcile", "duplicate id {} collapsed", id);
            if !duplicates.contains(id) {
                duplicates.push(id.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partitions_and_orders() {
        let lc = track(&ids(&["a", "b", "c"]), &ids(&["d", "c", "a"]));
        assert_eq!(lc.created, ids(&["d"]));
        assert_eq!(lc.removed, ids(&["b"]));
        assert_eq!(lc.retained, ids(&["c", "a"]));
        assert!(lc.duplicates.is_empty());
    }

    #[test]
    fn from_nothing_everything_is_created() {
        let lc = track(&[], &ids(&["a", "b"]));
        assert_eq!(lc.created, ids(&["a", "b"]));
        assert!(lc.removed.is_empty());
        assert!(lc.retained.is_empty());
    }

    #[test]
    fn duplicates_are_collapsed() {
        let lc = track(&ids(&["a"]), &ids(&["b", "b", "a", "a"]));
        assert_eq!(lc.created, ids(&["b"]));
        assert_eq!(lc.retained, ids(&["a"]));
        assert_eq!(lc.duplicates, ids(&["b", "a"]));
    }

    #[test]
    fn sanitize_prefers_removal() {
        let mut lc = Lifecycle {
            created: ids(&["x", "y"]),
            removed: ids(&["y"]),
            ..Default::default()
        };
        let conflicts = lc.sanitize();
        assert_eq!(conflicts, ids(&["y"]));
        assert_eq!(lc.created, ids(&["x"]));
        assert_eq!(lc.removed, ids(&["y"]));
    }

    #[test]
    fn sanitize_is_a_noop_for_clean_sets() {
        let mut lc = track(&ids(&["a"]), &ids(&["b"]));
        assert!(lc.sanitize().is_empty());
        assert_eq!(lc.created, ids(&["b"]));
    }
}
