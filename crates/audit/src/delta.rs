//! Field-level delta computation for UPDATE entries.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::entry::{FieldChange, Snapshot};

/// Compute the field delta between two snapshots.
///
/// For every key in `after`, the value is compared against `before`; unequal
/// pairs (a key newly present counts as changed from `null`) produce a
/// `{field: {old, new}}` entry. Keys present only in `before` are recorded
/// as changed to `null`. Unchanged keys are omitted.
///
/// Pure and deterministic: the output is keyed by field name, so it does not
/// depend on map iteration order.
pub fn compute_changes(before: &Snapshot, after: &Snapshot) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();

    for (key, new_value) in after {
        let old_value = before.get(key).cloned().unwrap_or(Value::Null);
        if &old_value != new_value {
            changes.insert(
                key.clone(),
                FieldChange {
                    old: old_value,
                    new: new_value.clone(),
                },
            );
        }
    }

    for (key, old_value) in before {
        if !after.contains_key(key) {
            changes.insert(
                key.clone(),
                FieldChange {
                    old: old_value.clone(),
                    new: Value::Null,
                },
            );
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn detects_changed_added_and_unchanged_fields() {
        let before = snapshot(json!({"a": 1, "b": 2}));
        let after = snapshot(json!({"a": 1, "b": 3, "c": 4}));

        let changes = compute_changes(&before, &after);

        assert!(!changes.contains_key("a"));
        assert_eq!(changes["b"], FieldChange { old: json!(2), new: json!(3) });
        assert_eq!(changes["c"], FieldChange { old: json!(null), new: json!(4) });
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn records_removed_fields_as_changed_to_null() {
        let before = snapshot(json!({"a": 1, "gone": "x"}));
        let after = snapshot(json!({"a": 1}));

        let changes = compute_changes(&before, &after);
        assert_eq!(
            changes["gone"],
            FieldChange { old: json!("x"), new: json!(null) }
        );
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn identical_snapshots_yield_empty_delta() {
        let snap = snapshot(json!({"a": 1, "b": [1, 2], "c": {"x": true}}));
        assert!(compute_changes(&snap, &snap).is_empty());
    }

    #[test]
    fn null_to_value_counts_as_change() {
        let before = snapshot(json!({"a": null}));
        let after = snapshot(json!({"a": 7}));

        let changes = compute_changes(&before, &after);
        assert_eq!(changes["a"], FieldChange { old: json!(null), new: json!(7) });
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_snapshot() -> impl Strategy<Value = Snapshot> {
            proptest::collection::btree_map("[a-z]{1,8}", 0i64..100, 0..8).prop_map(|m| {
                m.into_iter()
                    .map(|(k, v)| (k, serde_json::json!(v)))
                    .collect()
            })
        }

        proptest! {
            /// Property: the delta is deterministic (pure function).
            #[test]
            fn delta_is_deterministic(before in arbitrary_snapshot(), after in arbitrary_snapshot()) {
                let a = compute_changes(&before, &after);
                let b = compute_changes(&before, &after);
                prop_assert_eq!(a, b);
            }

            /// Property: every delta key comes from one of the snapshots, and
            /// unchanged keys never appear.
            #[test]
            fn delta_keys_are_sound(before in arbitrary_snapshot(), after in arbitrary_snapshot()) {
                let changes = compute_changes(&before, &after);
                for (key, change) in &changes {
                    prop_assert!(before.contains_key(key) || after.contains_key(key));
                    prop_assert_ne!(&change.old, &change.new);
                }
                for (key, value) in &before {
                    if after.get(key) == Some(value) {
                        prop_assert!(!changes.contains_key(key));
                    }
                }
            }

            /// Property: an empty delta means the snapshots are equal.
            #[test]
            fn empty_delta_means_equal(before in arbitrary_snapshot(), after in arbitrary_snapshot()) {
                let changes = compute_changes(&before, &after);
                if changes.is_empty() {
                    prop_assert_eq!(before, after);
                }
            }
        }
    }
}
