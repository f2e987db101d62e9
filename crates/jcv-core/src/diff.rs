//! Structural diff summarizer.
//!
//! Computes the set of added, modified, and deleted fields between two parsed
//! JSON documents, addressed by dotted path. Nested objects are recursed
//! into; arrays are compared as opaque values, so any array difference shows
//! up as a single modification at the array's path. This summary feeds the
//! report exports; it is not a rendering diff.

use serde_json::{Map, Value};

/// Classifies a single change between the two documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// The field exists only in the modified document.
    Added,
    /// The field exists in both documents with different values.
    Modified,
    /// The field exists only in the original document.
    Deleted,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Modified => f.write_str("modified"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

/// One entry in the structural change summary.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    /// Dotted path to the affected field; empty for the document root.
    pub path: String,
    /// Whether the field was added, modified, or deleted.
    pub kind: ChangeKind,
    /// The value in the original document, for modified and deleted fields.
    pub old_value: Option<Value>,
    /// The value in the modified document, for added and modified fields.
    pub new_value: Option<Value>,
}

impl ChangeRecord {
    fn added(path: String, value: Value) -> Self {
        Self { path, kind: ChangeKind::Added, old_value: None, new_value: Some(value) }
    }

    fn deleted(path: String, value: Value) -> Self {
        Self { path, kind: ChangeKind::Deleted, old_value: Some(value), new_value: None }
    }

    fn modified(path: String, old_value: Value, new_value: Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Modified,
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }
}

/// The added/modified/deleted field sets between two documents.
///
/// ```
/// # use serde_json::json;
/// let summary = jcv_core::diff::ChangeSummary::between(
///     &json!({"x": 1}),
///     &json!({"x": 1, "y": 2}),
/// );
/// assert_eq!(summary.added.len(), 1);
/// assert_eq!(summary.added[0].path, "y");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSummary {
    /// Fields present only in the modified document.
    pub added: Vec<ChangeRecord>,
    /// Fields present in both documents with different values.
    pub modified: Vec<ChangeRecord>,
    /// Fields present only in the original document.
    pub deleted: Vec<ChangeRecord>,
}

impl ChangeSummary {
    /// Computes the summary for an original/modified document pair.
    ///
    /// Object roots are walked key by key. A pair of unequal non-object
    /// roots is reported as a single modification at the empty path.
    #[must_use]
    pub fn between(original: &Value, modified: &Value) -> Self {
        let mut summary = Self::default();
        match (original, modified) {
            (Value::Object(lhs), Value::Object(rhs)) => {
                diff_objects(lhs, rhs, "", &mut summary);
            }
            (lhs, rhs) if lhs != rhs => {
                summary.modified.push(ChangeRecord::modified(
                    String::new(),
                    lhs.clone(),
                    rhs.clone(),
                ));
            }
            _ => {}
        }
        summary
    }

    /// Total number of change records across all three sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    /// Indicates that the two documents are structurally identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Sorts each set by path for deterministic output.
    ///
    /// Record order otherwise follows the documents' key iteration order,
    /// which is not guaranteed stable across inputs.
    pub fn sort_by_path(&mut self) {
        self.added.sort_by(|a, b| a.path.cmp(&b.path));
        self.modified.sort_by(|a, b| a.path.cmp(&b.path));
        self.deleted.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn diff_objects(
    lhs: &Map<String, Value>,
    rhs: &Map<String, Value>,
    prefix: &str,
    summary: &mut ChangeSummary,
) {
    for (key, old_value) in lhs {
        let path = join_path(prefix, key);
        match rhs.get(key) {
            None => {
                summary.deleted.push(ChangeRecord::deleted(path, old_value.clone()));
            }
            Some(new_value) => match (old_value, new_value) {
                (Value::Object(left), Value::Object(right)) => {
                    diff_objects(left, right, &path, summary);
                }
                _ if old_value != new_value => {
                    summary.modified.push(ChangeRecord::modified(
                        path,
                        old_value.clone(),
                        new_value.clone(),
                    ));
                }
                _ => {}
            },
        }
    }

    for (key, new_value) in rhs {
        if !lhs.contains_key(key) {
            summary.added.push(ChangeRecord::added(join_path(prefix, key), new_value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::{
        collection::{btree_map, vec},
        prelude::*,
        string::string_regex,
    };
    use serde_json::json;

    #[test]
    fn identical_objects_produce_empty_summary() {
        let doc = json!({"a": 1, "b": [1, 2], "c": {"d": null}});
        let summary = ChangeSummary::between(&doc, &doc);
        assert!(summary.is_empty());
        assert_eq!(summary.len(), 0);
    }

    #[test]
    fn added_key_is_reported_with_its_value() {
        let summary = ChangeSummary::between(&json!({"x": 1}), &json!({"x": 1, "y": 2}));
        assert_eq!(
            summary.added,
            vec![ChangeRecord::added("y".to_string(), json!(2))]
        );
        assert!(summary.modified.is_empty());
        assert!(summary.deleted.is_empty());
    }

    #[test]
    fn deleted_key_is_reported_with_its_old_value() {
        let summary = ChangeSummary::between(&json!({"x": 1, "y": 2}), &json!({"x": 1}));
        assert_eq!(
            summary.deleted,
            vec![ChangeRecord::deleted("y".to_string(), json!(2))]
        );
        assert!(summary.added.is_empty());
        assert!(summary.modified.is_empty());
    }

    #[test]
    fn nested_objects_are_recursed_with_dotted_paths() {
        let summary = ChangeSummary::between(&json!({"x": {"a": 1}}), &json!({"x": {"a": 2}}));
        assert_eq!(
            summary.modified,
            vec![ChangeRecord::modified("x.a".to_string(), json!(1), json!(2))]
        );
    }

    #[test]
    fn arrays_are_compared_as_opaque_values() {
        let summary = ChangeSummary::between(&json!({"x": [1, 2]}), &json!({"x": [1, 2, 3]}));
        assert_eq!(
            summary.modified,
            vec![ChangeRecord::modified(
                "x".to_string(),
                json!([1, 2]),
                json!([1, 2, 3])
            )]
        );
    }

    #[test]
    fn null_and_object_values_do_not_recurse_into_each_other() {
        let summary = ChangeSummary::between(&json!({"x": null}), &json!({"x": {"a": 1}}));
        assert_eq!(summary.modified.len(), 1);
        assert_eq!(summary.modified[0].path, "x");
    }

    #[test]
    fn unequal_scalar_roots_report_a_single_root_modification() {
        let summary = ChangeSummary::between(&json!(1), &json!(2));
        assert_eq!(
            summary.modified,
            vec![ChangeRecord::modified(String::new(), json!(1), json!(2))]
        );
    }

    #[test]
    fn sort_by_path_orders_each_section() {
        let mut summary =
            ChangeSummary::between(&json!({"b": 1, "a": 1}), &json!({"c": 2, "d": 2}));
        summary.sort_by_path();
        let deleted: Vec<_> = summary.deleted.iter().map(|r| r.path.as_str()).collect();
        let added: Vec<_> = summary.added.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(deleted, ["a", "b"]);
        assert_eq!(added, ["c", "d"]);
    }

    fn arb_json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            string_regex("[a-z0-9]{0,8}").unwrap().prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 16, 4, move |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(Value::Array),
                btree_map(string_regex("[a-z]{1,6}").unwrap(), inner, 0..4).prop_map(|map| {
                    Value::Object(map.into_iter().collect())
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn diff_against_self_is_empty(value in arb_json_value()) {
            let summary = ChangeSummary::between(&value, &value);
            prop_assert!(summary.is_empty());
        }

        #[test]
        fn every_record_lands_in_the_matching_section(
            lhs in arb_json_value(),
            rhs in arb_json_value(),
        ) {
            let summary = ChangeSummary::between(&lhs, &rhs);
            prop_assert!(summary.added.iter().all(|r| r.kind == ChangeKind::Added
                && r.old_value.is_none()
                && r.new_value.is_some()));
            prop_assert!(summary.deleted.iter().all(|r| r.kind == ChangeKind::Deleted
                && r.old_value.is_some()
                && r.new_value.is_none()));
            prop_assert!(summary.modified.iter().all(|r| r.kind == ChangeKind::Modified
                && r.old_value.is_some()
                && r.new_value.is_some()));
        }
    }
}
