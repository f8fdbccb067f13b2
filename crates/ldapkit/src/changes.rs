//! Change descriptions and the ordered change-list sent in a modify request.
//!
//! A [`ChangeSpec`] groups changes by kind. [`build`] flattens it in three passes so that every
//! delete precedes every replace, which precedes every add, whatever order the description was
//! written in.

use serde_json::Value;
use std::fmt;

use ldapkit_core::{Error, RejectedChange};

use crate::Result;

/// Values targeted by a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteValues {
    /// Remove the attribute entirely, whatever it currently holds.
    All,
    /// Remove only these values.
    Values(Vec<String>),
}

/// Kind of a single modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModOp {
    /// Remove values or the whole attribute.
    Delete,
    /// Replace all values.
    Replace,
    /// Add values.
    Add,
}

impl ModOp {
    /// Keyword used for this kind in change descriptions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::Add => "add",
        }
    }
}

impl fmt::Display for ModOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (operation, attribute, values) triple of a change-list.
///
/// A delete with no values removes the whole attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    /// Change kind.
    pub op: ModOp,
    /// Attribute to modify.
    pub attribute: String,
    /// Values to delete, replace with or add.
    pub values: Vec<String>,
}

/// Declarative description of changes to one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSpec {
    /// Attributes to delete from, in declaration order.
    pub delete: Vec<(String, DeleteValues)>,
    /// Attributes to replace, in declaration order.
    pub replace: Vec<(String, Vec<String>)>,
    /// Attributes to add to, in declaration order.
    pub add: Vec<(String, Vec<String>)>,
}

impl ChangeSpec {
    /// Empty description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `attribute` entirely.
    #[must_use]
    pub fn delete_all(mut self, attribute: impl Into<String>) -> Self {
        self.delete.push((attribute.into(), DeleteValues::All));
        self
    }

    /// Removes specific values of `attribute`.
    #[must_use]
    pub fn delete_values<I, S>(mut self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.delete
            .push((attribute.into(), DeleteValues::Values(values)));
        self
    }

    /// Replaces every value of `attribute`.
    #[must_use]
    pub fn replace<I, S>(mut self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace
            .push((attribute.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Adds values to `attribute`.
    #[must_use]
    pub fn add<I, S>(mut self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add
            .push((attribute.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Returns true if the description holds no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.replace.is_empty() && self.add.is_empty()
    }

    /// Reads the declarative shape `{"delete": {...}, "replace": {...}, "add": {...}}`.
    ///
    /// Under `delete`, `null` removes the whole attribute and a string or list removes those
    /// values. Under `replace` and `add`, a string or list gives the values. Attribute order
    /// within each group is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for unknown keys, non-object groups, empty explicit
    /// delete or add lists, and values that are not strings.
    pub fn from_json(value: &Value) -> Result<Self> {
        let groups = value
            .as_object()
            .ok_or_else(|| config_error("change description must be an object"))?;

        let mut spec = Self::new();
        for (key, group) in groups {
            let op = match key.as_str() {
                "delete" => ModOp::Delete,
                "replace" => ModOp::Replace,
                "add" => ModOp::Add,
                other => {
                    return Err(config_error(&format!(
                        "unknown change operation `{other}` (expected delete, replace or add)"
                    )))
                }
            };
            let attributes = group
                .as_object()
                .ok_or_else(|| config_error(&format!("`{key}` must map attributes to values")))?;

            for (attribute, values) in attributes {
                match op {
                    ModOp::Delete if values.is_null() => {
                        spec.delete.push((attribute.clone(), DeleteValues::All));
                    }
                    ModOp::Delete => {
                        let values = non_empty(op, attribute, json_strings(attribute, values)?)?;
                        spec.delete
                            .push((attribute.clone(), DeleteValues::Values(values)));
                    }
                    ModOp::Replace => {
                        spec.replace
                            .push((attribute.clone(), json_strings(attribute, values)?));
                    }
                    ModOp::Add => {
                        let values = non_empty(op, attribute, json_strings(attribute, values)?)?;
                        spec.add.push((attribute.clone(), values));
                    }
                }
            }
        }
        Ok(spec)
    }
}

fn config_error(message: &str) -> Error {
    Error::ConfigError(message.to_string())
}

fn json_strings(attribute: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    config_error(&format!("values of `{attribute}` must be strings"))
                })
            })
            .collect(),
        _ => Err(config_error(&format!(
            "values of `{attribute}` must be a string or a list of strings"
        ))),
    }
}

fn non_empty(op: ModOp, attribute: &str, values: Vec<String>) -> Result<Vec<String>> {
    if values.is_empty() {
        return Err(config_error(&format!(
            "`{op}` of `{attribute}` lists no values"
        )));
    }
    Ok(values)
}

/// Flattens a change description into the ordered change-list.
///
/// # Errors
///
/// Returns [`Error::ConfigError`] when a delete or add lists no values. An empty value list
/// would otherwise reach the server as a whole-attribute delete.
pub fn build(spec: &ChangeSpec) -> Result<Vec<Modification>> {
    let mut changes = Vec::with_capacity(spec.delete.len() + spec.replace.len() + spec.add.len());

    for (attribute, values) in &spec.delete {
        let values = match values {
            DeleteValues::All => Vec::new(),
            DeleteValues::Values(values) => non_empty(ModOp::Delete, attribute, values.clone())?,
        };
        changes.push(Modification {
            op: ModOp::Delete,
            attribute: attribute.clone(),
            values,
        });
    }
    for (attribute, values) in &spec.replace {
        changes.push(Modification {
            op: ModOp::Replace,
            attribute: attribute.clone(),
            values: values.clone(),
        });
    }
    for (attribute, values) in &spec.add {
        changes.push(Modification {
            op: ModOp::Add,
            attribute: attribute.clone(),
            values: non_empty(ModOp::Add, attribute, values.clone())?,
        });
    }

    Ok(changes)
}

/// Picks the change a server diagnostic refers to.
///
/// OpenLDAP-style messages read `modify/<op>: <attribute>: <reason>`; otherwise the first
/// change whose attribute name appears in the message is taken.
#[must_use]
pub fn identify_rejected(changes: &[Modification], message: &str) -> Option<RejectedChange> {
    let lowered = message.to_ascii_lowercase();
    let mentions = |change: &Modification| {
        lowered
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ';'))
            .any(|word| word == change.attribute.to_ascii_lowercase())
    };
    let hinted_op = [ModOp::Delete, ModOp::Replace, ModOp::Add]
        .into_iter()
        .find(|op| lowered.contains(&format!("modify/{}", op.as_str())));

    changes
        .iter()
        .enumerate()
        .find(|(_, change)| hinted_op.map_or(true, |op| op == change.op) && mentions(change))
        .or_else(|| changes.iter().enumerate().find(|(_, change)| mentions(change)))
        .map(|(index, change)| RejectedChange {
            index,
            operation: change.op.as_str().to_string(),
            attribute: change.attribute.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_and_delete_all_are_ordered() {
        let spec = ChangeSpec::from_json(&json!({
            "add": {"mail": ["a@example.com"]},
            "delete": {"gecos": null}
        }))
        .unwrap();

        assert_eq!(
            build(&spec).unwrap(),
            vec![
                Modification {
                    op: ModOp::Delete,
                    attribute: "gecos".to_string(),
                    values: Vec::new(),
                },
                Modification {
                    op: ModOp::Add,
                    attribute: "mail".to_string(),
                    values: vec!["a@example.com".to_string()],
                },
            ]
        );
    }

    #[test]
    fn overlapping_attributes_keep_phase_order() {
        let spec = ChangeSpec::new()
            .add("mail", ["new@example.com"])
            .replace("cn", ["New name"])
            .delete_values("mail", ["old@example.com"])
            .add("cn", ["Alias"])
            .delete_all("shadowLastChange")
            .replace("mail", ["x@example.com"]);

        let ops: Vec<(ModOp, String)> = build(&spec)
            .unwrap()
            .into_iter()
            .map(|m| (m.op, m.attribute))
            .collect();

        assert_eq!(
            ops,
            vec![
                (ModOp::Delete, "mail".to_string()),
                (ModOp::Delete, "shadowLastChange".to_string()),
                (ModOp::Replace, "cn".to_string()),
                (ModOp::Replace, "mail".to_string()),
                (ModOp::Add, "mail".to_string()),
                (ModOp::Add, "cn".to_string()),
            ]
        );
    }

    #[test]
    fn delete_values_differs_from_delete_all() {
        let changes = build(
            &ChangeSpec::new()
                .delete_values("cn", ["added"])
                .delete_all("memberUid"),
        )
        .unwrap();
        assert_eq!(changes[0].values, vec!["added".to_string()]);
        assert!(changes[1].values.is_empty());
    }

    #[test]
    fn empty_value_lists_never_become_delete_all() {
        let err = build(&ChangeSpec::new().delete_values("mail", Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("mail")));

        let spec = ChangeSpec {
            delete: vec![("cn".to_string(), DeleteValues::Values(Vec::new()))],
            ..ChangeSpec::default()
        };
        assert!(build(&spec).is_err());
        assert!(build(&ChangeSpec::new().add("memberUid", Vec::<String>::new())).is_err());
        assert!(build(&ChangeSpec::new().replace("description", Vec::<String>::new())).is_ok());
    }

    #[test]
    fn json_declaration_order_is_preserved_within_a_group() {
        let spec = ChangeSpec::from_json(&json!({
            "replace": {"loginShell": "/usr/sbin/nologin", "homeDirectory": "/mnt/data/x", "cn": ["New name"]}
        }))
        .unwrap();
        let names: Vec<&str> = spec.replace.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["loginShell", "homeDirectory", "cn"]);
    }

    #[test]
    fn unknown_operation_is_a_configuration_error() {
        let err = ChangeSpec::from_json(&json!({"increment": {"uidNumber": "1"}})).unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("increment")));
    }

    #[test]
    fn malformed_groups_are_rejected() {
        assert!(ChangeSpec::from_json(&json!(["add"])).is_err());
        assert!(ChangeSpec::from_json(&json!({"add": ["mail"]})).is_err());
        assert!(ChangeSpec::from_json(&json!({"add": {"mail": []}})).is_err());
        assert!(ChangeSpec::from_json(&json!({"delete": {"mail": []}})).is_err());
        assert!(ChangeSpec::from_json(&json!({"add": {"uidNumber": 5}})).is_err());
        assert!(ChangeSpec::from_json(&json!({"replace": {"description": []}})).is_ok());
    }

    #[test]
    fn rejected_change_from_openldap_diagnostic() {
        let changes = build(
            &ChangeSpec::new()
                .delete_values("gecos", ["nobody"])
                .add("gecos", ["Somebody"])
                .add("mail", ["a@example.com"]),
        )
        .unwrap();

        let rejected = identify_rejected(&changes, "modify/delete: gecos: no such value").unwrap();
        assert_eq!(rejected.index, 0);
        assert_eq!(rejected.operation, "delete");
        assert_eq!(rejected.attribute, "gecos");

        let rejected = identify_rejected(&changes, "modify/add: gecos: value #0 already exists").unwrap();
        assert_eq!(rejected.index, 1);

        assert!(identify_rejected(&changes, "insufficient access").is_none());
    }
}
