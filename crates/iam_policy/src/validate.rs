//! Structural validation of decoded policy trees.
//!
//! The validator turns a generic [`serde_json::Value`] into the typed model.
//! Each entity is checked by an ordered list of independent rule functions
//! (field set, required fields, either/or pairs) before its fields are
//! converted one by one. The first violation aborts construction; no
//! partially-built value is ever returned.
//!
//! A JSON `null` is treated the same as an absent field.

use crate::error::{Error, Exclusivity, Result};
use crate::model::{
    Actions, Condition, Policy, Principal, PrincipalSpec, Resources, Statement, StatementList,
};
use crate::types::{ConditionOperator, ConditionValue, ScalarOrList, StringOrList};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

type Object = Map<String, Value>;

/// A structural rule over one raw object. `path` locates the object.
type Rule = fn(&Object, &str) -> Result<()>;

const POLICY_FIELDS: &[&str] = &["Id", "Version", "Statement"];

const STATEMENT_FIELDS: &[&str] = &[
    "Sid",
    "Effect",
    "Action",
    "NotAction",
    "Resource",
    "NotResource",
    "Principal",
    "Condition",
];

const PRINCIPAL_FIELDS: &[&str] = &["AWS", "Federated", "Service", "CanonicalUser"];

const POLICY_RULES: &[Rule] = &[require_statement];

const STATEMENT_RULES: &[Rule] = &[
    require_effect,
    action_xor_not_action,
    resource_xor_not_resource,
];

const STRING_OR_LIST: &str = "string or list of strings";

/// What to do with fields outside the policy grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFields {
    /// Fail with [`Error::UnknownField`] (default).
    #[default]
    Reject,
    /// Drop them silently.
    Ignore,
}

/// Validation options.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Handling of unrecognised fields.
    pub unknown_fields: UnknownFields,
    /// Accept a principal object that names no principal kind at all.
    pub allow_empty_principal: bool,
}

/// Structural validator for policies, statements and principals.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    /// Creates a validator with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator with the given options.
    #[must_use]
    pub const fn with_options(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Returns the active options.
    pub const fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validates a raw policy tree.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, naming the offending field path.
    pub fn validate_policy(&self, value: &Value) -> Result<Policy> {
        let result = self.policy(value);
        match &result {
            Ok(policy) => debug!(
                statements = policy.statement.as_slice().len(),
                "policy accepted"
            ),
            Err(e) => debug!(error = %e, "policy rejected"),
        }
        result
    }

    /// Validates a raw statement tree on its own.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, naming the offending field path.
    pub fn validate_statement(&self, value: &Value) -> Result<Statement> {
        self.statement(value, "")
    }

    /// Validates a raw `Principal` value: `"*"` or a principal object.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, naming the offending field path.
    pub fn validate_principal(&self, value: &Value) -> Result<PrincipalSpec> {
        self.principal(value, "Principal")
    }

    fn policy(&self, value: &Value) -> Result<Policy> {
        let object = expect_object(value, "", "policy object")?;
        self.check_fields(object, "", POLICY_FIELDS)?;
        apply_rules(object, "", POLICY_RULES)?;

        let id = optional_string(object, "Id", "")?;
        let version = present(object, "Version")
            .map(|raw| parse_tag(raw, "Version", "\"2008-10-17\" or \"2012-10-17\""))
            .transpose()?;

        let path = child("", "Statement");
        let statement = match present(object, "Statement") {
            Some(raw @ Value::Object(_)) => {
                StatementList::Single(Box::new(self.statement(raw, &path)?))
            }
            Some(Value::Array(items)) => StatementList::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.statement(item, &index(&path, i)))
                    .collect::<Result<_>>()?,
            ),
            Some(other) => {
                return Err(Error::InvalidType {
                    path,
                    expected: "statement object or list of statement objects",
                    found: kind_of(other),
                })
            }
            None => return Err(Error::MissingField { path }),
        };

        Ok(Policy {
            id,
            version,
            statement,
        })
    }

    fn statement(&self, value: &Value, path: &str) -> Result<Statement> {
        let object = expect_object(value, path, "statement object")?;
        self.check_fields(object, path, STATEMENT_FIELDS)?;
        apply_rules(object, path, STATEMENT_RULES)?;

        let sid = optional_string(object, "Sid", path)?;

        let effect_path = child(path, "Effect");
        let effect = present(object, "Effect")
            .ok_or_else(|| Error::MissingField {
                path: effect_path.clone(),
            })
            .and_then(|raw| parse_tag(raw, &effect_path, "\"Allow\" or \"Deny\""))?;

        // The xor rules above guarantee exactly one side of each pair.
        let actions = match present(object, "Action") {
            Some(raw) => Actions::Action(string_or_list(raw, &child(path, "Action"))?),
            None => Actions::NotAction(required_string_or_list(object, "NotAction", path)?),
        };
        let resources = match present(object, "Resource") {
            Some(raw) => Resources::Resource(string_or_list(raw, &child(path, "Resource"))?),
            None => Resources::NotResource(required_string_or_list(object, "NotResource", path)?),
        };

        let principal = present(object, "Principal")
            .map(|raw| self.principal(raw, &child(path, "Principal")))
            .transpose()?;
        let condition = present(object, "Condition")
            .map(|raw| condition(raw, &child(path, "Condition")))
            .transpose()?;

        Ok(Statement {
            sid,
            effect,
            actions,
            resources,
            principal,
            condition,
        })
    }

    fn principal(&self, value: &Value, path: &str) -> Result<PrincipalSpec> {
        let object = match value {
            Value::String(s) if s == "*" => return Ok(PrincipalSpec::Wildcard),
            Value::String(s) => {
                return Err(Error::InvalidValue {
                    path: path.to_string(),
                    expected: "\"*\" or a principal object",
                    found: format!("\"{s}\""),
                })
            }
            Value::Object(object) => object,
            other => {
                return Err(Error::InvalidType {
                    path: path.to_string(),
                    expected: "\"*\" or a principal object",
                    found: kind_of(other),
                })
            }
        };
        self.check_fields(object, path, PRINCIPAL_FIELDS)?;

        let field = |name: &str| {
            present(object, name)
                .map(|raw| string_or_list(raw, &child(path, name)))
                .transpose()
        };
        let principal = Principal {
            aws: field("AWS")?,
            federated: field("Federated")?,
            service: field("Service")?,
            canonical_user: field("CanonicalUser")?,
        };

        if principal.is_empty() && !self.options.allow_empty_principal {
            return Err(Error::EmptyPrincipal {
                path: path.to_string(),
            });
        }
        Ok(PrincipalSpec::Specified(principal))
    }

    fn check_fields(&self, object: &Object, path: &str, allowed: &[&str]) -> Result<()> {
        if self.options.unknown_fields == UnknownFields::Ignore {
            return Ok(());
        }
        match object.keys().find(|key| !allowed.contains(&key.as_str())) {
            Some(key) => Err(Error::UnknownField {
                path: child(path, key),
            }),
            None => Ok(()),
        }
    }
}

fn apply_rules(object: &Object, path: &str, rules: &[Rule]) -> Result<()> {
    rules.iter().try_for_each(|rule| rule(object, path))
}

fn require_statement(object: &Object, path: &str) -> Result<()> {
    require(object, "Statement", path)
}

fn require_effect(object: &Object, path: &str) -> Result<()> {
    require(object, "Effect", path)
}

fn action_xor_not_action(object: &Object, path: &str) -> Result<()> {
    exactly_one(object, path, "Action", "NotAction")
}

fn resource_xor_not_resource(object: &Object, path: &str) -> Result<()> {
    exactly_one(object, path, "Resource", "NotResource")
}

fn require(object: &Object, name: &str, path: &str) -> Result<()> {
    match present(object, name) {
        Some(_) => Ok(()),
        None => Err(Error::MissingField {
            path: child(path, name),
        }),
    }
}

fn exactly_one(
    object: &Object,
    path: &str,
    first: &'static str,
    second: &'static str,
) -> Result<()> {
    let kind = match (present(object, first), present(object, second)) {
        (Some(_), None) | (None, Some(_)) => return Ok(()),
        (Some(_), Some(_)) => Exclusivity::BothPresent,
        (None, None) => Exclusivity::NeitherPresent,
    };
    Err(Error::Exclusivity {
        path: if path.is_empty() { "Statement".to_string() } else { path.to_string() },
        first,
        second,
        kind,
    })
}

fn condition(value: &Value, path: &str) -> Result<Condition> {
    let operators = expect_object(value, path, "mapping of condition operators")?;
    let mut condition = Condition::new();
    for (operator, keys) in operators {
        if !ConditionOperator::is_known(operator) {
            debug!(operator = %operator, "unrecognised condition operator kept as-is");
        }
        let operator_path = child(path, operator);
        let keys = expect_object(keys, &operator_path, "mapping of condition keys")?;
        let mut entries = BTreeMap::new();
        for (key, raw) in keys {
            let key_path = child(&operator_path, key);
            let values = match raw {
                Value::Array(items) => ScalarOrList::List(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| condition_value(item, &index(&key_path, i)))
                        .collect::<Result<_>>()?,
                ),
                scalar => ScalarOrList::Scalar(condition_value(scalar, &key_path)?),
            };
            entries.insert(key.clone(), values);
        }
        condition.insert(operator.clone(), entries);
    }
    Ok(condition)
}

fn condition_value(value: &Value, path: &str) -> Result<ConditionValue> {
    let scalar = match value {
        Value::String(s) => Some(ConditionValue::String(s.clone())),
        Value::Bool(b) => Some(ConditionValue::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(ConditionValue::Integer)
            .or_else(|| n.as_f64().map(ConditionValue::Float)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    scalar.ok_or_else(|| Error::InvalidType {
        path: path.to_string(),
        expected: "string, integer, float or boolean",
        found: kind_of(value),
    })
}

fn required_string_or_list(object: &Object, name: &str, path: &str) -> Result<StringOrList> {
    let field_path = child(path, name);
    let raw = present(object, name).ok_or_else(|| Error::MissingField {
        path: field_path.clone(),
    })?;
    string_or_list(raw, &field_path)
}

fn string_or_list(value: &Value, path: &str) -> Result<StringOrList> {
    match value {
        Value::String(s) => Ok(ScalarOrList::Scalar(s.clone())),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(Error::InvalidType {
                    path: index(path, i),
                    expected: "string",
                    found: kind_of(other),
                }),
            })
            .collect::<Result<_>>()
            .map(ScalarOrList::List),
        other => Err(Error::InvalidType {
            path: path.to_string(),
            expected: STRING_OR_LIST,
            found: kind_of(other),
        }),
    }
}

fn optional_string(object: &Object, name: &str, path: &str) -> Result<Option<String>> {
    match present(object, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::InvalidType {
            path: child(path, name),
            expected: "string",
            found: kind_of(other),
        }),
    }
}

/// Parses a string drawn from a closed vocabulary.
fn parse_tag<T: std::str::FromStr>(value: &Value, path: &str, expected: &'static str) -> Result<T> {
    match value {
        Value::String(s) => s.parse().map_err(|_| Error::InvalidValue {
            path: path.to_string(),
            expected,
            found: format!("\"{s}\""),
        }),
        other => Err(Error::InvalidType {
            path: path.to_string(),
            expected: "string",
            found: kind_of(other),
        }),
    }
}

fn expect_object<'a>(value: &'a Value, path: &str, expected: &'static str) -> Result<&'a Object> {
    value.as_object().ok_or_else(|| Error::InvalidType {
        path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
        expected,
        found: kind_of(value),
    })
}

fn present<'a>(object: &'a Object, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|value| !value.is_null())
}

fn child(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{path}[{i}]")
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
