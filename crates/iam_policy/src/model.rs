//! Typed policy model.
//!
//! Two families of types live here. `Policy`, `Statement`, `Principal` and
//! `Condition` are validated, as-authored values: they remember whether a field
//! was written as a bare scalar or as a list. The `Normalized*` types are the
//! canonical counterparts produced by [`crate::normalize`], where every list is
//! sorted and every scalar has been lifted into a list.
//!
//! Either/or field pairs are modelled as enums, so a statement carrying both
//! `Action` and `NotAction` (or neither) cannot be represented.

use crate::types::{ConditionValue, Effect, ScalarOrList, StringOrList, Version};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// A validated policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", try_from = "serde_json::Value")]
pub struct Policy {
    /// Optional policy identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Optional policy language version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// The statement or statements of the policy.
    pub statement: StatementList,
}

/// The `Statement` field: one bare statement or an ordered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatementList {
    /// A bare statement object.
    Single(Box<Statement>),
    /// A list of statements, possibly empty.
    List(Vec<Statement>),
}

impl StatementList {
    /// Views the statements as a slice.
    pub fn as_slice(&self) -> &[Statement] {
        match self {
            Self::Single(statement) => std::slice::from_ref(statement.as_ref()),
            Self::List(statements) => statements,
        }
    }
}

/// `Action` or `NotAction`, exactly one of which a statement carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Actions<T> {
    /// Actions the statement applies to.
    Action(T),
    /// Actions the statement applies to all except.
    NotAction(T),
}

impl<T> Actions<T> {
    /// The action patterns regardless of polarity.
    pub const fn patterns(&self) -> &T {
        match self {
            Self::Action(patterns) | Self::NotAction(patterns) => patterns,
        }
    }
}

/// `Resource` or `NotResource`, exactly one of which a statement carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Resources<T> {
    /// Resources the statement applies to.
    Resource(T),
    /// Resources the statement applies to all except.
    NotResource(T),
}

impl<T> Resources<T> {
    /// The resource patterns regardless of polarity.
    pub const fn patterns(&self) -> &T {
        match self {
            Self::Resource(patterns) | Self::NotResource(patterns) => patterns,
        }
    }
}

/// Condition block: operator name, then condition key, then one or more scalars.
pub type Condition = BTreeMap<String, BTreeMap<String, ScalarOrList<ConditionValue>>>;

/// A validated statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Optional statement label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Allow or deny.
    pub effect: Effect,
    /// `Action` or `NotAction`.
    #[serde(flatten)]
    pub actions: Actions<StringOrList>,
    /// `Resource` or `NotResource`.
    #[serde(flatten)]
    pub resources: Resources<StringOrList>,
    /// Optional principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<PrincipalSpec>,
    /// Optional condition block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// The `Principal` field: the `"*"` wildcard or a principal object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalSpec {
    /// Everyone.
    Wildcard,
    /// Explicit principals.
    Specified(Principal),
}

impl Serialize for PrincipalSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Wildcard => serializer.serialize_str("*"),
            Self::Specified(principal) => principal.serialize(serializer),
        }
    }
}

/// A principal object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    /// AWS accounts, users and roles.
    #[serde(rename = "AWS", skip_serializing_if = "Option::is_none")]
    pub aws: Option<StringOrList>,
    /// Federated identity providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federated: Option<StringOrList>,
    /// Service principals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<StringOrList>,
    /// Canonical user ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_user: Option<StringOrList>,
}

impl Principal {
    /// Returns true if none of the four principal kinds is present.
    pub const fn is_empty(&self) -> bool {
        self.aws.is_none()
            && self.federated.is_none()
            && self.service.is_none()
            && self.canonical_user.is_none()
    }
}

/// Canonical policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NormalizedPolicy {
    /// Policy identifier, unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Version tag, unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Statements, always a list.
    pub statement: Vec<NormalizedStatement>,
}

/// Canonical statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NormalizedStatement {
    /// Statement label, unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Allow or deny.
    pub effect: Effect,
    /// Lower-cased, sorted actions.
    #[serde(flatten)]
    pub actions: Actions<Vec<String>>,
    /// Sorted resources.
    #[serde(flatten)]
    pub resources: Resources<Vec<String>>,
    /// Principal with every present field as a sorted list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<NormalizedPrincipal>,
    /// Condition with lower-cased keys and textual values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<NormalizedCondition>,
}

/// Canonical principal. The wildcard is spelled `{"AWS": ["*"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NormalizedPrincipal {
    /// AWS accounts, users and roles.
    #[serde(rename = "AWS", skip_serializing_if = "Option::is_none")]
    pub aws: Option<Vec<String>>,
    /// Federated identity providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federated: Option<Vec<String>>,
    /// Service principals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<String>>,
    /// Canonical user ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_user: Option<Vec<String>>,
}

/// Canonical condition block: every value is a list of strings.
pub type NormalizedCondition = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn statement() -> Statement {
        Statement {
            sid: None,
            effect: Effect::Allow,
            actions: Actions::Action("s3:GetObject".into()),
            resources: Resources::NotResource(vec!["arn:aws:s3:::a".to_string()].into()),
            principal: Some(PrincipalSpec::Wildcard),
            condition: None,
        }
    }

    #[test]
    fn statement_serializes_authored_shape() {
        let value = serde_json::to_value(statement()).unwrap();
        assert_eq!(
            value,
            json!({
                "Effect": "Allow",
                "Action": "s3:GetObject",
                "NotResource": ["arn:aws:s3:::a"],
                "Principal": "*",
            })
        );
    }

    #[test]
    fn statement_list_views() {
        let single = StatementList::Single(Box::new(statement()));
        assert_eq!(single.as_slice().len(), 1);
        assert!(StatementList::List(Vec::new()).as_slice().is_empty());
    }

    #[test]
    fn principal_emptiness() {
        assert!(Principal::default().is_empty());
        let principal = Principal {
            service: Some("cloudtrail.amazonaws.com".into()),
            ..Principal::default()
        };
        assert!(!principal.is_empty());
    }
}
