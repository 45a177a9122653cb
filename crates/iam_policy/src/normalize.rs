//! Canonical normalization.
//!
//! Normalization is a total function over validated values:
//! - every "string or list" field becomes a list sorted by code point
//! - `Action` and `NotAction` entries are lower-cased before sorting
//! - the `"*"` principal becomes `{"AWS": ["*"]}`
//! - condition keys are lower-cased and condition values become lists of
//!   strings in their authored order
//!
//! Absent fields stay absent.

use crate::model::{
    Actions, Condition, NormalizedCondition, NormalizedPolicy, NormalizedPrincipal,
    NormalizedStatement, Policy, Principal, PrincipalSpec, Resources, Statement,
};
use crate::types::{ConditionValue, StringOrList};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Conversion of a validated value into its canonical counterpart.
pub trait Normalize {
    /// The canonical type.
    type Output;

    /// Produces the canonical form. Never fails.
    fn normalize(&self) -> Self::Output;
}

impl Normalize for Policy {
    type Output = NormalizedPolicy;

    fn normalize(&self) -> NormalizedPolicy {
        NormalizedPolicy {
            id: self.id.clone(),
            version: self.version,
            statement: self
                .statement
                .as_slice()
                .iter()
                .map(Normalize::normalize)
                .collect(),
        }
    }
}

impl Normalize for Statement {
    type Output = NormalizedStatement;

    fn normalize(&self) -> NormalizedStatement {
        let actions = match &self.actions {
            Actions::Action(actions) => Actions::Action(lowercase_sorted(actions)),
            Actions::NotAction(actions) => Actions::NotAction(lowercase_sorted(actions)),
        };
        let resources = match &self.resources {
            Resources::Resource(resources) => Resources::Resource(sorted(resources)),
            Resources::NotResource(resources) => Resources::NotResource(sorted(resources)),
        };

        trace!(sid = ?self.sid, "normalized statement");
        NormalizedStatement {
            sid: self.sid.clone(),
            effect: self.effect,
            actions,
            resources,
            principal: self.principal.as_ref().map(Normalize::normalize),
            condition: self.condition.as_ref().map(Normalize::normalize),
        }
    }
}

impl Normalize for PrincipalSpec {
    type Output = NormalizedPrincipal;

    fn normalize(&self) -> NormalizedPrincipal {
        match self {
            Self::Wildcard => NormalizedPrincipal {
                aws: Some(vec!["*".to_string()]),
                ..NormalizedPrincipal::default()
            },
            Self::Specified(principal) => principal.normalize(),
        }
    }
}

impl Normalize for Principal {
    type Output = NormalizedPrincipal;

    fn normalize(&self) -> NormalizedPrincipal {
        NormalizedPrincipal {
            aws: self.aws.as_ref().map(sorted),
            federated: self.federated.as_ref().map(sorted),
            service: self.service.as_ref().map(sorted),
            canonical_user: self.canonical_user.as_ref().map(sorted),
        }
    }
}

impl Normalize for Condition {
    type Output = NormalizedCondition;

    fn normalize(&self) -> NormalizedCondition {
        self.iter()
            .map(|(operator, keys)| {
                let mut normalized = BTreeMap::new();
                for (key, values) in keys {
                    let rendered: Vec<String> =
                        values.as_slice().iter().map(ConditionValue::render).collect();
                    let lowered = key.to_lowercase();
                    if normalized.insert(lowered, rendered).is_some() {
                        warn!(
                            operator = %operator,
                            key = %key,
                            "condition keys collide after lower-casing, keeping the last one"
                        );
                    }
                }
                (operator.clone(), normalized)
            })
            .collect()
    }
}

fn sorted(values: &StringOrList) -> Vec<String> {
    let mut list = values.as_slice().to_vec();
    list.sort();
    list
}

fn lowercase_sorted(values: &StringOrList) -> Vec<String> {
    let mut list: Vec<String> = values.as_slice().iter().map(|v| v.to_lowercase()).collect();
    list.sort();
    list
}
