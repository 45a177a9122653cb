//! Typed model, validation and canonical normalization for IAM-style policies.
//!
//! This crate provides:
//! - Structural validation of decoded policy trees with field-path errors
//! - A typed policy model where either/or field pairs are unrepresentable twice
//! - Deterministic normalization, so equivalent policies compare equal
//!
//! It is **pure**: no I/O, no shared mutable state. Decoding policy text is
//! left to the caller; any serde decoder producing a [`serde_json::Value`]
//! will do.
//!
//! # Example
//!
//! ```rust
//! use iam_policy::Policy;
//! use serde_json::json;
//!
//! let a = Policy::from_value(&json!({
//!     "Statement": {"Effect": "Allow", "Action": "S3:GetObject", "Resource": "*", "Principal": "*"}
//! }))?;
//! let b = Policy::from_value(&json!({
//!     "Statement": [{"Effect": "Allow", "Action": ["s3:getobject"], "Resource": ["*"], "Principal": {"AWS": "*"}}]
//! }))?;
//!
//! assert!(a.is_equivalent(&b));
//! # Ok::<(), iam_policy::Error>(())
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod document;
pub mod error;
pub mod model;
pub mod normalize;
pub mod types;
pub mod validate;

pub use error::{Error, Exclusivity, Result};
pub use model::{
    Actions, Condition, NormalizedCondition, NormalizedPolicy, NormalizedPrincipal,
    NormalizedStatement, Policy, Principal, PrincipalSpec, Resources, Statement, StatementList,
};
pub use normalize::Normalize;
pub use types::{
    ConditionOperator, ConditionValue, Effect, ScalarOrList, StringOrList, UnknownTag, Version,
};
pub use validate::{UnknownFields, ValidationOptions, Validator};
