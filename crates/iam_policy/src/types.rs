//! Closed vocabularies and scalar kinds shared by the policy model.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a string is not a member of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised value '{0}'")]
pub struct UnknownTag(pub String);

/// Effect of a policy statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Effect {
    /// Grant the described access.
    Allow,
    /// Deny the described access.
    Deny,
}

impl Effect {
    /// Every recognised effect.
    pub const ALL: [Self; 2] = [Self::Allow, Self::Deny];

    /// Returns the literal tag used in policy documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl FromStr for Effect {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|effect| effect.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy language version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Version {
    /// The legacy `2008-10-17` language.
    #[serde(rename = "2008-10-17")]
    V2008_10_17,
    /// The current `2012-10-17` language.
    #[serde(rename = "2012-10-17")]
    V2012_10_17,
}

impl Version {
    /// Every supported version tag.
    pub const ALL: [Self; 2] = [Self::V2008_10_17, Self::V2012_10_17];

    /// Returns the literal tag used in policy documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2008_10_17 => "2008-10-17",
            Self::V2012_10_17 => "2012-10-17",
        }
    }
}

impl FromStr for Version {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! condition_operators {
    ($($name:ident),+ $(,)?) => {
        /// Recognised condition operator names.
        ///
        /// Operators are hints only: a condition block keyed by an operator
        /// outside this set is still accepted and kept verbatim.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(missing_docs)]
        pub enum ConditionOperator {
            $($name,)+
        }

        impl ConditionOperator {
            /// Every recognised operator, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$name,)+];

            /// Returns the operator name as written in policy documents.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)+
                }
            }
        }
    };
}

condition_operators! {
    StringEquals,
    StringEqualsIfExists,
    StringNotEquals,
    StringNotEqualsIfExists,
    StringEqualsIgnoreCase,
    StringEqualsIgnoreCaseIfExists,
    StringNotEqualsIgnoreCase,
    StringNotEqualsIgnoreCaseIfExists,
    StringLike,
    StringLikeIfExists,
    StringNotLike,
    StringNotLikeIfExists,
    NumericEquals,
    NumericEqualsIfExists,
    NumericNotEquals,
    NumericNotEqualsIfExists,
    NumericLessThan,
    NumericLessThanIfExists,
    NumericLessThanEquals,
    NumericLessThanEqualsIfExists,
    NumericGreaterThan,
    NumericGreaterThanIfExists,
    NumericGreaterThanEquals,
    NumericGreaterThanEqualsIfExists,
    DateEquals,
    DateEqualsIfExists,
    DateNotEquals,
    DateNotEqualsIfExists,
    DateLessThan,
    DateLessThanIfExists,
    DateLessThanEquals,
    DateLessThanEqualsIfExists,
    DateGreaterThan,
    DateGreaterThanIfExists,
    DateGreaterThanEquals,
    DateGreaterThanEqualsIfExists,
    Bool,
    BoolIfExists,
    BinaryEquals,
    BinaryEqualsIfExists,
    IpAddress,
    IpAddressIfExists,
    NotIpAddress,
    NotIpAddressIfExists,
    ArnEquals,
    ArnEqualsIfExists,
    ArnLike,
    ArnLikeIfExists,
    ArnNotEquals,
    ArnNotEqualsIfExists,
    ArnNotLike,
    ArnNotLikeIfExists,
    Null,
}

impl ConditionOperator {
    /// Returns true if `name` is a recognised operator (case-sensitive).
    pub fn is_known(name: &str) -> bool {
        name.parse::<Self>().is_ok()
    }
}

impl FromStr for ConditionOperator {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar accepted inside a condition block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// String scalar.
    String(String),
    /// Integer scalar, wide enough for any signed or unsigned 64-bit JSON integer.
    Integer(i128),
    /// Floating point scalar.
    Float(f64),
    /// Boolean scalar.
    Boolean(bool),
}

impl ConditionValue {
    /// Renders the value as canonical text.
    ///
    /// Strings pass through unchanged; other scalars use their JSON encoding,
    /// so `false` becomes `"false"` and `20.15` becomes `"20.15"`.
    pub fn render(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => render_float(*f),
            Self::Boolean(b) => b.to_string(),
        }
    }

    /// Name of the scalar kind, as used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
        }
    }
}

fn render_float(f: f64) -> String {
    // Non-finite values never come out of a decoded document.
    serde_json::Number::from_f64(f).map_or_else(|| f.to_string(), |n| n.to_string())
}

/// A field written either as a bare scalar or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ScalarOrList<T> {
    /// Bare scalar.
    Scalar(T),
    /// Ordered list.
    List(Vec<T>),
}

/// The common "string or list of strings" shape.
pub type StringOrList = ScalarOrList<String>;

impl<T> ScalarOrList<T> {
    /// Views the contents as a slice; a scalar becomes a one-element slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }

    /// Collapses into a list; a scalar becomes a one-element list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::List(values) => values,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true for an empty list.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl From<&str> for StringOrList {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl<T> From<Vec<T>> for ScalarOrList<T> {
    fn from(values: Vec<T>) -> Self {
        Self::List(values)
    }
}
