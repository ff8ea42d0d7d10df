//! The closed set of filter operators.
//!
//! Operators appear in query strings as the second bracket group of a
//! filter key, for example `filter[age][gte]=18`. There are the
//! following operators:
//!
//! [`Operator`]                 | Token         | Value shape
//! -----------------------------|---------------|---------------------------
//! [`Eq`](Operator::Eq)         | `eq`          | one value
//! [`Ne`](Operator::Ne)         | `ne`          | one value
//! [`Like`](Operator::Like)     | `like`        | one value, matched anywhere
//! [`NotLike`](Operator::NotLike) | `not-like`  | one value, matched anywhere
//! [`StartsWith`](Operator::StartsWith) | `starts-with` | one value, prefix
//! [`EndsWith`](Operator::EndsWith) | `ends-with` | one value, suffix
//! [`Gt`](Operator::Gt)         | `gt`          | one value
//! [`Gte`](Operator::Gte)       | `gte`         | one value
//! [`Lt`](Operator::Lt)         | `lt`          | one value
//! [`Lte`](Operator::Lte)       | `lte`         | one value
//! [`In`](Operator::In)         | `in`          | comma-separated list
//! [`NotIn`](Operator::NotIn)   | `not-in`      | comma-separated list
//! [`Null`](Operator::Null)     | `null`        | ignored
//! [`NotNull`](Operator::NotNull) | `not-null`  | ignored
//! [`Between`](Operator::Between) | `between`   | exactly two values
//! [`NotBetween`](Operator::NotBetween) | `not-between` | exactly two values
//!
//! Example:
//! ```rust
//! use std::str::FromStr;
//! use query_lens::Operator;
//!
//! assert_eq!(Operator::from_str("not-like").unwrap(), Operator::NotLike);
//! assert_eq!(Operator::StartsWith.to_string(), "starts-with");
//! assert!(Operator::from_str("contains").is_err());
//! ```

use serde::Deserialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// A filter operator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    Eq,
    Ne,
    Like,
    NotLike,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Null,
    NotNull,
    Between,
    NotBetween,
}

/// How an operator expects its right hand side to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// The value is not consulted.
    Ignored,
    /// A single non-empty value.
    Single,
    /// A comma-separated list with at least one entry.
    List,
    /// A comma-separated pair.
    Pair,
}

impl Operator {
    /// Every operator, in registry order.
    pub fn all() -> Vec<Operator> {
        Operator::iter().collect()
    }

    /// The tokens of every operator, in registry order.
    ///
    /// These are offered as suggestions whenever an unknown operator
    /// token turns up.
    pub fn tokens() -> Vec<String> {
        Operator::iter().map(|op| op.to_string()).collect()
    }

    /// Test whether `token` names an operator.
    pub fn is_valid(token: &str) -> bool {
        token.parse::<Operator>().is_ok()
    }

    pub fn value_shape(self) -> ValueShape {
        match self {
            Operator::Null | Operator::NotNull => ValueShape::Ignored,
            Operator::In | Operator::NotIn => ValueShape::List,
            Operator::Between | Operator::NotBetween => ValueShape::Pair,
            Operator::Eq
            | Operator::Ne
            | Operator::Like
            | Operator::NotLike
            | Operator::StartsWith
            | Operator::EndsWith
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte => ValueShape::Single,
        }
    }

    /// Whether this operator is a pattern match, and so subject to
    /// case folding.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::NotLike | Operator::StartsWith | Operator::EndsWith
        )
    }
}
