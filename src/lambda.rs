//! Opaque lambda expressions.
//!
//! The script front-end hands the pipeline predicate and value-producing
//! expressions as an already-parsed AST. The pipeline core never evaluates
//! or rewrites them; it only stores them on node configurations and round
//! trips them through the wire format. On the wire a lambda is a nested
//! object carrying its own discriminator:
//!
//! ```json
//! { "typeOf": "lambda", "expression": "\"value\" > 90" }
//! ```
//!
//! Unset optional lambdas encode as `null`; the decoder treats missing or
//! `null` as unset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque expression carried through node configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lambda {
    /// Wire discriminator, always `"lambda"`.
    #[serde(rename = "typeOf", default = "lambda_tag")]
    type_of: String,
    /// The expression source text.
    pub expression: String,
}

fn lambda_tag() -> String {
    "lambda".to_string()
}

impl Default for Lambda {
    fn default() -> Self {
        Lambda::new("")
    }
}

impl Lambda {
    /// Wrap an expression.
    pub fn new(expression: impl Into<String>) -> Self {
        Lambda {
            type_of: lambda_tag(),
            expression: expression.into(),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl From<&str> for Lambda {
    fn from(expression: &str) -> Self {
        Lambda::new(expression)
    }
}
