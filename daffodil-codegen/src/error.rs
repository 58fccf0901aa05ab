//! Errors that abort code generation.
//!
//! Every error here is fatal to the current generation run, and is
//! reproducible: it must be fixed in the producer of the tree or in the
//! tables of the backend, not retried.

use codespan_reporting::diagnostic::Diagnostic;
use std::fmt;

use crate::ir::{BinOp, Prim, Reference};
use crate::BUG_REPORT_URL;

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// The backend has no spelling for a primitive type.
    UnsupportedPrimitive { backend: &'static str, prim: Prim },
    /// The backend has no symbol for an operator.
    UnsupportedOperator { backend: &'static str, op: BinOp },
    /// The backend has no literal for a floating point value, such as NaN.
    UnsupportedFloat { backend: &'static str, value: f64 },
    /// The backend does not know how to render a kind of reference.
    UnsupportedReference {
        backend: &'static str,
        reference: Reference,
    },
    /// A conditional statement with a block count that is neither equal to its
    /// condition count, nor one more than it.
    MalformedConditional {
        conds: usize,
        blocks: usize,
        /// The offending statement, pretty printed.
        node: String,
    },
}

impl GenerateError {
    /// Unsupported constructs indicate a bug in the producer of the tree or in
    /// the backend, so they are reported as such.
    pub fn to_diagnostic<FileId>(&self) -> Diagnostic<FileId> {
        match self {
            GenerateError::UnsupportedPrimitive { backend, .. }
            | GenerateError::UnsupportedOperator { backend, .. }
            | GenerateError::UnsupportedFloat { backend, .. }
            | GenerateError::UnsupportedReference { backend, .. } => Diagnostic::bug()
                .with_message(self.to_string())
                .with_notes(vec![
                    format!("the `{backend}` backend has no rendering for this construct"),
                    format!("please file a bug report at: {BUG_REPORT_URL}"),
                ]),
            GenerateError::MalformedConditional { node, .. } => Diagnostic::error()
                .with_message(self.to_string())
                .with_notes(vec![
                    "a conditional needs one block per condition, and at most one trailing \
                     `else` block"
                        .to_owned(),
                    format!("offending statement: {node}"),
                ]),
        }
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::UnsupportedPrimitive { backend, prim } => {
                write!(f, "the primitive type `{prim}` is not supported by `{backend}`")
            }
            GenerateError::UnsupportedOperator { backend, op } => {
                write!(f, "the operator `{op}` is not supported by `{backend}`")
            }
            GenerateError::UnsupportedFloat { backend, value } => {
                write!(f, "the floating point constant `{value}` is not supported by `{backend}`")
            }
            GenerateError::UnsupportedReference { backend, reference } => {
                write!(f, "the reference {reference} is not supported by `{backend}`")
            }
            GenerateError::MalformedConditional { conds, blocks, .. } => write!(
                f,
                "malformed conditional with {conds} condition(s) and {blocks} block(s)",
            ),
        }
    }
}

impl std::error::Error for GenerateError {}
