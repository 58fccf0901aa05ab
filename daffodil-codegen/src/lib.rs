//! Source code generation from a language-agnostic program representation.
//!
//! Trees of the [intermediate representation][ir] are passed through
//! [import resolution][pass::resolve_imports], packaged into files, and
//! lowered to source text by a [backend][backend::Backend]. The
//! [`generate::Generator`] drives the whole pipeline.

pub mod backend;
pub mod driver;
pub mod error;
pub mod generate;
pub mod ir;
pub mod pass;
pub mod writer;

// Public exports
pub use driver::{Driver, Status};

const BUG_REPORT_URL: &str = "https://issues.apache.org/jira/projects/DAFFODIL";
