//! Expectation language - token parsing, matching, and reporting

mod matcher;
mod report;
mod token;

pub use matcher::{Matcher, Mismatch};
pub use report::{FieldMismatch, Report};
pub use token::{Expected, TimeUnit, TokenError};
