//! Assertion primitives for resource validation.
//!
//! Validators compose these in a fixed order and stop at the first failure.

use crate::error::{ErrorKind, IssueClass, ValidationError, ValidationResult};

/// Fails with `BAD_REQUEST` when `present` is false.
pub fn assert_mandatory(present: bool, message: impl Into<String>) -> ValidationResult<()> {
    assert_mandatory_as(present, message, ErrorKind::BadRequest)
}

/// Fails with `kind` when `present` is false.
///
/// The issue class is always `Invalid`, whatever the kind's default class is.
pub fn assert_mandatory_as(
    present: bool,
    message: impl Into<String>,
    kind: ErrorKind,
) -> ValidationResult<()> {
    if present {
        Ok(())
    } else {
        Err(ValidationError::with_issue_class(
            kind,
            message,
            IssueClass::Invalid,
        ))
    }
}

/// Fails with `INVALID_RESOURCE` when a disallowed field is present.
pub fn assert_disallowed(present: bool, field_name: &str) -> ValidationResult<()> {
    if present {
        Err(ValidationError::with_issue_class(
            ErrorKind::InvalidResource,
            format!("Not allowed field: {field_name}"),
            IssueClass::Invalid,
        ))
    } else {
        Ok(())
    }
}
