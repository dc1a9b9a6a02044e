//! Identifier search parameter validation.
//!
//! An identifier search parameter has the form `system|value` and may be supplied exactly
//! once. [`IdentifierQueryValidator`] checks the raw parameter list and turns the single
//! token into an [`IdentifierToken`], failing on the first violation.

use crate::error::{ErrorKind, ValidationError, ValidationResult};
use crate::store::IdentifierTypeDirectory;
use std::fmt;
use std::sync::Arc;

/// Separator between the system and value halves of a token.
pub const IDENTIFIER_SEPARATOR: char = '|';

/// A parsed `system|value` identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdentifierToken {
    pub system: String,
    pub value: String,
}

impl fmt::Display for IdentifierToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.system, IDENTIFIER_SEPARATOR, self.value)
    }
}

/// Caller-specific error policy.
///
/// Patient search and practitioner search report a token with too many separators under
/// different error kinds; each caller builds its validator with its own policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifierSearchPolicy {
    pub extra_separator_kind: ErrorKind,
}

impl IdentifierSearchPolicy {
    pub const PATIENT_SEARCH: Self = Self {
        extra_separator_kind: ErrorKind::InvalidIdentifierValue,
    };

    pub const PRACTITIONER_SEARCH: Self = Self {
        extra_separator_kind: ErrorKind::InvalidParameter,
    };
}

/// Validates raw `identifier` search parameters.
#[derive(Clone)]
pub struct IdentifierQueryValidator {
    policy: IdentifierSearchPolicy,
    directory: Arc<dyn IdentifierTypeDirectory + Send + Sync>,
}

impl IdentifierQueryValidator {
    pub fn new(
        policy: IdentifierSearchPolicy,
        directory: Arc<dyn IdentifierTypeDirectory + Send + Sync>,
    ) -> Self {
        Self { policy, directory }
    }

    pub fn for_patient_search(directory: Arc<dyn IdentifierTypeDirectory + Send + Sync>) -> Self {
        Self::new(IdentifierSearchPolicy::PATIENT_SEARCH, directory)
    }

    pub fn for_practitioner_search(
        directory: Arc<dyn IdentifierTypeDirectory + Send + Sync>,
    ) -> Self {
        Self::new(IdentifierSearchPolicy::PRACTITIONER_SEARCH, directory)
    }

    pub fn policy(&self) -> IdentifierSearchPolicy {
        self.policy
    }

    /// Requires exactly one raw token.
    pub fn validate_cardinality<S: AsRef<str>>(&self, raw_tokens: &[S]) -> ValidationResult<()> {
        if raw_tokens.len() != 1 {
            return Err(ValidationError::new(
                ErrorKind::BadRequest,
                "Exactly 1 identifier needs to be provided",
            ));
        }
        Ok(())
    }

    /// Parses one raw `system|value` token.
    pub fn parse_single(&self, raw: &str) -> ValidationResult<IdentifierToken> {
        let segments: Vec<&str> = raw.split(IDENTIFIER_SEPARATOR).collect();

        let (system, value) = match segments.as_slice() {
            [piece] => {
                return Err(ValidationError::new(
                    ErrorKind::InvalidParameter,
                    format!(
                        "One or both of the identifier system and value are missing from given identifier : {piece}"
                    ),
                ));
            }
            [system, value] => (*system, *value),
            _ => {
                return Err(ValidationError::new(
                    self.policy.extra_separator_kind,
                    format!("Invalid identifier parameter, more than one separator found: {raw}"),
                ));
            }
        };

        if system.is_empty() || value.is_empty() {
            return Err(ValidationError::new(
                ErrorKind::InvalidParameter,
                format!(
                    "One or both of the identifier system and value are missing from given identifier : {system}|{value}"
                ),
            ));
        }

        if value.contains(',') {
            return Err(ValidationError::new(
                ErrorKind::BadRequest,
                "Multiple values detected for non-repeatable parameter 'identifier'. \
                 This server is not configured to allow multiple (AND/OR) values for this param.",
            ));
        }

        if self.directory.lookup_identifier_type(system).is_none() {
            return Err(ValidationError::new(
                ErrorKind::InvalidIdentifierSystem,
                format!("The given identifier system code ({system}) is not an expected code"),
            ));
        }

        Ok(IdentifierToken {
            system: system.to_string(),
            value: value.to_string(),
        })
    }

    /// Cardinality check followed by parsing of the single token.
    pub fn validate<S: AsRef<str>>(&self, raw_tokens: &[S]) -> ValidationResult<IdentifierToken> {
        self.validate_cardinality(raw_tokens)?;
        self.parse_single(raw_tokens[0].as_ref())
    }
}
