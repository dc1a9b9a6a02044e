//! Error model.
//!
//! Validation failures are [`ValidationError`]s: a closed [`ErrorKind`], a message and an
//! [`IssueClass`]. They are raised at the point of detection and rendered as an
//! OperationOutcome by the resource layer. Everything else (storage failures, wire parse
//! failures, bad configuration) is a [`CoreError`] variant of its own.

use crate::constants::ERROR_CODE_SYSTEM;
use crate::store::StoreError;
use fhir::{Coding, IssueType, OperationOutcome, ResourceType};
use std::fmt;

/// Coded error taxonomy, as published in the Spine error-or-warning code system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    InvalidParameter,
    InvalidResource,
    InvalidIdentifierSystem,
    InvalidIdentifierValue,
    InvalidNhsNumber,
    PatientNotFound,
    PractitionerNotFound,
    OrganisationNotFound,
    LocationNotFound,
    DuplicateRejected,
}

/// Class of a wire-level issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueClass {
    Invalid,
    ValueInvalid,
    NotFound,
    Duplicate,
}

impl ErrorKind {
    /// Code in the Spine error-or-warning code system.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::InvalidParameter => "INVALID_PARAMETER",
            ErrorKind::InvalidResource => "INVALID_RESOURCE",
            ErrorKind::InvalidIdentifierSystem => "INVALID_IDENTIFIER_SYSTEM",
            ErrorKind::InvalidIdentifierValue => "INVALID_IDENTIFIER_VALUE",
            ErrorKind::InvalidNhsNumber => "INVALID_NHS_NUMBER",
            ErrorKind::PatientNotFound => "PATIENT_NOT_FOUND",
            ErrorKind::PractitionerNotFound => "PRACTITIONER_NOT_FOUND",
            ErrorKind::OrganisationNotFound => "ORGANISATION_NOT_FOUND",
            ErrorKind::LocationNotFound => "LOCATION_NOT_FOUND",
            ErrorKind::DuplicateRejected => "DUPLICATE_REJECTED",
        }
    }

    /// Display text for the code.
    pub fn display(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::InvalidParameter => "Submitted parameter is not valid.",
            ErrorKind::InvalidResource => "Submitted resource is not valid.",
            ErrorKind::InvalidIdentifierSystem => "Invalid identifier system",
            ErrorKind::InvalidIdentifierValue => "Invalid identifier value",
            ErrorKind::InvalidNhsNumber => "Invalid NHS number",
            ErrorKind::PatientNotFound => "Patient not found",
            ErrorKind::PractitionerNotFound => "Practitioner not found",
            ErrorKind::OrganisationNotFound => "Organisation record not found",
            ErrorKind::LocationNotFound => "Location record not found",
            ErrorKind::DuplicateRejected => "Create would lead to creation of a duplicate resource",
        }
    }

    /// The issue class this kind is reported with unless overridden.
    pub fn issue_class(self) -> IssueClass {
        match self {
            ErrorKind::BadRequest | ErrorKind::InvalidParameter | ErrorKind::InvalidResource => {
                IssueClass::Invalid
            }
            ErrorKind::InvalidIdentifierSystem
            | ErrorKind::InvalidIdentifierValue
            | ErrorKind::InvalidNhsNumber => IssueClass::ValueInvalid,
            ErrorKind::PatientNotFound
            | ErrorKind::PractitionerNotFound
            | ErrorKind::OrganisationNotFound
            | ErrorKind::LocationNotFound => IssueClass::NotFound,
            ErrorKind::DuplicateRejected => IssueClass::Duplicate,
        }
    }

    /// The not-found kind for a resource type.
    pub fn not_found(resource_type: ResourceType) -> Self {
        match resource_type {
            ResourceType::Patient => ErrorKind::PatientNotFound,
            ResourceType::Practitioner => ErrorKind::PractitionerNotFound,
            ResourceType::Organization => ErrorKind::OrganisationNotFound,
            ResourceType::Location => ErrorKind::LocationNotFound,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl IssueClass {
    pub fn issue_type(self) -> IssueType {
        match self {
            IssueClass::Invalid => IssueType::Invalid,
            IssueClass::ValueInvalid => IssueType::Value,
            IssueClass::NotFound => IssueType::NotFound,
            IssueClass::Duplicate => IssueType::Duplicate,
        }
    }
}

/// A single validation failure. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    kind: ErrorKind,
    message: String,
    issue_class: IssueClass,
}

impl ValidationError {
    /// Builds an error reported with the kind's default issue class.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            issue_class: kind.issue_class(),
        }
    }

    /// Builds an error with an explicit issue class.
    pub fn with_issue_class(
        kind: ErrorKind,
        message: impl Into<String>,
        issue_class: IssueClass,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            issue_class,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn issue_class(&self) -> IssueClass {
        self.issue_class
    }

    /// Renders this error as a wire-level OperationOutcome.
    pub fn to_operation_outcome(&self) -> OperationOutcome {
        OperationOutcome::error(
            self.issue_class.issue_type(),
            Coding::new(ERROR_CODE_SYSTEM, self.kind.code(), Some(self.kind.display())),
            self.message.clone(),
        )
    }
}

/// Result type for validation-only operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Unwraps a lookup result, raising the resource type's not-found error when it is empty.
pub fn ensure_found<T>(
    resource_type: ResourceType,
    id: &str,
    found: Option<T>,
) -> ValidationResult<T> {
    found.ok_or_else(|| {
        ValidationError::new(
            ErrorKind::not_found(resource_type),
            format!("No {resource_type} record found for id: {id}"),
        )
    })
}

/// Errors returned by the core services.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// The validation failure inside this error, if that is what it is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            CoreError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
