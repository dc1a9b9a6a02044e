//! FHIR wire/boundary support for Carelink.
//!
//! This crate provides **wire models** and **translation helpers** for the Care Connect
//! (FHIR STU3) resources Carelink exposes:
//! - JSON wire models for Patient and the datatypes it carries (extensions, codings,
//!   periods, references, identifiers, contact points, addresses, names)
//! - closed value sets for the coded Care Connect extensions
//! - field codecs that encode a record primitive into an extension and back
//! - the OperationOutcome wire model used for error responses
//!
//! Clinical meaning (which record field maps to which extension, what a valid registration
//! looks like) lives in `carelink-core`. This crate handles formats and standards alignment
//! only.

pub mod codec;
pub mod datatypes;
pub mod outcome;
pub mod patient;
pub mod resource_type;
pub mod valueset;

// Re-export facades
pub use patient::Patient;

// Re-export public wire types
pub use codec::{
    BooleanFieldCodec, CodedConceptFieldCodec, CompositeRegistrationCodec, FieldCodec,
    RegistrationDetails,
};
pub use datatypes::{
    Address, AddressUse, CodeableValue, Coding, ContactPoint, ContactPointSystem,
    ContactPointUse, Extension, ExtensionValue, HumanName, Identifier, Meta, NameUse, Period,
    Reference,
};
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use patient::PatientResource;
pub use resource_type::ResourceType;
pub use valueset::ValueSet;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
