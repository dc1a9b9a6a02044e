//! # Carelink Core
//!
//! Core business logic for exposing patient records in the Care Connect (FHIR STU3) format.
//!
//! This crate contains:
//! - the flat internal [`PatientRecord`] and the storage collaborator traits it lives behind
//! - the mapping service that projects records onto wire resources and back
//! - validation of identifier search parameters and of inbound registrations
//! - the coded error model rendered as an OperationOutcome
//!
//! **No transport concerns**: HTTP routing and persistence mechanics are out of scope. Wire
//! formats live in the `fhir` crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod identifier;
pub mod mapping;
pub mod record;
pub mod registration;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use error::{
    ensure_found, CoreError, CoreResult, ErrorKind, IssueClass, ValidationError,
    ValidationResult,
};
pub use identifier::{IdentifierQueryValidator, IdentifierSearchPolicy, IdentifierToken};
pub use mapping::{
    default_registry, PatientFieldMapper, PatientMappingService, ResourceMapper, ResourceMappers,
};
pub use record::PatientRecord;
pub use registration::{MutationMode, PatientRegistrationValidator, RegistrationService};
pub use store::{
    IdentifierType, IdentifierTypeDirectory, InMemoryRecordStore, KnownIdentifierTypes,
    RecordStore, StoreError,
};

// Re-export the validated primitives so callers need only depend on this crate
pub use carelink_types::{NhsNumber, NonEmptyText, TextError};
pub use carelink_uuid::RecordId;
