//! OperationOutcome wire model used for error responses.

use crate::datatypes::{CodeableValue, Coding, Meta};
use serde::{Deserialize, Serialize};

/// Profile declared on every error outcome.
pub const OPERATION_OUTCOME_PROFILE: &str =
    "https://fhir.nhs.uk/STU3/StructureDefinition/GPConnect-OperationOutcome-1";

/// FHIR issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// FHIR issue type (the subset Carelink raises).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    /// Serialised as `value`.
    Value,
    NotFound,
    Duplicate,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,

    pub code: IssueType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CodeableValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

/// Minimal OperationOutcome carrying coded issues.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    /// A single error issue with a coded detail and free-text diagnostics.
    pub fn error(code: IssueType, details: Coding, diagnostics: impl Into<String>) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            meta: Some(Meta {
                profile: vec![OPERATION_OUTCOME_PROFILE.to_string()],
                ..Meta::default()
            }),
            issue: vec![OperationOutcomeIssue {
                severity: IssueSeverity::Error,
                code,
                details: Some(CodeableValue::single(details)),
                diagnostics: Some(diagnostics.into()),
            }],
        }
    }
}
