//! Care Connect Patient wire model and JSON translation helpers.
//!
//! Responsibilities:
//! - Define a strict wire model for the Patient resource
//! - Parse and render Patient JSON, reporting the failing path on schema mismatch
//!
//! Carelink does not interpret narrative, contained resources, photo, contact, animal,
//! communication or link content. Those elements are carried as raw JSON so that presence
//! checks can still be applied to them.

use crate::datatypes::{
    Address, CodeableValue, ContactPoint, Extension, HumanName, Identifier, Meta, Reference,
};
use crate::resource_type::ResourceType;
use crate::{FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire representation of a Patient resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatientResource {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(rename = "implicitRules", skip_serializing_if = "Option::is_none")]
    pub implicit_rules: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Narrative summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(rename = "deceasedBoolean", skip_serializing_if = "Option::is_none")]
    pub deceased_boolean: Option<bool>,

    #[serde(rename = "deceasedDateTime", skip_serializing_if = "Option::is_none")]
    pub deceased_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,

    #[serde(rename = "maritalStatus", skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableValue>,

    #[serde(rename = "multipleBirthBoolean", skip_serializing_if = "Option::is_none")]
    pub multiple_birth_boolean: Option<bool>,

    #[serde(rename = "multipleBirthInteger", skip_serializing_if = "Option::is_none")]
    pub multiple_birth_integer: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub animal: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communication: Vec<Value>,

    #[serde(rename = "generalPractitioner", default, skip_serializing_if = "Vec::is_empty")]
    pub general_practitioner: Vec<Reference>,

    #[serde(rename = "managingOrganization", skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<Value>,
}

impl PatientResource {
    /// An otherwise empty Patient carrying only its logical id.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            resource_type: ResourceType::Patient.as_str().to_string(),
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// True if either `deceased[x]` choice is populated.
    pub fn has_deceased(&self) -> bool {
        self.deceased_boolean.is_some() || self.deceased_date_time.is_some()
    }

    /// True if either `multipleBirth[x]` choice is populated.
    pub fn has_multiple_birth(&self) -> bool {
        self.multiple_birth_boolean.is_some() || self.multiple_birth_integer.is_some()
    }
}

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
pub struct Patient;

impl Patient {
    /// Parse a Patient resource from JSON text.
    ///
    /// Uses `serde_path_to_error` to surface the path (e.g. `telecom[0].use`) of the field that
    /// failed to match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not match the Patient wire schema,
    /// - any unknown keys are present,
    /// - `resourceType` is not `"Patient"`.
    pub fn parse(json_text: &str) -> FhirResult<PatientResource> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let resource: PatientResource = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| schema_mismatch(err.path().to_string(), err.into_inner()))?;

        Self::check_resource_type(resource)
    }

    /// Parse a Patient resource from an already-decoded JSON value.
    pub fn from_value(value: Value) -> FhirResult<PatientResource> {
        let resource: PatientResource = serde_path_to_error::deserialize(value)
            .map_err(|err| schema_mismatch(err.path().to_string(), err.into_inner()))?;

        Self::check_resource_type(resource)
    }

    /// Render a Patient resource as pretty-printed JSON.
    pub fn render(resource: &PatientResource) -> FhirResult<String> {
        serde_json::to_string_pretty(resource)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }

    fn check_resource_type(resource: PatientResource) -> FhirResult<PatientResource> {
        if resource.resource_type != ResourceType::Patient.as_str() {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Patient', got '{}'",
                resource.resource_type
            )));
        }
        Ok(resource)
    }
}

fn schema_mismatch(path: String, source: serde_json::Error) -> FhirError {
    let path = if path.is_empty() || path == "." {
        "<root>".to_string()
    } else {
        path
    };
    FhirError::Translation(format!("Patient schema mismatch at {path}: {source}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{AddressUse, ContactPointSystem, ContactPointUse, NameUse};

    const SAMPLE: &str = r#"{
  "resourceType": "Patient",
  "id": "90a8d1ea318041d9adb070a834d4e0f6",
  "identifier": [
    {
      "system": "https://fhir.nhs.uk/Id/nhs-number",
      "value": "9000000009"
    }
  ],
  "name": [
    { "use": "official", "family": "Williams", "given": ["Sarah", "Jane"] }
  ],
  "telecom": [
    { "system": "phone", "value": "01234 567890", "use": "mobile" }
  ],
  "birthDate": "1992-03-20",
  "address": [
    { "use": "home", "line": ["1 High Street"], "postalCode": "LS1 1AA" }
  ]
}"#;

    #[test]
    fn parses_sample_patient() {
        let patient = Patient::parse(SAMPLE).expect("parse json");
        assert_eq!(patient.id.as_deref(), Some("90a8d1ea318041d9adb070a834d4e0f6"));
        assert_eq!(patient.identifier[0].value.as_deref(), Some("9000000009"));
        assert_eq!(patient.name[0].use_type, Some(NameUse::Official));
        assert_eq!(patient.telecom[0].system, Some(ContactPointSystem::Phone));
        assert_eq!(patient.telecom[0].use_type, Some(ContactPointUse::Mobile));
        assert_eq!(patient.address[0].use_type, Some(AddressUse::Home));
        assert_eq!(patient.birth_date.as_deref(), Some("1992-03-20"));
    }

    #[test]
    fn render_then_parse_is_stable() {
        let patient = Patient::parse(SAMPLE).expect("parse json");
        let rendered = Patient::render(&patient).expect("render");
        let reparsed = Patient::parse(&rendered).expect("reparse");
        assert_eq!(patient, reparsed);
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = r#"{"resourceType": "Patient", "id": "1", "unexpected_key": 1}"#;
        let err = Patient::parse(input).expect_err("should reject unknown key");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("unexpected_key")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn schema_mismatch_reports_path() {
        let input = r#"{"resourceType": "Patient", "telecom": [{"system": "phone", "use": "car"}]}"#;
        let err = Patient::parse(input).expect_err("should reject unknown use");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("telecom[0].use"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_resource_type() {
        let input = r#"{"resourceType": "Practitioner", "id": "1"}"#;
        let err = Patient::parse(input).expect_err("should reject resourceType");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Patient"));
                assert!(msg.contains("Practitioner"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_standard_elements_carelink_does_not_interpret() {
        let input = serde_json::json!({
            "resourceType": "Patient",
            "id": "1",
            "meta": {"tag": [{"code": "test"}]},
            "implicitRules": "http://example.org/rules",
            "language": "en-GB",
            "text": {"status": "generated", "div": "<div>Sarah Williams</div>"},
            "extension": [
                {"url": "ext:recorded", "valueDateTime": "2019-04-01T10:00:00+00:00"}
            ],
            "identifier": [{
                "system": "https://fhir.nhs.uk/Id/nhs-number",
                "value": "9000000009",
                "period": {"start": "2001-01-01"}
            }],
            "name": [{"use": "official", "family": "Williams", "suffix": ["PhD"]}],
            "address": [{"use": "home", "type": "both", "state": "West Yorkshire"}],
            "link": [{"other": {"reference": "Patient/2"}, "type": "seealso"}]
        });

        let patient = Patient::from_value(input.clone()).expect("standard elements");
        assert_eq!(patient.language.as_deref(), Some("en-GB"));
        assert!(patient.text.is_some());
        assert_eq!(patient.name[0].suffix, vec!["PhD".to_string()]);
        assert_eq!(patient.address[0].state.as_deref(), Some("West Yorkshire"));
        assert_eq!(patient.link.len(), 1);
        assert_eq!(serde_json::to_value(&patient).expect("serialise"), input);
    }

    #[test]
    fn empty_patient_renders_minimal_json() {
        let patient = PatientResource::empty("abc");
        let value = serde_json::to_value(&patient).expect("serialise");
        assert_eq!(
            value,
            serde_json::json!({"resourceType": "Patient", "id": "abc"})
        );
    }

    #[test]
    fn choice_helpers_detect_either_variant() {
        let mut patient = PatientResource::empty("abc");
        assert!(!patient.has_deceased());
        assert!(!patient.has_multiple_birth());

        patient.deceased_date_time = Some("2020-01-01".into());
        patient.multiple_birth_integer = Some(2);
        assert!(patient.has_deceased());
        assert!(patient.has_multiple_birth());
    }
}
