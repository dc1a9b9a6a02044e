//! Patient registration: mutation validation and the register/fetch path.

use crate::constants::NHS_NUMBER_SYSTEM;
use crate::error::{ensure_found, ErrorKind, ValidationError, ValidationResult};
use crate::mapping::PatientMappingService;
use crate::store::RecordStore;
use crate::validation::{assert_disallowed, assert_mandatory, assert_mandatory_as};
use crate::{CoreError, CoreResult};
use carelink_types::{NhsNumber, NonEmptyText};
use carelink_uuid::RecordId;
use chrono::Utc;
use fhir::{AddressUse, ContactPoint, NameUse, PatientResource, ResourceType};
use std::sync::Arc;

/// Registration type code applied to temporary registrations that carry none.
const TEMPORARY_REGISTRATION_TYPE: &str = "T";

/// Kind of patient mutation being validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationMode {
    Registration,
    TemporaryRegistration,
}

/// The identifier carrying the NHS number: the NHS-system identifier if there is one,
/// otherwise the first identifier.
pub fn nhs_number_of(resource: &PatientResource) -> Option<&str> {
    resource
        .identifier
        .iter()
        .find(|i| i.has_system(NHS_NUMBER_SYSTEM))
        .or_else(|| resource.identifier.first())
        .and_then(|i| i.value.as_deref())
}

/// Structural checks for an inbound Patient about to be registered.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatientRegistrationValidator;

impl PatientRegistrationValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates `resource`, stopping at the first violation.
    pub fn validate(&self, resource: &PatientResource, mode: MutationMode) -> ValidationResult<()> {
        assert_mandatory(
            !resource.identifier.is_empty(),
            "Patient must have at least one identifier",
        )?;

        let nhs_number = nhs_number_of(resource).unwrap_or_default();
        assert_mandatory_as(
            NhsNumber::parse(nhs_number).is_ok(),
            format!("NHS number '{nhs_number}' is invalid, it must be exactly 10 digits"),
            ErrorKind::InvalidNhsNumber,
        )?;

        assert_mandatory_as(
            resource.identifier.iter().all(|i| i.system.is_some()),
            "Every identifier must have a system",
            ErrorKind::InvalidIdentifierSystem,
        )?;

        assert_mandatory(
            resource.birth_date.is_some(),
            "Patient birth date is mandatory",
        )?;

        let has_official_family_name = resource.name.iter().any(|name| {
            name.use_type == Some(NameUse::Official)
                && name
                    .family
                    .as_deref()
                    .is_some_and(|family| NonEmptyText::new(family).is_ok())
        });
        assert_mandatory(
            has_official_family_name,
            "Patient must have an official name with a family name",
        )?;

        if mode == MutationMode::TemporaryRegistration {
            validate_temporary_fields(resource)?;
        }

        validate_address_uses(resource)?;
        validate_telecom_uses(&resource.telecom)
    }
}

fn validate_temporary_fields(resource: &PatientResource) -> ValidationResult<()> {
    assert_disallowed(resource.animal.is_some(), "Animal")?;
    assert_disallowed(!resource.communication.is_empty(), "Communication")?;
    assert_disallowed(!resource.photo.is_empty(), "Photo")?;
    assert_disallowed(resource.has_multiple_birth(), "MultipleBirth")?;
    assert_disallowed(resource.marital_status.is_some(), "MaritalStatus")?;
    assert_disallowed(resource.has_deceased(), "Deceased")?;
    assert_disallowed(resource.active.is_some(), "Active")?;
    assert_disallowed(!resource.contact.is_empty(), "Contact")?;
    assert_disallowed(
        !resource.general_practitioner.is_empty(),
        "GeneralPractitioner",
    )?;
    assert_disallowed(
        resource.managing_organization.is_some(),
        "ManagingOrganization",
    )
}

fn validate_address_uses(resource: &PatientResource) -> ValidationResult<()> {
    let mut seen: Vec<AddressUse> = Vec::new();

    for address in &resource.address {
        let address_use = match address.use_type {
            Some(u @ (AddressUse::Home | AddressUse::Temp)) => u,
            Some(other) => {
                return Err(ValidationError::new(
                    ErrorKind::InvalidResource,
                    format!(
                        "Address use '{}' is not allowed, only home and temp addresses are accepted",
                        other.code()
                    ),
                ));
            }
            None => {
                return Err(ValidationError::new(
                    ErrorKind::InvalidResource,
                    "Address use is mandatory, only home and temp addresses are accepted",
                ));
            }
        };

        if seen.contains(&address_use) {
            return Err(ValidationError::new(
                ErrorKind::InvalidResource,
                format!("Only one {} address is allowed", address_use.code()),
            ));
        }
        seen.push(address_use);
    }

    Ok(())
}

fn validate_telecom_uses(telecom: &[ContactPoint]) -> ValidationResult<()> {
    let mut groups: Vec<((Option<_>, Option<_>), usize)> = Vec::new();

    for point in telecom {
        let key = (point.system, point.use_type);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => groups.push((key, 1)),
        }
    }

    let duplicates: Vec<String> = groups
        .iter()
        .filter(|(_, count)| *count >= 2)
        .map(|((system, use_type), _)| {
            format!(
                "{{System: {}, Use: {}}}",
                system.map_or("None", |s| s.label()),
                use_type.map_or("None", |u| u.label())
            )
        })
        .collect();

    if duplicates.is_empty() {
        return Ok(());
    }
    Err(ValidationError::new(
        ErrorKind::BadRequest,
        format!("Duplicate use of: {}", duplicates.join(", ")),
    ))
}

/// Registers new patients and serves existing ones.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RecordStore + Send + Sync>,
    mapping: PatientMappingService,
    validator: PatientRegistrationValidator,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RecordStore + Send + Sync>) -> Self {
        Self {
            mapping: PatientMappingService::new(store.clone()),
            store,
            validator: PatientRegistrationValidator::new(),
        }
    }

    pub fn mapping(&self) -> &PatientMappingService {
        &self.mapping
    }

    /// Validates an inbound Patient without registering it.
    pub fn validate_mutation(
        &self,
        resource: &PatientResource,
        mode: MutationMode,
    ) -> ValidationResult<()> {
        self.validator.validate(resource, mode)
    }

    /// Validates and stores a new patient, returning the enhanced resource with its new id.
    ///
    /// # Errors
    ///
    /// - [`crate::CoreError::Validation`] if the resource is invalid or a patient with the
    ///   same NHS number is already registered (`DUPLICATE_REJECTED`).
    /// - [`crate::CoreError::Store`] if the record store fails.
    pub fn register(
        &self,
        mut resource: PatientResource,
        mode: MutationMode,
    ) -> CoreResult<PatientResource> {
        self.validator.validate(&resource, mode)?;

        let nhs_number = NhsNumber::parse(nhs_number_of(&resource).unwrap_or_default())
            .map_err(|err| CoreError::InvalidInput(err.to_string()))?;
        let existing = self
            .store
            .find_by_identifier(NHS_NUMBER_SYSTEM, nhs_number.as_str())?;
        if !existing.is_empty() {
            tracing::warn!(nhs_number = %nhs_number, "rejecting duplicate registration");
            return Err(ValidationError::new(
                ErrorKind::DuplicateRejected,
                format!("Patient with NHS number {nhs_number} is already registered"),
            )
            .into());
        }

        let mut record = self.mapping.to_record(&resource, RecordId::new());
        record.nhs_number = Some(nhs_number);
        if record.registration_start.is_none() {
            record.registration_start = Some(Utc::now());
        }
        if mode == MutationMode::TemporaryRegistration && record.registration_type.is_none() {
            record.registration_type = Some(TEMPORARY_REGISTRATION_TYPE.to_string());
        }

        let id = self.store.save(record.clone())?;
        tracing::info!(%id, ?mode, "registered patient");

        resource.id = Some(id.to_string());
        Ok(self.mapping.project(resource, &record))
    }

    /// Returns the stored patient `id` as an enhanced resource.
    ///
    /// # Errors
    ///
    /// Returns `PATIENT_NOT_FOUND` when `id` is not a record id or names no record.
    pub fn fetch(&self, id: &str) -> CoreResult<PatientResource> {
        let record = match RecordId::parse(id) {
            Ok(record_id) => self.store.find_by_id(&record_id)?,
            Err(_) => None,
        };
        let record = ensure_found(ResourceType::Patient, id, record)?;

        Ok(self
            .mapping
            .project(PatientResource::empty(record.id.to_string()), &record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueClass;
    use crate::store::InMemoryRecordStore;
    use crate::CoreError;
    use fhir::Patient;
    use serde_json::json;

    fn base_patient() -> serde_json::Value {
        json!({
            "resourceType": "Patient",
            "identifier": [
                {"system": "https://fhir.nhs.uk/Id/nhs-number", "value": "9000000009"}
            ],
            "name": [{"use": "official", "family": "Williams", "given": ["Sarah"]}],
            "birthDate": "1992-03-20"
        })
    }

    fn patient(value: serde_json::Value) -> PatientResource {
        Patient::from_value(value).expect("valid wire patient")
    }

    fn validate(value: serde_json::Value, mode: MutationMode) -> ValidationResult<()> {
        PatientRegistrationValidator::new().validate(&patient(value), mode)
    }

    #[test]
    fn minimal_patient_is_valid() {
        assert!(validate(base_patient(), MutationMode::Registration).is_ok());
        assert!(validate(base_patient(), MutationMode::TemporaryRegistration).is_ok());
    }

    #[test]
    fn identifier_is_mandatory() {
        let mut value = base_patient();
        value["identifier"] = json!([]);
        let err = validate(value, MutationMode::Registration).expect_err("no identifier");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn nhs_number_must_be_ten_digits() {
        for bad in ["900000000", "90000000091", "90000A0009"] {
            let mut value = base_patient();
            value["identifier"][0]["value"] = json!(bad);
            let err = validate(value, MutationMode::Registration).expect_err("bad NHS number");
            assert_eq!(err.kind(), ErrorKind::InvalidNhsNumber);
            assert_eq!(err.issue_class(), IssueClass::Invalid);
        }
    }

    #[test]
    fn first_identifier_used_when_no_nhs_system() {
        let mut value = base_patient();
        value["identifier"] = json!([{"system": "urn:local", "value": "1234567890"}]);
        assert!(validate(value, MutationMode::Registration).is_ok());
    }

    #[test]
    fn every_identifier_needs_a_system() {
        let mut value = base_patient();
        value["identifier"]
            .as_array_mut()
            .expect("array")
            .push(json!({"value": "abc"}));
        let err = validate(value, MutationMode::Registration).expect_err("no system");
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifierSystem);
    }

    #[test]
    fn birth_date_and_official_family_name_are_mandatory() {
        let mut value = base_patient();
        value.as_object_mut().expect("object").remove("birthDate");
        let err = validate(value, MutationMode::Registration).expect_err("no birth date");
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let mut value = base_patient();
        value["name"] = json!([{"use": "usual", "family": "Williams"}]);
        let err = validate(value, MutationMode::Registration).expect_err("no official name");
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let mut value = base_patient();
        value["name"] = json!([{"use": "official", "family": "  "}]);
        let err = validate(value, MutationMode::Registration).expect_err("blank family");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn temporary_registration_disallows_animal() {
        let mut value = base_patient();
        value["animal"] = json!({"species": {"text": "Dog"}});

        let err = validate(value.clone(), MutationMode::TemporaryRegistration)
            .expect_err("animal disallowed");
        assert_eq!(err.kind(), ErrorKind::InvalidResource);
        assert_eq!(err.message(), "Not allowed field: Animal");

        assert!(validate(value, MutationMode::Registration).is_ok());
    }

    #[test]
    fn temporary_registration_disallow_list_names_each_field() {
        let cases = [
            ("communication", json!([{"language": {"text": "en"}}]), "Communication"),
            ("photo", json!([{"url": "x"}]), "Photo"),
            ("multipleBirthInteger", json!(2), "MultipleBirth"),
            ("maritalStatus", json!({"text": "M"}), "MaritalStatus"),
            ("deceasedBoolean", json!(false), "Deceased"),
            ("active", json!(true), "Active"),
            ("contact", json!([{"gender": "male"}]), "Contact"),
            (
                "generalPractitioner",
                json!([{"reference": "Practitioner/1"}]),
                "GeneralPractitioner",
            ),
            (
                "managingOrganization",
                json!({"reference": "Organization/1"}),
                "ManagingOrganization",
            ),
        ];

        for (key, field, name) in cases {
            let mut value = base_patient();
            value[key] = field;
            let err = validate(value, MutationMode::TemporaryRegistration)
                .expect_err("disallowed field");
            assert_eq!(err.message(), format!("Not allowed field: {name}"));
        }
    }

    #[test]
    fn address_uses_are_restricted() {
        let mut value = base_patient();
        value["address"] = json!([{"use": "home"}, {"use": "temp"}]);
        assert!(validate(value, MutationMode::Registration).is_ok());

        let mut value = base_patient();
        value["address"] = json!([{"use": "work"}]);
        let err = validate(value, MutationMode::Registration).expect_err("work");
        assert_eq!(err.kind(), ErrorKind::InvalidResource);

        let mut value = base_patient();
        value["address"] = json!([{"line": ["1 High Street"]}]);
        let err = validate(value, MutationMode::Registration).expect_err("missing use");
        assert_eq!(err.kind(), ErrorKind::InvalidResource);

        let mut value = base_patient();
        value["address"] = json!([{"use": "home"}, {"use": "home"}]);
        let err = validate(value, MutationMode::Registration).expect_err("two home");
        assert_eq!(err.message(), "Only one home address is allowed");
    }

    #[test]
    fn duplicate_telecom_uses_are_listed_in_first_seen_order() {
        let mut value = base_patient();
        value["telecom"] = json!([
            {"system": "email", "use": "home", "value": "a@example.org"},
            {"system": "phone", "use": "mobile", "value": "07000000001"},
            {"system": "phone", "use": "home", "value": "01000000000"},
            {"system": "phone", "use": "mobile", "value": "07000000002"},
            {"system": "email", "use": "home", "value": "b@example.org"}
        ]);

        let err = validate(value, MutationMode::Registration).expect_err("duplicates");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(
            err.message(),
            "Duplicate use of: {System: Email, Use: Home}, {System: Phone, Use: Mobile}"
        );
    }

    #[test]
    fn identifier_checks_run_before_birth_date_and_name() {
        let mut value = base_patient();
        value["identifier"] = json!([]);
        value.as_object_mut().expect("object").remove("birthDate");
        let err = validate(value, MutationMode::Registration).expect_err("no identifier");
        assert_eq!(err.message(), "Patient must have at least one identifier");

        let mut value = base_patient();
        value["identifier"][0]["value"] = json!("123");
        value.as_object_mut().expect("object").remove("birthDate");
        let err = validate(value, MutationMode::Registration).expect_err("bad NHS number");
        assert_eq!(err.kind(), ErrorKind::InvalidNhsNumber);

        let mut value = base_patient();
        value["identifier"] = json!([
            {"system": "https://fhir.nhs.uk/Id/nhs-number", "value": "9000000009"},
            {"value": "local-1"}
        ]);
        value["name"] = json!([]);
        let err = validate(value, MutationMode::Registration).expect_err("no system");
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifierSystem);
    }

    #[test]
    fn birth_date_is_checked_before_official_name() {
        let mut value = base_patient();
        value.as_object_mut().expect("object").remove("birthDate");
        value["name"] = json!([{"use": "usual", "family": "Williams"}]);
        let err = validate(value, MutationMode::Registration).expect_err("no birth date");
        assert_eq!(err.message(), "Patient birth date is mandatory");
    }

    #[test]
    fn temporary_fields_are_checked_before_addresses_and_telecoms() {
        let mut value = base_patient();
        value["animal"] = json!({"species": {"text": "dog"}});
        value["address"] = json!([{"use": "work"}]);
        value["telecom"] = json!([
            {"system": "phone", "use": "home"},
            {"system": "phone", "use": "home"}
        ]);

        let err = validate(value.clone(), MutationMode::TemporaryRegistration)
            .expect_err("animal");
        assert_eq!(err.message(), "Not allowed field: Animal");

        let err = validate(value, MutationMode::Registration).expect_err("work address");
        assert_eq!(err.kind(), ErrorKind::InvalidResource);
    }

    #[test]
    fn distinct_telecom_uses_pass() {
        let mut value = base_patient();
        value["telecom"] = json!([
            {"system": "phone", "use": "mobile"},
            {"system": "phone", "use": "home"},
            {"system": "email"}
        ]);
        assert!(validate(value, MutationMode::Registration).is_ok());
    }

    fn service() -> RegistrationService {
        RegistrationService::new(Arc::new(InMemoryRecordStore::new()))
    }

    #[test]
    fn register_then_fetch() {
        let service = service();
        let registered = service
            .register(patient(base_patient()), MutationMode::TemporaryRegistration)
            .expect("register");

        let id = registered.id.clone().expect("id assigned");
        assert!(RecordId::is_canonical(&id));

        let fetched = service.fetch(&id).expect("fetch");
        assert_eq!(fetched.id.as_deref(), Some(id.as_str()));
        assert_eq!(fetched.identifier[0].value.as_deref(), Some("9000000009"));

        let record = service
            .mapping()
            .to_record(&fetched, RecordId::parse(&id).expect("id"));
        assert_eq!(record.registration_type.as_deref(), Some("T"));
        assert!(record.registration_start.is_some());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let service = service();
        service
            .register(patient(base_patient()), MutationMode::Registration)
            .expect("first registration");

        let err = service
            .register(patient(base_patient()), MutationMode::Registration)
            .expect_err("duplicate");
        let validation = err.as_validation().expect("validation error");
        assert_eq!(validation.kind(), ErrorKind::DuplicateRejected);
        assert_eq!(validation.issue_class(), IssueClass::Duplicate);
    }

    #[test]
    fn invalid_resource_is_not_stored() {
        let store = Arc::new(InMemoryRecordStore::new());
        let service = RegistrationService::new(store.clone());

        let mut value = base_patient();
        value["animal"] = json!({});
        let err = service
            .register(patient(value), MutationMode::TemporaryRegistration)
            .expect_err("invalid");
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(store.is_empty().expect("is_empty"));
    }

    #[test]
    fn fetch_unknown_patient_is_not_found() {
        let service = service();
        for id in [RecordId::new().to_string(), "not-an-id".to_string()] {
            let err = service.fetch(&id).expect_err("missing");
            let validation = err.as_validation().expect("validation error");
            assert_eq!(validation.kind(), ErrorKind::PatientNotFound);
        }
    }
}
