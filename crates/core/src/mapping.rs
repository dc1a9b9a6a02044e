//! Record ⇄ wire mapping for Patient.
//!
//! Each record field that travels as a Care Connect extension has one [`PatientFieldMapper`]
//! variant. The registry is an ordered `Vec` of variants and determines the order in which
//! extensions are emitted. The NHS number does not travel as an extension; it is projected
//! onto the resource's `identifier` list directly.

use crate::constants::{
    CADAVERIC_DONOR_URL, DEATH_NOTIFICATION_STATUS_URL, ETHNIC_CATEGORY_URL,
    NHS_NUMBER_SYSTEM, NHS_NUMBER_VERIFICATION_STATUS_URL, REGISTRATION_DETAILS_URL,
    RESIDENTIAL_STATUS_URL, TREATMENT_CATEGORY_URL,
};
use crate::record::PatientRecord;
use crate::store::RecordStore;
use crate::{CoreError, CoreResult};
use carelink_types::NhsNumber;
use carelink_uuid::RecordId;
use fhir::valueset;
use fhir::{
    BooleanFieldCodec, CodedConceptFieldCodec, CompositeRegistrationCodec, Extension,
    FieldCodec, Identifier, Patient, PatientResource, ResourceType,
};
use std::sync::Arc;

/// Per-resource mapping capability.
///
/// Callers that only hold a JSON document select the implementation by its `resourceType`
/// tag; see [`ResourceMappers`].
pub trait ResourceMapper {
    const RESOURCE_TYPE: ResourceType;

    type Resource;
    type Record;

    /// Decorates `resource` with the data held in the stored record it identifies.
    fn enhance(&self, resource: Self::Resource) -> CoreResult<Self::Resource>;

    /// Extracts a record from `resource`, stamped with `id`.
    fn to_record(&self, resource: &Self::Resource, id: RecordId) -> Self::Record;
}

/// One mapper per extension-borne record field.
#[derive(Clone, Debug)]
pub enum PatientFieldMapper {
    EthnicCategory(CodedConceptFieldCodec),
    ResidentialStatus(CodedConceptFieldCodec),
    TreatmentCategory(CodedConceptFieldCodec),
    RegistrationDetails(CompositeRegistrationCodec),
    DeathNotificationStatus(CodedConceptFieldCodec),
    CadavericDonor(BooleanFieldCodec),
}

impl PatientFieldMapper {
    /// The extension URL this mapper owns.
    pub fn url(&self) -> &str {
        match self {
            PatientFieldMapper::EthnicCategory(codec)
            | PatientFieldMapper::ResidentialStatus(codec)
            | PatientFieldMapper::TreatmentCategory(codec)
            | PatientFieldMapper::DeathNotificationStatus(codec) => codec.url(),
            PatientFieldMapper::RegistrationDetails(codec) => codec.url(),
            PatientFieldMapper::CadavericDonor(codec) => codec.url(),
        }
    }

    pub fn encode(&self, record: &PatientRecord) -> Option<Extension> {
        match self {
            PatientFieldMapper::EthnicCategory(codec) => {
                record.ethnic_category.as_ref().and_then(|c| codec.encode(c))
            }
            PatientFieldMapper::ResidentialStatus(codec) => {
                record.residential_status.as_ref().and_then(|c| codec.encode(c))
            }
            PatientFieldMapper::TreatmentCategory(codec) => {
                record.treatment_category.as_ref().and_then(|c| codec.encode(c))
            }
            PatientFieldMapper::RegistrationDetails(codec) => {
                codec.encode(&record.registration_details())
            }
            PatientFieldMapper::DeathNotificationStatus(codec) => record
                .death_notification_status
                .as_ref()
                .and_then(|c| codec.encode(c)),
            PatientFieldMapper::CadavericDonor(codec) => {
                record.cadaveric_donor.and_then(|flag| codec.encode(&flag))
            }
        }
    }

    pub fn decode(&self, extensions: &[Extension], record: &mut PatientRecord) {
        match self {
            PatientFieldMapper::EthnicCategory(codec) => {
                record.ethnic_category = codec.decode(extensions);
            }
            PatientFieldMapper::ResidentialStatus(codec) => {
                record.residential_status = codec.decode(extensions);
            }
            PatientFieldMapper::TreatmentCategory(codec) => {
                record.treatment_category = codec.decode(extensions);
            }
            PatientFieldMapper::RegistrationDetails(codec) => {
                record.set_registration_details(codec.decode(extensions).unwrap_or_default());
            }
            PatientFieldMapper::DeathNotificationStatus(codec) => {
                record.death_notification_status = codec.decode(extensions);
            }
            PatientFieldMapper::CadavericDonor(codec) => {
                record.cadaveric_donor = codec.decode(extensions);
            }
        }
    }
}

/// The mapper registry in emission order.
pub fn default_registry() -> Vec<PatientFieldMapper> {
    vec![
        PatientFieldMapper::EthnicCategory(CodedConceptFieldCodec::new(
            ETHNIC_CATEGORY_URL,
            valueset::ethnic_category(),
        )),
        PatientFieldMapper::ResidentialStatus(CodedConceptFieldCodec::new(
            RESIDENTIAL_STATUS_URL,
            valueset::residential_status(),
        )),
        PatientFieldMapper::TreatmentCategory(CodedConceptFieldCodec::new(
            TREATMENT_CATEGORY_URL,
            valueset::treatment_category(),
        )),
        PatientFieldMapper::RegistrationDetails(CompositeRegistrationCodec::new(
            REGISTRATION_DETAILS_URL,
        )),
        PatientFieldMapper::DeathNotificationStatus(CodedConceptFieldCodec::new(
            DEATH_NOTIFICATION_STATUS_URL,
            valueset::death_notification_status(),
        )),
        PatientFieldMapper::CadavericDonor(BooleanFieldCodec::new(CADAVERIC_DONOR_URL)),
    ]
}

/// Projects stored patient records onto wire resources and back.
#[derive(Clone)]
pub struct PatientMappingService {
    store: Arc<dyn RecordStore + Send + Sync>,
    mappers: Vec<PatientFieldMapper>,
    verification_status: CodedConceptFieldCodec,
}

impl PatientMappingService {
    /// Creates a service using the default mapper registry.
    pub fn new(store: Arc<dyn RecordStore + Send + Sync>) -> Self {
        Self::with_mappers(store, default_registry())
    }

    pub fn with_mappers(
        store: Arc<dyn RecordStore + Send + Sync>,
        mappers: Vec<PatientFieldMapper>,
    ) -> Self {
        Self {
            store,
            mappers,
            verification_status: CodedConceptFieldCodec::new(
                NHS_NUMBER_VERIFICATION_STATUS_URL,
                valueset::nhs_number_verification_status(),
            ),
        }
    }

    pub fn mappers(&self) -> &[PatientFieldMapper] {
        &self.mappers
    }

    /// Looks up the record named by `resource.id` and projects it onto `resource`.
    ///
    /// A missing or unparseable id, or an id with no stored record, leaves the resource
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the record store fails.
    pub fn enhance(&self, resource: PatientResource) -> CoreResult<PatientResource> {
        let Some(id) = resource
            .id
            .as_deref()
            .and_then(|raw| RecordId::parse(raw).ok())
        else {
            tracing::debug!(id = ?resource.id, "resource id is not a record id, skipping enhance");
            return Ok(resource);
        };

        let Some(record) = self.store.find_by_id(&id)? else {
            tracing::debug!(%id, "no stored record, skipping enhance");
            return Ok(resource);
        };

        Ok(self.project(resource, &record))
    }

    /// Projects `record` onto `resource`.
    ///
    /// Extensions at mapper-owned URLs are replaced, so projecting twice gives the same
    /// result as projecting once.
    pub fn project(
        &self,
        mut resource: PatientResource,
        record: &PatientRecord,
    ) -> PatientResource {
        resource
            .extension
            .retain(|ext| !self.mappers.iter().any(|m| m.url() == ext.url));
        resource
            .extension
            .extend(self.mappers.iter().filter_map(|m| m.encode(record)));

        if let Some(identifier) = self.nhs_number_identifier(record) {
            match resource
                .identifier
                .iter_mut()
                .find(|i| i.has_system(NHS_NUMBER_SYSTEM))
            {
                Some(existing) => *existing = identifier,
                None => resource.identifier.push(identifier),
            }
        }

        resource
    }

    /// Extracts a record from `resource` and stamps it with `id`.
    pub fn to_record(&self, resource: &PatientResource, id: RecordId) -> PatientRecord {
        let mut record = PatientRecord::new(id);

        if let Some(identifier) = resource
            .identifier
            .iter()
            .find(|i| i.has_system(NHS_NUMBER_SYSTEM))
        {
            record.nhs_number = identifier.value.as_deref().and_then(|value| {
                NhsNumber::parse(value)
                    .map_err(|err| tracing::debug!(%err, "dropping malformed NHS number"))
                    .ok()
            });
            record.nhs_number_verification_status =
                self.verification_status.decode(&identifier.extension);
        }

        for mapper in &self.mappers {
            mapper.decode(&resource.extension, &mut record);
        }

        record
    }

    fn nhs_number_identifier(&self, record: &PatientRecord) -> Option<Identifier> {
        let nhs_number = record.nhs_number.as_ref()?;
        let extension = record
            .nhs_number_verification_status
            .as_ref()
            .and_then(|code| self.verification_status.encode(code))
            .into_iter()
            .collect();

        Some(Identifier {
            extension,
            system: Some(NHS_NUMBER_SYSTEM.to_string()),
            value: Some(nhs_number.to_string()),
            ..Identifier::default()
        })
    }
}

impl ResourceMapper for PatientMappingService {
    const RESOURCE_TYPE: ResourceType = ResourceType::Patient;

    type Resource = PatientResource;
    type Record = PatientRecord;

    fn enhance(&self, resource: PatientResource) -> CoreResult<PatientResource> {
        PatientMappingService::enhance(self, resource)
    }

    fn to_record(&self, resource: &PatientResource, id: RecordId) -> PatientRecord {
        PatientMappingService::to_record(self, resource, id)
    }
}

/// Dispatches JSON documents to the mapper registered for their `resourceType`.
#[derive(Clone)]
pub struct ResourceMappers {
    patient: PatientMappingService,
}

impl ResourceMappers {
    pub fn new(patient: PatientMappingService) -> Self {
        Self { patient }
    }

    pub fn patient(&self) -> &PatientMappingService {
        &self.patient
    }

    /// Enhances a JSON resource and renders the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] for resource types without a mapper, and
    /// [`CoreError::Fhir`] if the document does not parse.
    pub fn enhance_json(&self, json_text: &str) -> CoreResult<String> {
        match ResourceType::of_json(json_text)? {
            ResourceType::Patient => {
                let resource = Patient::parse(json_text)?;
                let enhanced = ResourceMapper::enhance(&self.patient, resource)?;
                Ok(Patient::render(&enhanced)?)
            }
            other => Err(unmapped(other)),
        }
    }

    /// Extracts a record from a JSON resource and renders it as YAML.
    pub fn to_record_yaml(&self, json_text: &str, id: RecordId) -> CoreResult<String> {
        match ResourceType::of_json(json_text)? {
            ResourceType::Patient => {
                let resource = Patient::parse(json_text)?;
                let record = ResourceMapper::to_record(&self.patient, &resource, id);
                Ok(serde_yaml::to_string(&record)?)
            }
            other => Err(unmapped(other)),
        }
    }
}

fn unmapped(resource_type: ResourceType) -> CoreError {
    CoreError::InvalidInput(format!(
        "no mapper registered for resourceType '{resource_type}'"
    ))
}
