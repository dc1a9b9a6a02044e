//! The internal, flat patient record.

use carelink_types::NhsNumber;
use carelink_uuid::RecordId;
use chrono::{DateTime, Utc};
use fhir::RegistrationDetails;
use serde::{Deserialize, Serialize};

/// Flat internal patient record.
///
/// Coded fields hold bare codes; whether a code is a member of its value set is checked by
/// the field codecs when the record is projected onto the wire, not here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    pub id: RecordId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nhs_number: Option<NhsNumber>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nhs_number_verification_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnic_category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residential_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_start: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_end: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_notification_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadaveric_donor: Option<bool>,
}

impl PatientRecord {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// The registration group as the codec sees it.
    pub fn registration_details(&self) -> RegistrationDetails {
        RegistrationDetails {
            period_start: self.registration_start,
            period_end: self.registration_end,
            registration_type: self.registration_type.clone(),
            preferred_branch: self.preferred_branch.clone(),
        }
    }

    pub fn set_registration_details(&mut self, details: RegistrationDetails) {
        self.registration_start = details.period_start;
        self.registration_end = details.period_end;
        self.registration_type = details.registration_type;
        self.preferred_branch = details.preferred_branch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn registration_details_round_trip_through_record() {
        let mut record = PatientRecord::new(RecordId::new());
        let details = RegistrationDetails {
            period_start: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            period_end: None,
            registration_type: Some("R".into()),
            preferred_branch: Some("Location/1".into()),
        };

        record.set_registration_details(details.clone());
        assert_eq!(record.registration_details(), details);
        assert_eq!(record.registration_type.as_deref(), Some("R"));
    }

    #[test]
    fn yaml_omits_absent_fields() {
        let id = RecordId::parse("2db211f12a6a4a1e8b8a1c6b1b5c6f10").expect("id");
        let record = PatientRecord {
            nhs_number: Some(NhsNumber::parse("9000000009").expect("nhs number")),
            ..PatientRecord::new(id)
        };
        let yaml = serde_yaml::to_string(&record).expect("serialise");
        assert!(yaml.contains("id: 2db211f12a6a4a1e8b8a1c6b1b5c6f10"));
        assert!(yaml.contains("nhs_number: '9000000009'"));
        assert!(!yaml.contains("ethnic_category"));

        let parsed: PatientRecord = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(parsed, record);
    }

    #[test]
    fn yaml_rejects_malformed_nhs_number() {
        let yaml = "id: 2db211f12a6a4a1e8b8a1c6b1b5c6f10\nnhs_number: '12345'\n";
        let err = serde_yaml::from_str::<PatientRecord>(yaml).expect_err("short number");
        assert!(err.to_string().contains("10 digits"), "{err}");
    }
}
