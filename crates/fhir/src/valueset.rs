//! Closed value sets for the coded Care Connect extensions.
//!
//! A [`ValueSet`] is an immutable code → display dictionary bound to one code system.
//! Membership is checked on both encode and decode, so a code that is not listed here can
//! never reach the wire or a decoded record.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Code system for ethnic category.
pub const ETHNIC_CATEGORY_SYSTEM: &str =
    "https://fhir.hl7.org.uk/STU3/CodeSystem/CareConnect-EthnicCategory-1";

/// Code system for residential status.
pub const RESIDENTIAL_STATUS_SYSTEM: &str =
    "https://fhir.hl7.org.uk/STU3/CodeSystem/CareConnect-ResidentialStatus-1";

/// Code system for treatment category.
pub const TREATMENT_CATEGORY_SYSTEM: &str =
    "https://fhir.hl7.org.uk/STU3/CodeSystem/CareConnect-TreatmentCategory-1";

/// Code system for registration type.
pub const REGISTRATION_TYPE_SYSTEM: &str =
    "https://fhir.nhs.uk/STU3/CodeSystem/CareConnect-RegistrationType-1";

/// Code system for death notification status.
pub const DEATH_NOTIFICATION_STATUS_SYSTEM: &str =
    "https://fhir.hl7.org.uk/STU3/CodeSystem/CareConnect-DeathNotificationStatus-1";

/// Code system for NHS number verification status.
pub const NHS_NUMBER_VERIFICATION_STATUS_SYSTEM: &str =
    "https://fhir.hl7.org.uk/STU3/CodeSystem/CareConnect-NHSNumberVerificationStatus-1";

/// An immutable, closed mapping from code to display text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueSet {
    name: &'static str,
    system: &'static str,
    concepts: HashMap<&'static str, &'static str>,
}

impl ValueSet {
    /// Builds a value set from `(code, display)` pairs.
    pub fn new(
        name: &'static str,
        system: &'static str,
        concepts: &[(&'static str, &'static str)],
    ) -> Self {
        Self {
            name,
            system,
            concepts: concepts.iter().copied().collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The code system every member belongs to.
    pub fn system(&self) -> &'static str {
        self.system
    }

    pub fn contains(&self, code: &str) -> bool {
        self.concepts.contains_key(code)
    }

    pub fn display(&self, code: &str) -> Option<&'static str> {
        self.concepts.get(code).copied()
    }

    pub fn all_codes(&self) -> HashSet<&'static str> {
        self.concepts.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

static ETHNIC_CATEGORY: LazyLock<ValueSet> = LazyLock::new(|| {
    ValueSet::new(
        "EthnicCategory",
        ETHNIC_CATEGORY_SYSTEM,
        &[
            ("A", "British, Mixed British"),
            ("B", "Irish"),
            ("C", "Any other White background"),
            ("D", "White and Black Caribbean"),
            ("E", "White and Black African"),
            ("F", "White and Asian"),
            ("G", "Any other mixed background"),
            ("H", "Indian or British Indian"),
            ("J", "Pakistani or British Pakistani"),
            ("K", "Bangladeshi or British Bangladeshi"),
            ("L", "Any other Asian background"),
            ("M", "Caribbean"),
            ("N", "African"),
            ("P", "Any other Black background"),
            ("R", "Chinese"),
            ("S", "Any other ethnic group"),
            ("Z", "Not stated"),
            ("99", "Not Known"),
        ],
    )
});

static RESIDENTIAL_STATUS: LazyLock<ValueSet> = LazyLock::new(|| {
    ValueSet::new(
        "ResidentialStatus",
        RESIDENTIAL_STATUS_SYSTEM,
        &[("H", "UK Resident"), ("O", "Overseas Resident")],
    )
});

static TREATMENT_CATEGORY: LazyLock<ValueSet> = LazyLock::new(|| {
    ValueSet::new(
        "TreatmentCategory",
        TREATMENT_CATEGORY_SYSTEM,
        &[
            ("01", "Exempt from charges: treatment provided free of charge"),
            ("02", "Chargeable overseas visitor"),
            ("03", "Exempt from charges: reciprocal healthcare agreement"),
            ("04", "Exempt from charges: immediately necessary treatment"),
            ("05", "Exempt from charges: emergency treatment"),
            ("06", "Exempt from charges: other exemption"),
        ],
    )
});

static REGISTRATION_TYPE: LazyLock<ValueSet> = LazyLock::new(|| {
    ValueSet::new(
        "RegistrationType",
        REGISTRATION_TYPE_SYSTEM,
        &[
            ("R", "Regular"),
            ("E", "Emergency"),
            ("IN", "Immediately necessary"),
            ("T", "Temporary"),
            ("P", "Private"),
            ("S", "Walk-In Patient"),
            ("O", "Other"),
        ],
    )
});

static DEATH_NOTIFICATION_STATUS: LazyLock<ValueSet> = LazyLock::new(|| {
    ValueSet::new(
        "DeathNotificationStatus",
        DEATH_NOTIFICATION_STATUS_SYSTEM,
        &[
            ("1", "Informal - death notice received via an update from a local NHS Organisation such as GP or Trust"),
            ("2", "Formal - death notice received from Registrar of Deaths"),
            ("U", "Removed"),
        ],
    )
});

static NHS_NUMBER_VERIFICATION_STATUS: LazyLock<ValueSet> = LazyLock::new(|| {
    ValueSet::new(
        "NHSNumberVerificationStatus",
        NHS_NUMBER_VERIFICATION_STATUS_SYSTEM,
        &[
            ("01", "Number present and verified"),
            ("02", "Number present but not traced"),
            ("03", "Trace required"),
            ("04", "Trace attempted - No match or multiple match found"),
            ("05", "Trace needs to be resolved - (NHS Number or patient detail conflict)"),
            ("06", "Trace in progress"),
            ("07", "Number not present and trace not required"),
            ("08", "Trace postponed (baby under six weeks old)"),
        ],
    )
});

pub fn ethnic_category() -> &'static ValueSet {
    &ETHNIC_CATEGORY
}

pub fn residential_status() -> &'static ValueSet {
    &RESIDENTIAL_STATUS
}

pub fn treatment_category() -> &'static ValueSet {
    &TREATMENT_CATEGORY
}

pub fn registration_type() -> &'static ValueSet {
    &REGISTRATION_TYPE
}

pub fn death_notification_status() -> &'static ValueSet {
    &DEATH_NOTIFICATION_STATUS
}

pub fn nhs_number_verification_status() -> &'static ValueSet {
    &NHS_NUMBER_VERIFICATION_STATUS
}
