//! Constants used throughout the Carelink core crate.
//!
//! Extension URLs and identifier systems are fixed by the Care Connect and Spine profiles;
//! keeping them here makes the wire contract reviewable in one place.

/// Identifier system of the NHS number.
pub const NHS_NUMBER_SYSTEM: &str = "https://fhir.nhs.uk/Id/nhs-number";

/// Identifier system of an SDS user id (practitioners).
pub const SDS_USER_ID_SYSTEM: &str = "https://fhir.nhs.uk/Id/sds-user-id";

/// Identifier system of an SDS role profile id (practitioner roles).
pub const SDS_ROLE_PROFILE_ID_SYSTEM: &str = "https://fhir.nhs.uk/Id/sds-role-profile-id";

/// Identifier system of an ODS organisation code.
pub const ODS_ORGANIZATION_CODE_SYSTEM: &str = "https://fhir.nhs.uk/Id/ods-organization-code";

/// Identifier system of an ODS site code (locations).
pub const ODS_SITE_CODE_SYSTEM: &str = "https://fhir.nhs.uk/Id/ods-site-code";

/// Identifier systems known to the default identifier type directory.
pub const DEFAULT_IDENTIFIER_SYSTEMS: &[&str] = &[
    NHS_NUMBER_SYSTEM,
    SDS_USER_ID_SYSTEM,
    SDS_ROLE_PROFILE_ID_SYSTEM,
    ODS_ORGANIZATION_CODE_SYSTEM,
    ODS_SITE_CODE_SYSTEM,
];

/// Code system for coded error details.
pub const ERROR_CODE_SYSTEM: &str =
    "https://fhir.nhs.uk/STU3/CodeSystem/Spine-ErrorOrWarningCode-1";

/// Extension URL: ethnic category.
pub const ETHNIC_CATEGORY_URL: &str =
    "https://fhir.hl7.org.uk/STU3/StructureDefinition/Extension-CareConnect-EthnicCategory-1";

/// Extension URL: residential status.
pub const RESIDENTIAL_STATUS_URL: &str =
    "https://fhir.hl7.org.uk/STU3/StructureDefinition/Extension-CareConnect-ResidentialStatus-1";

/// Extension URL: treatment category.
pub const TREATMENT_CATEGORY_URL: &str =
    "https://fhir.hl7.org.uk/STU3/StructureDefinition/Extension-CareConnect-TreatmentCategory-1";

/// Extension URL: death notification status.
pub const DEATH_NOTIFICATION_STATUS_URL: &str =
    "https://fhir.hl7.org.uk/STU3/StructureDefinition/Extension-CareConnect-DeathNotificationStatus-1";

/// Extension URL: NHS number verification status (nested inside the NHS number identifier).
pub const NHS_NUMBER_VERIFICATION_STATUS_URL: &str =
    "https://fhir.hl7.org.uk/STU3/StructureDefinition/Extension-CareConnect-NHSNumberVerificationStatus-1";

/// Extension URL: cadaveric donor flag.
pub const CADAVERIC_DONOR_URL: &str =
    "https://fhir.nhs.uk/STU3/StructureDefinition/Extension-CareConnect-GPC-CadavericDonor-1";

/// Extension URL: registration details group.
pub const REGISTRATION_DETAILS_URL: &str =
    "https://fhir.nhs.uk/STU3/StructureDefinition/Extension-CareConnect-GPC-RegistrationDetails-1";
