//! Resource-type tags for the resources Carelink exposes.

use crate::{FhirError, FhirResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The resource types Carelink serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Patient,
    Practitioner,
    Organization,
    Location,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Practitioner => "Practitioner",
            ResourceType::Organization => "Organization",
            ResourceType::Location => "Location",
        }
    }

    /// Reads the `resourceType` tag of a JSON resource without parsing the rest of it.
    pub fn of_json(json_text: &str) -> FhirResult<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "resourceType")]
            resource_type: String,
        }

        let envelope: Envelope = serde_json::from_str(json_text)?;
        envelope.resource_type.parse()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(ResourceType::Patient),
            "Practitioner" => Ok(ResourceType::Practitioner),
            "Organization" => Ok(ResourceType::Organization),
            "Location" => Ok(ResourceType::Location),
            other => Err(FhirError::InvalidInput(format!(
                "unsupported resourceType '{other}'"
            ))),
        }
    }
}
