//! FHIR STU3 datatypes carried by Carelink resources.
//!
//! These are strict wire models: every struct rejects unknown keys, and coded enumerations
//! only accept the codes defined by their FHIR value set. Datatypes whose content Carelink
//! never inspects are not modelled here; resources keep them as raw JSON.
//!
//! [`Extension`] is the interesting one. On the wire an extension carries exactly one
//! `value[x]` element or a nested `extension` array; internally that becomes the tagged
//! [`ExtensionValue`] so codecs can `match` on the variant they expect. Value types Carelink
//! does not interpret are kept verbatim as [`ExtensionValue::Other`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Coded enumerations
// ============================================================================

/// Purpose of a human name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameUse {
    Usual,
    Official,
    Temp,
    Nickname,
    Anonymous,
    Old,
    Maiden,
}

/// Telecommunications form of a contact point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPointSystem {
    Phone,
    Fax,
    Email,
    Pager,
    Url,
    Sms,
    Other,
}

/// Purpose of a contact point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPointUse {
    Home,
    Work,
    Temp,
    Old,
    Mobile,
}

/// Purpose of an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressUse {
    Home,
    Work,
    Temp,
    Old,
}

impl ContactPointSystem {
    /// Human-readable label, as used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            ContactPointSystem::Phone => "Phone",
            ContactPointSystem::Fax => "Fax",
            ContactPointSystem::Email => "Email",
            ContactPointSystem::Pager => "Pager",
            ContactPointSystem::Url => "Url",
            ContactPointSystem::Sms => "Sms",
            ContactPointSystem::Other => "Other",
        }
    }
}

impl ContactPointUse {
    /// Human-readable label, as used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            ContactPointUse::Home => "Home",
            ContactPointUse::Work => "Work",
            ContactPointUse::Temp => "Temp",
            ContactPointUse::Old => "Old",
            ContactPointUse::Mobile => "Mobile",
        }
    }
}

impl AddressUse {
    /// Wire code for this address use.
    pub fn code(self) -> &'static str {
        match self {
            AddressUse::Home => "home",
            AddressUse::Work => "work",
            AddressUse::Temp => "temp",
            AddressUse::Old => "old",
        }
    }
}

// ============================================================================
// Terminology
// ============================================================================

/// A (system, code, display) triple identifying a value from an external code system.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(rename = "userSelected", skip_serializing_if = "Option::is_none")]
    pub user_selected: Option<bool>,
}

impl Coding {
    /// Builds a coding with system, code and display set.
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: Option<impl Into<String>>,
    ) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: display.map(Into::into),
            ..Self::default()
        }
    }
}

/// One coded concept: an ordered list of codings, of which the first is significant.
///
/// This is the FHIR `CodeableConcept` datatype.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CodeableValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableValue {
    /// Wraps a single coding.
    pub fn single(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    /// The significant (first) coding, if any.
    pub fn first_coding(&self) -> Option<&Coding> {
        self.coding.first()
    }
}

// ============================================================================
// General-purpose datatypes
// ============================================================================

/// A time range. Both bounds are optional and kept as wire strings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// A reference to another resource. The reference string is opaque to Carelink.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Box<Identifier>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }
}

/// Resource metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    #[serde(rename = "versionId", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<Coding>,
}

/// A business identifier, optionally extended (for example with a verification status).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<CodeableValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigner: Option<Reference>,
}

impl Identifier {
    /// True if this identifier belongs to `system`.
    pub fn has_system(&self, system: &str) -> bool {
        self.system.as_deref() == Some(system)
    }
}

/// Human name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<NameUse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// Contact details (phone, email, etc.).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContactPoint {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<ContactPointSystem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<ContactPointUse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// Postal address.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<AddressUse>,

    /// `postal`, `physical` or `both`; not interpreted.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "postalCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

// ============================================================================
// Extensions
// ============================================================================

/// A typed, URL-keyed value node attached to a resource or to another extension.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "ExtensionWire", into = "ExtensionWire")]
pub struct Extension {
    pub url: String,
    pub value: ExtensionValue,
}

/// The value carried by an [`Extension`].
#[derive(Clone, Debug, PartialEq)]
pub enum ExtensionValue {
    Boolean(bool),
    String(String),
    CodeableConcept(CodeableValue),
    Period(Period),
    Reference(Reference),
    /// A composite extension made of nested extensions.
    Nested(Vec<Extension>),
    /// Any other `value[x]` (e.g. `valueDateTime`), kept under its wire element name.
    Other { element: String, value: Value },
}

impl Extension {
    pub fn new(url: impl Into<String>, value: ExtensionValue) -> Self {
        Self {
            url: url.into(),
            value,
        }
    }

    /// Returns the first extension in `extensions` with the given URL.
    ///
    /// Later extensions sharing the URL are never read.
    pub fn first_with_url<'a>(extensions: &'a [Extension], url: &str) -> Option<&'a Extension> {
        extensions.iter().find(|ext| ext.url == url)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            ExtensionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_codeable_concept(&self) -> Option<&CodeableValue> {
        match &self.value {
            ExtensionValue::CodeableConcept(cc) => Some(cc),
            _ => None,
        }
    }

    pub fn as_period(&self) -> Option<&Period> {
        match &self.value {
            ExtensionValue::Period(period) => Some(period),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match &self.value {
            ExtensionValue::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&[Extension]> {
        match &self.value {
            ExtensionValue::Nested(children) => Some(children),
            _ => None,
        }
    }
}

/// Wire representation of an extension: one optional slot per supported `value[x]`.
///
/// Remaining keys land in `other`; only `value*` keys are accepted there.
#[derive(Clone, Debug, Deserialize, Serialize)]
struct ExtensionWire {
    url: String,

    #[serde(rename = "valueBoolean", skip_serializing_if = "Option::is_none")]
    value_boolean: Option<bool>,

    #[serde(rename = "valueString", skip_serializing_if = "Option::is_none")]
    value_string: Option<String>,

    #[serde(
        rename = "valueCodeableConcept",
        skip_serializing_if = "Option::is_none"
    )]
    value_codeable_concept: Option<CodeableValue>,

    #[serde(rename = "valuePeriod", skip_serializing_if = "Option::is_none")]
    value_period: Option<Period>,

    #[serde(rename = "valueReference", skip_serializing_if = "Option::is_none")]
    value_reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extension: Vec<Extension>,

    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}

impl TryFrom<ExtensionWire> for Extension {
    type Error = String;

    fn try_from(wire: ExtensionWire) -> Result<Self, Self::Error> {
        let ExtensionWire {
            url,
            value_boolean,
            value_string,
            value_codeable_concept,
            value_period,
            value_reference,
            extension,
            other,
        } = wire;

        let mut values = Vec::with_capacity(1);
        if let Some(b) = value_boolean {
            values.push(ExtensionValue::Boolean(b));
        }
        if let Some(s) = value_string {
            values.push(ExtensionValue::String(s));
        }
        if let Some(cc) = value_codeable_concept {
            values.push(ExtensionValue::CodeableConcept(cc));
        }
        if let Some(period) = value_period {
            values.push(ExtensionValue::Period(period));
        }
        if let Some(reference) = value_reference {
            values.push(ExtensionValue::Reference(reference));
        }
        if !extension.is_empty() {
            values.push(ExtensionValue::Nested(extension));
        }
        for (element, value) in other {
            if !element.starts_with("value") {
                return Err(format!("extension '{url}' has unknown field `{element}`"));
            }
            values.push(ExtensionValue::Other { element, value });
        }

        match values.len() {
            // An empty composite is legal: the registration details group is always emitted.
            0 => Ok(Extension::new(url, ExtensionValue::Nested(Vec::new()))),
            1 => {
                let value = values
                    .pop()
                    .ok_or_else(|| format!("extension '{url}' lost its value"))?;
                Ok(Extension::new(url, value))
            }
            n => Err(format!(
                "extension '{url}' carries {n} values; exactly one value[x] or nested extension is allowed"
            )),
        }
    }
}

impl From<Extension> for ExtensionWire {
    fn from(ext: Extension) -> Self {
        let mut wire = ExtensionWire {
            url: ext.url,
            value_boolean: None,
            value_string: None,
            value_codeable_concept: None,
            value_period: None,
            value_reference: None,
            extension: Vec::new(),
            other: BTreeMap::new(),
        };
        match ext.value {
            ExtensionValue::Boolean(b) => wire.value_boolean = Some(b),
            ExtensionValue::String(s) => wire.value_string = Some(s),
            ExtensionValue::CodeableConcept(cc) => wire.value_codeable_concept = Some(cc),
            ExtensionValue::Period(period) => wire.value_period = Some(period),
            ExtensionValue::Reference(reference) => wire.value_reference = Some(reference),
            ExtensionValue::Nested(children) => wire.extension = children,
            ExtensionValue::Other { element, value } => {
                wire.other.insert(element, value);
            }
        }
        wire
    }
}
