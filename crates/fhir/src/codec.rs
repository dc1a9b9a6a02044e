//! Field codecs: one record primitive ⇄ one extension.
//!
//! Every codec implements [`FieldCodec`]. Encoding may decline to produce an extension (for
//! example a code outside the value set); decoding never fails, it degrades to `None` when
//! the wire shape is not what the codec expects.

use crate::datatypes::{CodeableValue, Coding, Extension, ExtensionValue, Period, Reference};
use crate::valueset::{self, ValueSet};
use chrono::{DateTime, NaiveDate, Utc};

/// Nested URL of the registration period inside the registration details group.
pub const REGISTRATION_PERIOD_URL: &str = "registrationPeriod";

/// Nested URL of the registration type inside the registration details group.
pub const REGISTRATION_TYPE_URL: &str = "registrationType";

/// Nested URL of the preferred branch surgery inside the registration details group.
pub const PREFERRED_BRANCH_URL: &str = "preferredBranchSurgery";

/// Encode/decode contract shared by all field codecs.
pub trait FieldCodec {
    /// The record-side value this codec carries.
    type Value;

    /// Encodes `value` as an extension, or `None` if it must not be emitted.
    fn encode(&self, value: &Self::Value) -> Option<Extension>;

    /// Decodes the value from the first matching extension in `extensions`.
    fn decode(&self, extensions: &[Extension]) -> Option<Self::Value>;
}

// ============================================================================
// Boolean
// ============================================================================

/// Wraps a boolean in a `valueBoolean` extension.
#[derive(Clone, Debug)]
pub struct BooleanFieldCodec {
    url: String,
}

impl BooleanFieldCodec {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FieldCodec for BooleanFieldCodec {
    type Value = bool;

    fn encode(&self, value: &bool) -> Option<Extension> {
        Some(Extension::new(self.url.clone(), ExtensionValue::Boolean(*value)))
    }

    fn decode(&self, extensions: &[Extension]) -> Option<bool> {
        Extension::first_with_url(extensions, &self.url)?.as_bool()
    }
}

// ============================================================================
// Coded concept
// ============================================================================

/// Carries a single code from a closed value set as a `valueCodeableConcept` extension.
#[derive(Clone, Debug)]
pub struct CodedConceptFieldCodec {
    url: String,
    value_set: &'static ValueSet,
}

impl CodedConceptFieldCodec {
    /// The codec's code system is the value set's system.
    pub fn new(url: impl Into<String>, value_set: &'static ValueSet) -> Self {
        Self {
            url: url.into(),
            value_set,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn value_set(&self) -> &'static ValueSet {
        self.value_set
    }

    /// Builds the coding for a member code, or `None` for a non-member.
    pub fn coding_for(&self, code: &str) -> Option<Coding> {
        let display = self.value_set.display(code)?;
        Some(Coding::new(self.value_set.system(), code, Some(display)))
    }
}

impl FieldCodec for CodedConceptFieldCodec {
    type Value = String;

    fn encode(&self, code: &String) -> Option<Extension> {
        let Some(coding) = self.coding_for(code) else {
            tracing::debug!(
                url = %self.url,
                value_set = self.value_set.name(),
                code = %code,
                "dropping code outside value set"
            );
            return None;
        };
        Some(Extension::new(
            self.url.clone(),
            ExtensionValue::CodeableConcept(CodeableValue::single(coding)),
        ))
    }

    fn decode(&self, extensions: &[Extension]) -> Option<String> {
        let coding = Extension::first_with_url(extensions, &self.url)?
            .as_codeable_concept()?
            .first_coding()?;

        if coding.system.as_deref() != Some(self.value_set.system()) {
            return None;
        }
        let code = coding.code.as_deref()?;
        self.value_set.contains(code).then(|| code.to_string())
    }
}

// ============================================================================
// Composite registration details
// ============================================================================

/// Record-side view of the registration details group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationDetails {
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub registration_type: Option<String>,
    pub preferred_branch: Option<String>,
}

/// Encodes [`RegistrationDetails`] as one composite extension with nested children.
///
/// The outer extension is always emitted, even when every child is absent.
#[derive(Clone, Debug)]
pub struct CompositeRegistrationCodec {
    url: String,
    registration_type: CodedConceptFieldCodec,
}

impl CompositeRegistrationCodec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            registration_type: CodedConceptFieldCodec::new(
                REGISTRATION_TYPE_URL,
                valueset::registration_type(),
            ),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FieldCodec for CompositeRegistrationCodec {
    type Value = RegistrationDetails;

    fn encode(&self, details: &RegistrationDetails) -> Option<Extension> {
        let mut children = Vec::with_capacity(3);

        if details.period_start.is_some() || details.period_end.is_some() {
            let period = Period {
                start: details.period_start.as_ref().map(format_instant),
                end: details.period_end.as_ref().map(format_instant),
            };
            children.push(Extension::new(
                REGISTRATION_PERIOD_URL,
                ExtensionValue::Period(period),
            ));
        }

        if let Some(ext) = details
            .registration_type
            .as_ref()
            .and_then(|code| self.registration_type.encode(code))
        {
            children.push(ext);
        }

        if let Some(branch) = &details.preferred_branch {
            children.push(Extension::new(
                PREFERRED_BRANCH_URL,
                ExtensionValue::Reference(Reference::to(branch.clone())),
            ));
        }

        Some(Extension::new(
            self.url.clone(),
            ExtensionValue::Nested(children),
        ))
    }

    fn decode(&self, extensions: &[Extension]) -> Option<RegistrationDetails> {
        let children = Extension::first_with_url(extensions, &self.url)?.as_nested()?;

        let period = Extension::first_with_url(children, REGISTRATION_PERIOD_URL)
            .and_then(Extension::as_period);

        Some(RegistrationDetails {
            period_start: period
                .and_then(|p| p.start.as_deref())
                .and_then(parse_instant),
            period_end: period
                .and_then(|p| p.end.as_deref())
                .and_then(parse_instant),
            registration_type: self.registration_type.decode(children),
            preferred_branch: Extension::first_with_url(children, PREFERRED_BRANCH_URL)
                .and_then(Extension::as_reference)
                .and_then(|r| r.reference.clone()),
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Renders an instant in the FHIR `dateTime` form (RFC 3339).
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

/// Parses a FHIR `dateTime`.
///
/// Full RFC 3339 timestamps are converted to UTC; a bare `YYYY-MM-DD` date is taken as
/// midnight UTC. Anything else yields `None`.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valueset::{ethnic_category, ETHNIC_CATEGORY_SYSTEM};

    const ETHNIC_URL: &str = "ext:ethnic-category";

    fn coded_extension(url: &str, system: &str, code: &str) -> Extension {
        Extension::new(
            url,
            ExtensionValue::CodeableConcept(CodeableValue::single(Coding::new(
                system,
                code,
                None::<String>,
            ))),
        )
    }

    #[test]
    fn boolean_codec_wraps_and_unwraps() {
        let codec = BooleanFieldCodec::new("ext:donor");
        let ext = codec.encode(&true).expect("always encodes");
        assert_eq!(ext.url, "ext:donor");
        assert_eq!(codec.decode(&[ext]), Some(true));
    }

    #[test]
    fn boolean_codec_requires_boolean_variant() {
        let codec = BooleanFieldCodec::new("ext:donor");
        let ext = Extension::new("ext:donor", ExtensionValue::String("true".into()));
        assert_eq!(codec.decode(&[ext]), None);
        assert_eq!(codec.decode(&[]), None);
    }

    #[test]
    fn codecs_treat_uninterpreted_values_as_absent() {
        let other = |url: &str| {
            Extension::new(
                url,
                ExtensionValue::Other {
                    element: "valueDateTime".into(),
                    value: serde_json::json!("2019-04-01"),
                },
            )
        };

        let boolean = BooleanFieldCodec::new("ext:donor");
        assert_eq!(boolean.decode(&[other("ext:donor")]), None);

        let coded = CodedConceptFieldCodec::new(ETHNIC_URL, ethnic_category());
        assert_eq!(coded.decode(&[other(ETHNIC_URL)]), None);

        let registration = CompositeRegistrationCodec::new("ext:registration");
        assert_eq!(registration.decode(&[other("ext:registration")]), None);
    }

    #[test]
    fn coded_codec_encodes_member_with_display() {
        let codec = CodedConceptFieldCodec::new(ETHNIC_URL, ethnic_category());
        let ext = codec.encode(&"B".to_string()).expect("member code");

        let coding = ext
            .as_codeable_concept()
            .and_then(CodeableValue::first_coding)
            .expect("coding");
        assert_eq!(coding.system.as_deref(), Some(ETHNIC_CATEGORY_SYSTEM));
        assert_eq!(coding.code.as_deref(), Some("B"));
        assert_eq!(coding.display.as_deref(), Some("Irish"));
    }

    #[test]
    fn coded_codec_drops_non_member() {
        let codec = CodedConceptFieldCodec::new(ETHNIC_URL, ethnic_category());
        assert!(codec.encode(&"NOT-A-CODE".to_string()).is_none());

        let ext = coded_extension(ETHNIC_URL, ETHNIC_CATEGORY_SYSTEM, "NOT-A-CODE");
        assert_eq!(codec.decode(&[ext]), None);
    }

    #[test]
    fn coded_codec_requires_matching_system() {
        let codec = CodedConceptFieldCodec::new(ETHNIC_URL, ethnic_category());
        let ext = coded_extension(ETHNIC_URL, "http://example.org/other", "A");
        assert_eq!(codec.decode(&[ext]), None);

        let ext = coded_extension(ETHNIC_URL, ETHNIC_CATEGORY_SYSTEM, "A");
        assert_eq!(codec.decode(&[ext]), Some("A".to_string()));
    }

    #[test]
    fn coded_codec_reads_only_first_coding_of_first_extension() {
        let codec = CodedConceptFieldCodec::new(ETHNIC_URL, ethnic_category());
        let first = Extension::new(
            ETHNIC_URL,
            ExtensionValue::CodeableConcept(CodeableValue {
                coding: vec![
                    Coding::new("http://example.org/other", "A", None::<String>),
                    Coding::new(ETHNIC_CATEGORY_SYSTEM, "B", None::<String>),
                ],
                text: None,
            }),
        );
        let second = coded_extension(ETHNIC_URL, ETHNIC_CATEGORY_SYSTEM, "C");
        assert_eq!(codec.decode(&[first, second]), None);
    }

    #[test]
    fn registration_codec_always_emits_outer_group() {
        let codec = CompositeRegistrationCodec::new("ext:registration");
        let ext = codec
            .encode(&RegistrationDetails::default())
            .expect("always encodes");
        assert_eq!(ext.url, "ext:registration");
        assert_eq!(ext.as_nested(), Some(&[][..]));

        let decoded = codec.decode(&[ext]).expect("group present");
        assert_eq!(decoded, RegistrationDetails::default());
    }

    #[test]
    fn registration_codec_round_trips_all_children() {
        let codec = CompositeRegistrationCodec::new("ext:registration");
        let details = RegistrationDetails {
            period_start: parse_instant("2019-04-01T09:30:00Z"),
            period_end: None,
            registration_type: Some("T".into()),
            preferred_branch: Some("Location/branch-1".into()),
        };

        let ext = codec.encode(&details).expect("encodes");
        let children = ext.as_nested().expect("nested");
        let urls: Vec<_> = children.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![REGISTRATION_PERIOD_URL, REGISTRATION_TYPE_URL, PREFERRED_BRANCH_URL]
        );

        assert_eq!(codec.decode(&[ext]), Some(details));
    }

    #[test]
    fn registration_codec_decodes_children_independently() {
        let codec = CompositeRegistrationCodec::new("ext:registration");
        let outer = Extension::new(
            "ext:registration",
            ExtensionValue::Nested(vec![
                // wrong value type for the period child
                Extension::new(REGISTRATION_PERIOD_URL, ExtensionValue::Boolean(true)),
                Extension::new(
                    PREFERRED_BRANCH_URL,
                    ExtensionValue::Reference(Reference::to("Location/7")),
                ),
            ]),
        );

        let decoded = codec.decode(&[outer]).expect("group present");
        assert_eq!(decoded.period_start, None);
        assert_eq!(decoded.registration_type, None);
        assert_eq!(decoded.preferred_branch.as_deref(), Some("Location/7"));
    }

    #[test]
    fn registration_codec_drops_unknown_registration_type() {
        let codec = CompositeRegistrationCodec::new("ext:registration");
        let details = RegistrationDetails {
            registration_type: Some("ZZ".into()),
            ..RegistrationDetails::default()
        };
        let ext = codec.encode(&details).expect("outer always emitted");
        assert_eq!(ext.as_nested().map(<[Extension]>::len), Some(0));
    }

    #[test]
    fn parse_instant_accepts_date_only_and_rejects_garbage() {
        let midnight = parse_instant("2020-02-29").expect("date");
        assert_eq!(format_instant(&midnight), "2020-02-29T00:00:00+00:00");

        let offset = parse_instant("2020-02-29T10:00:00+01:00").expect("offset");
        assert_eq!(format_instant(&offset), "2020-02-29T09:00:00+00:00");

        assert!(parse_instant("yesterday").is_none());
    }
}
