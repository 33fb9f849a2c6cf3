//! Declarative field table for dataset metadata.
//!
//! Every field of [`DatasetMetadataRecord`](crate::models::DatasetMetadataRecord)
//! has one [`FieldSpec`] entry describing whether it is required, which
//! [`FieldKind`] family it belongs to and the constraints of that family.
//! [`crate::validation::validate`] interprets this table in declaration order.
//!
//! The same table drives:
//!
//! - [`describe`] - a serializable description for form renderers
//! - [`document_schema`] - a JSON Schema (draft 7) for stored documents

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::Field;
use crate::vocab;

/// Maximum length, in characters, of free-text descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 500;

// =============================================================================
// Patterns
// =============================================================================

/// Deterministic format checks for pattern-string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `10.NNNN/suffix`
    Doi,
    /// `MAJOR.MINOR[.PATCH]`
    Version,
    /// 4-digit year
    Year,
    /// `Name_YYYY`
    DatasetName,
    /// `http(s)://...`
    Url,
    /// `local@domain.tld`
    Email,
}

static DOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^10\.\d{4,9}/[-._;()/:A-Za-z0-9]+$").expect("valid DOI regex"));
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+(?:\.\d+)?$").expect("valid version regex"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid year regex"));
static DATASET_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+_\d{4}$").expect("valid dataset name regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid URL regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

impl Pattern {
    pub fn regex(&self) -> &'static Regex {
        match self {
            Pattern::Doi => &DOI_RE,
            Pattern::Version => &VERSION_RE,
            Pattern::Year => &YEAR_RE,
            Pattern::DatasetName => &DATASET_NAME_RE,
            Pattern::Url => &URL_RE,
            Pattern::Email => &EMAIL_RE,
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex().is_match(value)
    }

    /// Short description used in error messages.
    pub fn expectation(&self) -> &'static str {
        match self {
            Pattern::Doi => "a DOI such as 10.17605/OSF.IO/A3U4V",
            Pattern::Version => "a version such as 1.0 or 1.2.3",
            Pattern::Year => "a 4-digit year",
            Pattern::DatasetName => "a name followed by an underscore and a 4-digit year, e.g. DeepACSA_2022",
            Pattern::Url => "an http(s) URL",
            Pattern::Email => "an email address such as name@domain.org",
        }
    }
}

// =============================================================================
// Field Kinds
// =============================================================================

/// Family of a field and the constraints of that family.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free text, optionally bounded in length.
    Text { max_len: Option<usize> },
    /// Single string checked against a pattern.
    Formatted(Pattern),
    /// Single value from a closed vocabulary.
    Choice(&'static [&'static str]),
    /// Set of values from a closed vocabulary.
    ChoiceSet(&'static [&'static str]),
    /// List of free-text entries.
    TextList,
    /// List of strings each checked against a pattern.
    FormattedList(Pattern),
    /// Non-negative integer within inclusive bounds.
    Integer { min: u64, max: Option<u64> },
    /// Decimal within inclusive bounds.
    Number { min: f64, max: f64 },
    Bool,
}

impl FieldKind {
    pub fn family(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Formatted(_) => "formatted",
            FieldKind::Choice(_) => "choice",
            FieldKind::ChoiceSet(_) => "choiceSet",
            FieldKind::TextList => "textList",
            FieldKind::FormattedList(_) => "formattedList",
            FieldKind::Integer { .. } => "integer",
            FieldKind::Number { .. } => "number",
            FieldKind::Bool => "bool",
        }
    }
}

/// One row of the field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// Required fields must be present and non-blank; required sets non-empty.
    pub required: bool,
    pub kind: FieldKind,
    /// A literal `0` means "not provided" and normalizes to absent.
    pub zero_is_absent: bool,
    /// Values below this floor are rejected as implausible.
    pub plausible_min: Option<f64>,
    pub description: &'static str,
}

const fn spec(field: Field, required: bool, kind: FieldKind, description: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        required,
        kind,
        zero_is_absent: false,
        plausible_min: None,
        description,
    }
}

const fn optional_measure(
    field: Field,
    kind: FieldKind,
    plausible_min: Option<f64>,
    description: &'static str,
) -> FieldSpec {
    FieldSpec {
        field,
        required: false,
        kind,
        zero_is_absent: true,
        plausible_min,
        description,
    }
}

/// The field table, in declaration order.
pub static FIELDS: [FieldSpec; 29] = [
    spec(Field::Name, true, FieldKind::Formatted(Pattern::DatasetName),
        "Dataset name and year separated by an underscore, e.g. DeepACSA_2022."),
    spec(Field::Doi, false, FieldKind::Formatted(Pattern::Doi),
        "Digital Object Identifier of the dataset."),
    spec(Field::Version, true, FieldKind::Formatted(Pattern::Version),
        "Version of the dataset."),
    spec(Field::Muscles, true, FieldKind::ChoiceSet(vocab::MUSCLES),
        "Muscles included in the dataset."),
    spec(Field::MuscleRegions, true, FieldKind::ChoiceSet(vocab::MUSCLE_REGIONS),
        "Muscle regions included in the dataset."),
    spec(Field::Devices, false, FieldKind::ChoiceSet(vocab::DEVICES),
        "Ultrasound devices used to collect the data."),
    spec(Field::Transducer, false, FieldKind::TextList,
        "Transducers (probes) used, comma separated."),
    spec(Field::CaptureType, true, FieldKind::Choice(vocab::CAPTURE_TYPES),
        "Type of data: Image, Video or Volume."),
    spec(Field::FileTypes, true, FieldKind::ChoiceSet(vocab::FILE_TYPES),
        "File formats of the data."),
    spec(Field::ImageTypes, true, FieldKind::ChoiceSet(vocab::IMAGE_TYPES),
        "Image types: Static, Panoramic."),
    optional_measure(Field::ImageCount, FieldKind::Integer { min: 0, max: None }, None,
        "Number of images."),
    optional_measure(Field::VideoCount, FieldKind::Integer { min: 0, max: None }, None,
        "Number of videos."),
    spec(Field::DataPlanes, true, FieldKind::ChoiceSet(vocab::DATA_PLANES),
        "Planes in which the images were collected."),
    optional_measure(Field::ScanningFrequencyMhz, FieldKind::Integer { min: 0, max: Some(100) }, None,
        "Scanning frequency in MHz (0-100)."),
    optional_measure(Field::SamplingRateFps, FieldKind::Integer { min: 0, max: Some(1000) }, None,
        "Sampling rate in frames per second (0-1000)."),
    optional_measure(Field::ParticipantAge, FieldKind::Number { min: 0.0, max: 100.0 }, None,
        "Mean age of participants in years."),
    optional_measure(Field::ParticipantHeightCm, FieldKind::Number { min: 0.0, max: 220.0 }, Some(50.0),
        "Mean height of participants in cm."),
    optional_measure(Field::ParticipantBodyMassKg, FieldKind::Number { min: 0.0, max: 200.0 }, Some(10.0),
        "Mean body mass of participants in kg."),
    spec(Field::ParticipantSex, true, FieldKind::Choice(vocab::PARTICIPANT_SEX),
        "Sex of participants: Male, Female or Both."),
    spec(Field::SampleSize, true, FieldKind::Integer { min: 0, max: None },
        "Number of participants."),
    spec(Field::HasLabels, true, FieldKind::Bool,
        "Whether labels are provided with the data."),
    spec(Field::LabelDescription, false, FieldKind::Text { max_len: Some(MAX_DESCRIPTION_LEN) },
        "Description of the labels."),
    spec(Field::ShortDescription, true, FieldKind::Text { max_len: Some(MAX_DESCRIPTION_LEN) },
        "Brief description of the dataset."),
    spec(Field::Year, true, FieldKind::Formatted(Pattern::Year),
        "Year the dataset was created."),
    spec(Field::PublicationLink, false, FieldKind::Formatted(Pattern::Url),
        "Link to the publication describing the data."),
    spec(Field::DatasetLink, true, FieldKind::Formatted(Pattern::Url),
        "Link to the dataset."),
    spec(Field::Authors, true, FieldKind::TextList,
        "Authors of the dataset, comma separated."),
    spec(Field::ContactEmails, true, FieldKind::FormattedList(Pattern::Email),
        "Contact emails of the authors, comma separated."),
    spec(Field::License, true, FieldKind::Choice(vocab::LICENSES),
        "License under which the data is shared."),
];

/// Table entry of a field.
pub fn spec_for(field: Field) -> &'static FieldSpec {
    // FIELDS is indexed in the same order as Field::ALL.
    &FIELDS[field as usize]
}

// =============================================================================
// Description
// =============================================================================

/// Serializable description of one field, for form renderers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescription {
    pub name: &'static str,
    pub required: bool,
    pub family: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plausible_min: Option<f64>,
    pub zero_is_absent: bool,
}

/// Describe every field in declaration order.
pub fn describe() -> Vec<FieldDescription> {
    FIELDS
        .iter()
        .map(|spec| {
            let mut desc = FieldDescription {
                name: spec.field.name(),
                required: spec.required,
                family: spec.kind.family(),
                description: spec.description,
                vocabulary: None,
                pattern: None,
                min: None,
                max: None,
                max_length: None,
                plausible_min: spec.plausible_min,
                zero_is_absent: spec.zero_is_absent,
            };
            match spec.kind {
                FieldKind::Text { max_len } => desc.max_length = max_len,
                FieldKind::Formatted(p) | FieldKind::FormattedList(p) => {
                    desc.pattern = Some(p.regex().as_str())
                }
                FieldKind::Choice(v) | FieldKind::ChoiceSet(v) => desc.vocabulary = Some(v),
                FieldKind::Integer { min, max } => {
                    desc.min = Some(min as f64);
                    desc.max = max.map(|m| m as f64);
                }
                FieldKind::Number { min, max } => {
                    desc.min = Some(min);
                    desc.max = Some(max);
                }
                FieldKind::TextList | FieldKind::Bool => {}
            }
            desc
        })
        .collect()
}

// =============================================================================
// Stored Document Schema
// =============================================================================

/// JSON Schema (draft 7) of a persisted record.
///
/// Stricter on shape than on content: it checks types, required keys and
/// vocabularies, which is enough to reject documents edited by hand into an
/// unusable state.
pub fn document_schema() -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for spec in FIELDS.iter() {
        let min_items = if spec.required { 1 } else { 0 };
        let property = match spec.kind {
            FieldKind::Text { max_len } => match max_len {
                Some(n) => json!({ "type": "string", "maxLength": n }),
                None => json!({ "type": "string" }),
            },
            FieldKind::Formatted(p) => json!({ "type": "string", "pattern": p.regex().as_str() }),
            FieldKind::Choice(v) => json!({ "type": "string", "enum": v }),
            FieldKind::ChoiceSet(v) => json!({
                "type": "array",
                "items": { "type": "string", "enum": v },
                "minItems": min_items
            }),
            FieldKind::TextList => json!({
                "type": "array",
                "items": { "type": "string" },
                "minItems": min_items
            }),
            FieldKind::FormattedList(p) => json!({
                "type": "array",
                "items": { "type": "string", "pattern": p.regex().as_str() },
                "minItems": min_items
            }),
            FieldKind::Integer { min, max } => match max {
                Some(max) => json!({ "type": "integer", "minimum": min, "maximum": max }),
                None => json!({ "type": "integer", "minimum": min }),
            },
            FieldKind::Number { min, max } => json!({ "type": "number", "minimum": min, "maximum": max }),
            FieldKind::Bool => json!({ "type": "boolean" }),
        };
        properties.insert(spec.field.name().to_string(), property);
        if spec.required {
            required.push(spec.field.name());
        }
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "UMUD dataset metadata record",
        "type": "object",
        "required": required,
        "properties": properties
    })
}
