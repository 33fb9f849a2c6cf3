//! Metadata validation for contributed datasets.
//!
//! [`validate`] interprets the field table in [`crate::schema::FIELDS`] in
//! declaration order. For every field it applies, in sequence:
//!
//! 1. presence - required fields must be present and non-blank
//! 2. coercion - numeric strings to numbers, comma separated strings to lists
//! 3. sentinel - a literal `0` on optional measures becomes "absent"
//! 4. vocabulary - case-sensitive membership in the closed vocabulary
//! 5. range - inclusive numeric bounds
//! 6. format - DOI, version, year, dataset name, URL and email patterns
//! 7. plausibility - height and body mass floors
//!
//! The first failing step ends the checks of that field, but validation never
//! stops at the first field: every field error of the record is collected so a
//! contributor sees all problems at once.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use umud::validate;
//!
//! let errors = validate(&json!({ "name": "DeepACSA" })).unwrap_err();
//! assert!(errors.iter().any(|e| e.field == "name"));
//! ```

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{FieldError, Rule};
use crate::models::{DatasetMetadataRecord, Field};
use crate::schema::{FieldKind, FieldSpec, Pattern, FIELDS};

/// A field value after coercion and normalization.
#[derive(Debug, Clone, PartialEq)]
enum Normalized {
    Text(String),
    List(Vec<String>),
    Integer(u64),
    Number(f64),
    Bool(bool),
}

/// Validate and normalize a raw metadata mapping.
///
/// Keys may use the persisted camelCase names, singular shorthands or the
/// legacy upper-snake names (see [`Field::parse`]); unknown keys are ignored.
/// A non-object input is treated as an empty mapping.
pub fn validate(raw: &Value) -> Result<DatasetMetadataRecord, Vec<FieldError>> {
    let input = index_input(raw);
    let mut values = HashMap::new();
    let mut errors = Vec::new();

    for spec in FIELDS.iter() {
        match check_field(spec, input.get(&spec.field).copied()) {
            Ok(Some(value)) => {
                values.insert(spec.field, value);
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(assemble(Values(values)))
    } else {
        debug!(errors = errors.len(), "metadata record rejected");
        Err(errors)
    }
}

/// Quick check: returns just true/false.
pub fn is_valid(raw: &Value) -> bool {
    validate(raw).is_ok()
}

/// Validate a batch of records.
///
/// Returns the accepted records and, for every rejected one, its index in the
/// input with its field errors.
pub fn validate_many(
    raws: &[Value],
) -> (Vec<DatasetMetadataRecord>, Vec<(usize, Vec<FieldError>)>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (i, raw) in raws.iter().enumerate() {
        match validate(raw) {
            Ok(record) => accepted.push(record),
            Err(errors) => rejected.push((i, errors)),
        }
    }

    (accepted, rejected)
}

// =============================================================================
// Input Indexing
// =============================================================================

fn index_input(raw: &Value) -> HashMap<Field, &Value> {
    let mut input = HashMap::new();
    let Some(obj) = raw.as_object() else {
        return input;
    };

    for (key, value) in obj {
        match Field::parse(key) {
            // The persisted name wins over an alias of the same field.
            Some(field) if key == field.name() || !input.contains_key(&field) => {
                input.insert(field, value);
            }
            Some(_) => {}
            None => debug!(key = %key, "ignoring unknown metadata key"),
        }
    }

    input
}

// =============================================================================
// Field Checks
// =============================================================================

fn check_field(spec: &FieldSpec, raw: Option<&Value>) -> Result<Option<Normalized>, FieldError> {
    let name = spec.field.name();

    let raw = match raw {
        Some(v) if !is_blank(v) => v,
        other => {
            return if spec.required {
                Err(FieldError::new(
                    name,
                    Rule::Missing,
                    other.unwrap_or(&Value::Null),
                    "required field is missing or empty",
                ))
            } else {
                Ok(None)
            };
        }
    };

    match spec.kind {
        FieldKind::Text { max_len } => {
            let text = scalar_string(raw).ok_or_else(|| wrong_type(name, raw, "text"))?;
            if let Some(max) = max_len {
                let len = text.chars().count();
                if len > max {
                    return Err(FieldError::new(
                        name,
                        Rule::TooLong,
                        raw,
                        format!("{} characters, at most {} allowed", len, max),
                    ));
                }
            }
            Ok(Some(Normalized::Text(text)))
        }

        FieldKind::Formatted(pattern) => {
            // A JSON number has already lost its trailing zeros (1.10 reads as 1.1).
            if pattern == Pattern::Version && raw.is_number() {
                return Err(wrong_type(name, raw, "a string such as \"1.10\""));
            }
            let text = scalar_string(raw).ok_or_else(|| wrong_type(name, raw, "text"))?;
            if !pattern.is_match(&text) {
                return Err(FieldError::new(
                    name,
                    Rule::InvalidFormat,
                    raw,
                    format!("expected {}", pattern.expectation()),
                ));
            }
            Ok(Some(Normalized::Text(text)))
        }

        FieldKind::Choice(vocabulary) => {
            let text = match raw {
                Value::String(s) => s.trim().to_string(),
                _ => return Err(wrong_type(name, raw, "a single value")),
            };
            if !vocabulary.contains(&text.as_str()) {
                return Err(FieldError::new(
                    name,
                    Rule::NotInVocabulary,
                    raw,
                    format!("'{}' is not an accepted value", text),
                ));
            }
            Ok(Some(Normalized::Text(text)))
        }

        FieldKind::ChoiceSet(vocabulary) => {
            let items = list_items(raw).ok_or_else(|| wrong_type(name, raw, "a list of values"))?;
            if items.is_empty() {
                return empty_list(spec, raw);
            }
            let unknown: Vec<&str> = items
                .iter()
                .map(String::as_str)
                .filter(|item| !vocabulary.contains(item))
                .collect();
            if !unknown.is_empty() {
                return Err(FieldError::new(
                    name,
                    Rule::NotInVocabulary,
                    raw,
                    format!("not accepted: {}", unknown.join(", ")),
                ));
            }
            Ok(Some(Normalized::List(items)))
        }

        FieldKind::TextList => {
            let items = list_items(raw).ok_or_else(|| wrong_type(name, raw, "a list of text"))?;
            if items.is_empty() {
                return empty_list(spec, raw);
            }
            Ok(Some(Normalized::List(items)))
        }

        FieldKind::FormattedList(pattern) => {
            let items = list_items(raw).ok_or_else(|| wrong_type(name, raw, "a list of text"))?;
            if items.is_empty() {
                return empty_list(spec, raw);
            }
            let invalid: Vec<&str> = items
                .iter()
                .map(String::as_str)
                .filter(|item| !pattern.is_match(item))
                .collect();
            if !invalid.is_empty() {
                return Err(FieldError::new(
                    name,
                    Rule::InvalidFormat,
                    raw,
                    format!("expected {}, got: {}", pattern.expectation(), invalid.join(", ")),
                ));
            }
            Ok(Some(Normalized::List(items)))
        }

        FieldKind::Integer { min, max } => {
            let n = parse_integer(raw).ok_or_else(|| wrong_type(name, raw, "a whole number"))?;
            if spec.zero_is_absent && n == 0 {
                return Ok(None);
            }
            let above_max = max.is_some_and(|m| n > i128::from(m));
            if n < i128::from(min) || above_max {
                return Err(out_of_range(name, raw, min as f64, max.map(|m| m as f64)));
            }
            let n = u64::try_from(n)
                .map_err(|_| out_of_range(name, raw, min as f64, max.map(|m| m as f64)))?;
            check_plausible(spec, raw, n as f64)?;
            Ok(Some(Normalized::Integer(n)))
        }

        FieldKind::Number { min, max } => {
            let n = parse_number(raw).ok_or_else(|| wrong_type(name, raw, "a number"))?;
            if spec.zero_is_absent && n == 0.0 {
                return Ok(None);
            }
            if n < min || n > max {
                return Err(out_of_range(name, raw, min, Some(max)));
            }
            check_plausible(spec, raw, n)?;
            Ok(Some(Normalized::Number(n)))
        }

        FieldKind::Bool => parse_bool(raw)
            .map(|b| Some(Normalized::Bool(b)))
            .ok_or_else(|| wrong_type(name, raw, "true or false")),
    }
}

fn check_plausible(spec: &FieldSpec, raw: &Value, n: f64) -> Result<(), FieldError> {
    match spec.plausible_min {
        Some(floor) if n < floor => Err(FieldError::new(
            spec.field.name(),
            Rule::Implausible,
            raw,
            format!("{} is implausibly low, expected at least {}", n, floor),
        )),
        _ => Ok(()),
    }
}

fn empty_list(spec: &FieldSpec, raw: &Value) -> Result<Option<Normalized>, FieldError> {
    if spec.required {
        Err(FieldError::new(
            spec.field.name(),
            Rule::Missing,
            raw,
            "at least one value is required",
        ))
    } else {
        Ok(None)
    }
}

fn wrong_type(field: &str, raw: &Value, expected: &str) -> FieldError {
    FieldError::new(field, Rule::WrongType, raw, format!("expected {}", expected))
}

fn out_of_range(field: &str, raw: &Value, min: f64, max: Option<f64>) -> FieldError {
    let message = match max {
        Some(max) => format!("must be between {} and {}", min, max),
        None => format!("must be at least {}", min),
    };
    FieldError::new(field, Rule::OutOfRange, raw, message)
}

// =============================================================================
// Coercion
// =============================================================================

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        _ => false,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Materialize a list: strings are split on commas, arrays taken element by
/// element, a lone number becomes a one-element list. Empty tokens are
/// dropped and duplicates removed, keeping first-seen order.
fn list_items(value: &Value) -> Option<Vec<String>> {
    let tokens: Vec<String> = match value {
        Value::String(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(scalar_string)
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };

    let mut items: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !token.is_empty() && !items.contains(&token) {
            items.push(token);
        }
    }
    Some(items)
}

fn parse_integer(value: &Value) -> Option<i128> {
    let whole = |f: f64| (f.is_finite() && f.fract() == 0.0).then_some(f as i128);
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(i128::from)
            .or_else(|| n.as_i64().map(i128::from))
            .or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i128>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

// =============================================================================
// Assembly
// =============================================================================

struct Values(HashMap<Field, Normalized>);

impl Values {
    fn text(&mut self, field: Field) -> Option<String> {
        match self.0.remove(&field) {
            Some(Normalized::Text(s)) => Some(s),
            _ => None,
        }
    }

    fn list(&mut self, field: Field) -> Vec<String> {
        match self.0.remove(&field) {
            Some(Normalized::List(items)) => items,
            _ => Vec::new(),
        }
    }

    fn integer(&mut self, field: Field) -> Option<u64> {
        match self.0.remove(&field) {
            Some(Normalized::Integer(n)) => Some(n),
            _ => None,
        }
    }

    fn number(&mut self, field: Field) -> Option<f64> {
        match self.0.remove(&field) {
            Some(Normalized::Number(n)) => Some(n),
            _ => None,
        }
    }

    fn boolean(&mut self, field: Field) -> Option<bool> {
        match self.0.remove(&field) {
            Some(Normalized::Bool(b)) => Some(b),
            _ => None,
        }
    }
}

/// Build the record from checked values. Only called when every required
/// field produced a value.
fn assemble(mut v: Values) -> DatasetMetadataRecord {
    DatasetMetadataRecord {
        name: v.text(Field::Name).unwrap_or_default(),
        doi: v.text(Field::Doi),
        version: v.text(Field::Version).unwrap_or_default(),
        muscles: v.list(Field::Muscles),
        muscle_regions: v.list(Field::MuscleRegions),
        devices: v.list(Field::Devices),
        transducer: v.list(Field::Transducer),
        capture_type: v.text(Field::CaptureType).unwrap_or_default(),
        file_types: v.list(Field::FileTypes),
        image_types: v.list(Field::ImageTypes),
        image_count: v.integer(Field::ImageCount),
        video_count: v.integer(Field::VideoCount),
        data_planes: v.list(Field::DataPlanes),
        scanning_frequency_mhz: v.integer(Field::ScanningFrequencyMhz),
        sampling_rate_fps: v.integer(Field::SamplingRateFps),
        participant_age: v.number(Field::ParticipantAge),
        participant_height_cm: v.number(Field::ParticipantHeightCm),
        participant_body_mass_kg: v.number(Field::ParticipantBodyMassKg),
        participant_sex: v.text(Field::ParticipantSex).unwrap_or_default(),
        sample_size: v.integer(Field::SampleSize).unwrap_or_default(),
        has_labels: v.boolean(Field::HasLabels).unwrap_or_default(),
        label_description: v.text(Field::LabelDescription),
        short_description: v.text(Field::ShortDescription).unwrap_or_default(),
        year: v.text(Field::Year).unwrap_or_default(),
        publication_link: v.text(Field::PublicationLink),
        dataset_link: v.text(Field::DatasetLink).unwrap_or_default(),
        authors: v.list(Field::Authors),
        contact_emails: v.list(Field::ContactEmails),
        license: v.text(Field::License).unwrap_or_default(),
    }
}
