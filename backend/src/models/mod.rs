//! Domain models for the UMUD metadata catalog.
//!
//! - [`Field`] - every metadata field, in declaration order
//! - [`DatasetMetadataRecord`] - one validated, normalized catalog entry
//! - [`FieldValue`] - read-only view of a record field, used by queries and exports

use serde::{Deserialize, Serialize};

// =============================================================================
// Field
// =============================================================================

/// A metadata field of [`DatasetMetadataRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Doi,
    Version,
    Muscles,
    MuscleRegions,
    Devices,
    Transducer,
    CaptureType,
    FileTypes,
    ImageTypes,
    ImageCount,
    VideoCount,
    DataPlanes,
    ScanningFrequencyMhz,
    SamplingRateFps,
    ParticipantAge,
    ParticipantHeightCm,
    ParticipantBodyMassKg,
    ParticipantSex,
    SampleSize,
    HasLabels,
    LabelDescription,
    ShortDescription,
    Year,
    PublicationLink,
    DatasetLink,
    Authors,
    ContactEmails,
    License,
}

impl Field {
    /// All fields in declaration order.
    pub const ALL: [Field; 29] = [
        Field::Name,
        Field::Doi,
        Field::Version,
        Field::Muscles,
        Field::MuscleRegions,
        Field::Devices,
        Field::Transducer,
        Field::CaptureType,
        Field::FileTypes,
        Field::ImageTypes,
        Field::ImageCount,
        Field::VideoCount,
        Field::DataPlanes,
        Field::ScanningFrequencyMhz,
        Field::SamplingRateFps,
        Field::ParticipantAge,
        Field::ParticipantHeightCm,
        Field::ParticipantBodyMassKg,
        Field::ParticipantSex,
        Field::SampleSize,
        Field::HasLabels,
        Field::LabelDescription,
        Field::ShortDescription,
        Field::Year,
        Field::PublicationLink,
        Field::DatasetLink,
        Field::Authors,
        Field::ContactEmails,
        Field::License,
    ];

    /// Persisted (camelCase) key of the field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Doi => "doi",
            Self::Version => "version",
            Self::Muscles => "muscles",
            Self::MuscleRegions => "muscleRegions",
            Self::Devices => "devices",
            Self::Transducer => "transducer",
            Self::CaptureType => "captureType",
            Self::FileTypes => "fileTypes",
            Self::ImageTypes => "imageTypes",
            Self::ImageCount => "imageCount",
            Self::VideoCount => "videoCount",
            Self::DataPlanes => "dataPlanes",
            Self::ScanningFrequencyMhz => "scanningFrequencyMHz",
            Self::SamplingRateFps => "samplingRateFps",
            Self::ParticipantAge => "participantAge",
            Self::ParticipantHeightCm => "participantHeightCm",
            Self::ParticipantBodyMassKg => "participantBodyMassKg",
            Self::ParticipantSex => "participantSex",
            Self::SampleSize => "sampleSize",
            Self::HasLabels => "hasLabels",
            Self::LabelDescription => "labelDescription",
            Self::ShortDescription => "shortDescription",
            Self::Year => "year",
            Self::PublicationLink => "publicationLink",
            Self::DatasetLink => "datasetLink",
            Self::Authors => "authors",
            Self::ContactEmails => "contactEmails",
            Self::License => "license",
        }
    }

    /// Resolve a field from its persisted name, a singular shorthand or the
    /// upper-snake key used by legacy metadata documents.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Some(field) = Self::ALL.iter().find(|f| f.name() == key) {
            return Some(*field);
        }
        match key {
            "muscle" | "MUSCLE" => Some(Self::Muscles),
            "region" | "muscleRegion" | "MUSCLE_REGION" => Some(Self::MuscleRegions),
            "device" | "DEVICE" => Some(Self::Devices),
            "probe" | "PROBE" | "TRANSDUCER" => Some(Self::Transducer),
            "dataType" | "DATA_TYPE" => Some(Self::CaptureType),
            "fileType" | "FILE_TYPE" => Some(Self::FileTypes),
            "imageType" | "IMAGE_TYPE" => Some(Self::ImageTypes),
            "dataPlane" | "DATA_PLANE" => Some(Self::DataPlanes),
            "IMAGE_COUNT" => Some(Self::ImageCount),
            "VIDEO_COUNT" => Some(Self::VideoCount),
            "scanningFrequency" | "SCANNING_FREQUENCY" => Some(Self::ScanningFrequencyMhz),
            "samplingRate" | "SAMPLING_RATE" => Some(Self::SamplingRateFps),
            "PARTICIPANT_AGE" => Some(Self::ParticipantAge),
            "participantHeight" | "PARTICIPANT_HEIGHT" => Some(Self::ParticipantHeightCm),
            "participantWeight" | "PARTICIPANT_WEIGHT" => Some(Self::ParticipantBodyMassKg),
            "PARTICIPANT_SEX" => Some(Self::ParticipantSex),
            "SAMPLE_SIZE" => Some(Self::SampleSize),
            "DATA_LABELS" => Some(Self::HasLabels),
            "DATA_LABELS_DESCRIPTION" => Some(Self::LabelDescription),
            "SHORT_DESCRIPTION" => Some(Self::ShortDescription),
            "DATASET_YEAR" => Some(Self::Year),
            "PUBLICATION_LINK" => Some(Self::PublicationLink),
            "DATASET_LINK" => Some(Self::DatasetLink),
            "author" | "AUTHORS" => Some(Self::Authors),
            "contact" | "CONTACT" => Some(Self::ContactEmails),
            "DATASET_NAME" => Some(Self::Name),
            "DOI" => Some(Self::Doi),
            "VERSION" => Some(Self::Version),
            "LICENSE" => Some(Self::License),
            _ => None,
        }
    }

    /// Whether the field holds a collection of values.
    pub fn is_set_valued(&self) -> bool {
        matches!(
            self,
            Self::Muscles
                | Self::MuscleRegions
                | Self::Devices
                | Self::Transducer
                | Self::FileTypes
                | Self::ImageTypes
                | Self::DataPlanes
                | Self::Authors
                | Self::ContactEmails
        )
    }

    /// Whether the field holds a number.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::ImageCount
                | Self::VideoCount
                | Self::ScanningFrequencyMhz
                | Self::SamplingRateFps
                | Self::ParticipantAge
                | Self::ParticipantHeightCm
                | Self::ParticipantBodyMassKg
                | Self::SampleSize
        )
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Dataset Metadata Record
// =============================================================================

/// A validated catalog entry describing one contributed dataset.
///
/// Set-valued fields are de-duplicated and keep first-seen order. Optional
/// fields that are absent are omitted from the serialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadataRecord {
    /// `Name_YYYY` identifier, e.g. `DeepACSA_2022`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    pub version: String,
    pub muscles: Vec<String>,
    pub muscle_regions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transducer: Vec<String>,
    pub capture_type: String,
    pub file_types: Vec<String>,
    pub image_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_count: Option<u64>,
    pub data_planes: Vec<String>,
    #[serde(
        rename = "scanningFrequencyMHz",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scanning_frequency_mhz: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_rate_fps: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_body_mass_kg: Option<f64>,
    pub participant_sex: String,
    pub sample_size: u64,
    pub has_labels: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_description: Option<String>,
    pub short_description: String,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_link: Option<String>,
    pub dataset_link: String,
    pub authors: Vec<String>,
    pub contact_emails: Vec<String>,
    pub license: String,
}

impl DatasetMetadataRecord {
    /// View of a field; `None` when the field is absent or an empty set.
    pub fn get(&self, field: Field) -> Option<FieldValue<'_>> {
        fn text(s: &str) -> Option<FieldValue<'_>> {
            Some(FieldValue::Text(s))
        }
        fn list(items: &[String]) -> Option<FieldValue<'_>> {
            (!items.is_empty()).then_some(FieldValue::List(items))
        }

        match field {
            Field::Name => text(&self.name),
            Field::Doi => self.doi.as_deref().and_then(text),
            Field::Version => text(&self.version),
            Field::Muscles => list(&self.muscles),
            Field::MuscleRegions => list(&self.muscle_regions),
            Field::Devices => list(&self.devices),
            Field::Transducer => list(&self.transducer),
            Field::CaptureType => text(&self.capture_type),
            Field::FileTypes => list(&self.file_types),
            Field::ImageTypes => list(&self.image_types),
            Field::ImageCount => self.image_count.map(FieldValue::Integer),
            Field::VideoCount => self.video_count.map(FieldValue::Integer),
            Field::DataPlanes => list(&self.data_planes),
            Field::ScanningFrequencyMhz => self.scanning_frequency_mhz.map(FieldValue::Integer),
            Field::SamplingRateFps => self.sampling_rate_fps.map(FieldValue::Integer),
            Field::ParticipantAge => self.participant_age.map(FieldValue::Number),
            Field::ParticipantHeightCm => self.participant_height_cm.map(FieldValue::Number),
            Field::ParticipantBodyMassKg => self.participant_body_mass_kg.map(FieldValue::Number),
            Field::ParticipantSex => text(&self.participant_sex),
            Field::SampleSize => Some(FieldValue::Integer(self.sample_size)),
            Field::HasLabels => Some(FieldValue::Bool(self.has_labels)),
            Field::LabelDescription => self.label_description.as_deref().and_then(text),
            Field::ShortDescription => text(&self.short_description),
            Field::Year => text(&self.year),
            Field::PublicationLink => self.publication_link.as_deref().and_then(text),
            Field::DatasetLink => text(&self.dataset_link),
            Field::Authors => list(&self.authors),
            Field::ContactEmails => list(&self.contact_emails),
            Field::License => text(&self.license),
        }
    }
}

// =============================================================================
// Field Value
// =============================================================================

/// Borrowed value of a single record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Integer(u64),
    Number(f64),
    Bool(bool),
}

impl FieldValue<'_> {
    /// The value exploded into one canonical string per element.
    ///
    /// Scalars yield a single element; numbers use the shortest decimal form
    /// (`27.0` becomes `"27"`), so they compare equal to [`canonical_number`].
    pub fn elements(&self) -> Vec<String> {
        match self {
            FieldValue::Text(s) => vec![s.to_string()],
            FieldValue::List(items) => items.to_vec(),
            FieldValue::Integer(n) => vec![n.to_string()],
            FieldValue::Number(n) => vec![canonical_number(*n)],
            FieldValue::Bool(b) => vec![b.to_string()],
        }
    }

    /// Single-cell rendering, list elements joined with `", "`.
    pub fn display(&self) -> String {
        self.elements().join(", ")
    }

    /// The value as a float, for numeric fields only.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Shortest decimal rendering of a number.
pub fn canonical_number(n: f64) -> String {
    format!("{}", n)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_record;

    #[test]
    fn test_field_names_roundtrip() {
        for field in Field::ALL {
            assert_eq!(Field::parse(field.name()), Some(field));
        }
    }

    #[test]
    fn test_field_aliases() {
        assert_eq!(Field::parse("muscle"), Some(Field::Muscles));
        assert_eq!(Field::parse("DEVICE"), Some(Field::Devices));
        assert_eq!(Field::parse("PROBE"), Some(Field::Transducer));
        assert_eq!(Field::parse("DATASET_YEAR"), Some(Field::Year));
        assert_eq!(Field::parse("colour"), None);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["name"], "DeepACSA_2022");
        assert_eq!(json["muscleRegions"][0], "proximal");
        assert!(json.get("videoCount").is_none());
        assert!(json.get("transducer").is_none());
        assert!(json.get("scanningFrequencyMHz").is_none());
    }

    #[test]
    fn test_get_views() {
        let record = sample_record();
        assert_eq!(record.get(Field::Transducer), None);
        assert_eq!(record.get(Field::VideoCount), None);
        assert_eq!(
            record.get(Field::Muscles).unwrap().elements(),
            vec!["Rectus Femoris", "Vastus Lateralis"]
        );
        assert_eq!(record.get(Field::HasLabels), Some(FieldValue::Bool(true)));
        assert_eq!(record.get(Field::ParticipantAge).unwrap().display(), "38.2");
        assert_eq!(record.get(Field::ParticipantAge).and_then(|v| v.as_f64()), Some(38.2));
        assert_eq!(record.get(Field::Muscles).and_then(|v| v.as_f64()), None);
    }

    #[test]
    fn test_canonical_number() {
        assert_eq!(canonical_number(27.0), "27");
        assert_eq!(canonical_number(38.2), "38.2");
    }
}
