//! Shared test fixtures.

use serde_json::{json, Value};

use crate::models::DatasetMetadataRecord;

/// Raw contribution form input that passes validation.
pub fn valid_input() -> Value {
    json!({
        "name": "DeepACSA_2022",
        "doi": "10.17605/OSF.IO/A3U4V",
        "version": "1.0",
        "muscles": ["Rectus Femoris", "Vastus Lateralis"],
        "muscleRegions": ["proximal", "middle", "distal"],
        "devices": ["Siemens Acuson Juniper"],
        "transducer": "12L3 Acuson, SL10-2",
        "captureType": "Image",
        "fileTypes": ["tif"],
        "imageTypes": "Panoramic",
        "imageCount": "1772",
        "videoCount": 0,
        "dataPlanes": ["Transverse"],
        "scanningFrequencyMHz": 0,
        "samplingRateFps": "",
        "participantAge": 38.2,
        "participantHeightCm": 0,
        "participantBodyMassKg": null,
        "participantSex": "Both",
        "sampleSize": 153,
        "hasLabels": true,
        "labelDescription": "Binary masks of the whole muscle cross-sectional area.",
        "shortDescription": "Panoramic ultrasound images of the quadriceps and triceps surae muscles.",
        "year": "2022",
        "publicationLink": "https://journals.lww.com/acsm-msse/fulltext/2022/12000/deepacsa.aspx",
        "datasetLink": "https://osf.io/a3u4v/",
        "authors": "Paul Ritsche, Philipp Wirth, Neil J. Cronin",
        "contactEmails": "paul.ritsche@unibas.ch",
        "license": "Apache License 2.0"
    })
}

/// A normalized record, as stored in the catalog.
pub fn sample_record() -> DatasetMetadataRecord {
    DatasetMetadataRecord {
        name: "DeepACSA_2022".into(),
        doi: Some("10.17605/OSF.IO/A3U4V".into()),
        version: "1.0".into(),
        muscles: vec!["Rectus Femoris".into(), "Vastus Lateralis".into()],
        muscle_regions: vec!["proximal".into(), "middle".into()],
        devices: vec!["Siemens Acuson Juniper".into()],
        transducer: vec![],
        capture_type: "Image".into(),
        file_types: vec!["tif".into()],
        image_types: vec!["Panoramic".into()],
        image_count: Some(1772),
        video_count: None,
        data_planes: vec!["Transverse".into()],
        scanning_frequency_mhz: None,
        sampling_rate_fps: None,
        participant_age: Some(38.2),
        participant_height_cm: None,
        participant_body_mass_kg: None,
        participant_sex: "Both".into(),
        sample_size: 153,
        has_labels: true,
        label_description: None,
        short_description: "Panoramic images of the quadriceps muscles.".into(),
        year: "2022".into(),
        publication_link: None,
        dataset_link: "https://osf.io/a3u4v/".into(),
        authors: vec!["Paul Ritsche".into()],
        contact_emails: vec!["paul.ritsche@unibas.ch".into()],
        license: "Apache License 2.0".into(),
    }
}

/// A record with the given name, muscles and devices, everything else from
/// [`sample_record`].
pub fn record_with(name: &str, muscles: &[&str], devices: &[&str]) -> DatasetMetadataRecord {
    DatasetMetadataRecord {
        name: name.to_string(),
        muscles: muscles.iter().map(|m| m.to_string()).collect(),
        devices: devices.iter().map(|d| d.to_string()).collect(),
        ..sample_record()
    }
}
