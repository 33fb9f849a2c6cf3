//! Closed vocabularies for enumerated metadata fields.
//!
//! Membership checks are case-sensitive exact matches. The tables are the
//! single source of truth for the contribution form, the validator and the
//! JSON schema used to check stored documents.
//!
//! - [`MUSCLES`] - lower limb, upper limb and trunk muscles
//! - [`MUSCLE_REGIONS`] - proximal, middle, distal, whole
//! - [`DEVICES`] - ultrasound device models
//! - [`CAPTURE_TYPES`] - Image, Video, Volume
//! - [`FILE_TYPES`] - file extensions, partitioned by [`FileFamily`]
//! - [`IMAGE_TYPES`], [`DATA_PLANES`], [`PARTICIPANT_SEX`]
//! - [`LICENSES`] - open data and software licenses

use serde::Serialize;

// =============================================================================
// Anatomy
// =============================================================================

pub const MUSCLES: &[&str] = &[
    // Lower limb
    "Rectus Femoris",
    "Vastus Lateralis",
    "Vastus Medialis",
    "Vastus Intermedius",
    "Biceps Femoris",
    "Semitendinosus",
    "Semimembranosus",
    "Gastrocnemius",
    "Gastrocnemius Medialis",
    "Gastrocnemius Lateralis",
    "Soleus",
    "Tibialis Anterior",
    "Peroneus Longus",
    "Flexor Hallucis Longus",
    "Extensor Hallucis Longus",
    "Flexor Digitorum Longus",
    "Extensor Digitorum Longus",
    "Gluteus Maximus",
    "Gluteus Medius",
    "Adductor Longus",
    "Achilles Tendon",
    // Upper limb
    "Biceps Brachii",
    "Triceps Brachii",
    "Deltoid",
    "Brachialis",
    "Brachioradialis",
    "Flexor Carpi Radialis",
    "Flexor Carpi Ulnaris",
    "Palmaris Longus",
    "Extensor Carpi Radialis",
    "Extensor Carpi Ulnaris",
    "Extensor Digitorum",
    "Pronator Teres",
    "Supinator",
    "Flexor Digitorum Superficialis",
    "Flexor Digitorum Profundus",
    // Trunk
    "Rectus Abdominis",
    "External Oblique",
    "Internal Oblique",
    "Transversus Abdominis",
    "Multifidus",
    "Erector Spinae",
    "Trapezius",
    "Pectoralis Major",
    "Diaphragm",
];

pub const MUSCLE_REGIONS: &[&str] = &["proximal", "middle", "distal", "whole"];

// =============================================================================
// Acquisition
// =============================================================================

pub const DEVICES: &[&str] = &[
    "GE Logiq E9",
    "GE Logiq E10",
    "GE Logiq S8",
    "GE Logiq P9",
    "GE Logiq e",
    "GE Voluson E10",
    "Siemens Acuson Juniper",
    "Siemens Acuson S2000",
    "Siemens Acuson S3000",
    "Siemens Acuson Sequoia",
    "Siemens Acuson X300",
    "Philips Affiniti 50",
    "Philips Affiniti 70",
    "Philips Epiq 5",
    "Philips Epiq 7",
    "Philips Lumify",
    "Philips iU22",
    "Esaote MyLab 25 Gold",
    "Esaote MyLab 50",
    "Esaote MyLab 70",
    "Esaote MyLab 9 eXP",
    "Esaote MyLab Twice",
    "Esaote MyLab Gamma",
    "BK Medical Flex Focus 800",
    "BK Medical Pro Focus 2202",
    "Canon Aplio 300",
    "Canon Aplio 400",
    "Canon Aplio i800",
    "Toshiba Aplio 500",
    "Alpinion E-CUBE 7",
    "Alpinion E-CUBE 8",
    "Alpinion E-CUBE 15",
    "Mindray Resona 7",
    "Mindray DC-80",
    "Mindray TE7",
    "Samsung HS50",
    "Samsung RS80A",
    "Samsung HM70A",
    "Hitachi Arietta 70",
    "Hitachi Noblus",
    "Hitachi Aloka Prosound Alpha 7",
    "Fujifilm Sonosite Edge II",
    "Fujifilm Sonosite M-Turbo",
    "Fujifilm Sonosite X-Porte",
    "SuperSonic Imagine Aixplorer",
    "SuperSonic Imagine Aixplorer Ultimate",
    "Terason uSmart 3200T",
    "Terason t3000",
    "Zonare ZS3",
    "Verasonics Vantage 128",
    "Verasonics Vantage 256",
    "Clarius L15 HD3",
    "Clarius L7 HD3",
    "Butterfly iQ+",
    "Interson SP-L01",
    "Telemed ArtUs EXT-1H",
    "Telemed ArtUs EXT-2H",
    "Telemed MicrUs Pro",
    "Telemed SmartUs EXT",
    "Telemed Echo Blaster 128",
    "Telemed LogicScan 128",
    "Telemed Voluson e10",
];

pub const CAPTURE_TYPES: &[&str] = &["Image", "Video", "Volume"];

pub const IMAGE_TYPES: &[&str] = &["Static", "Panoramic"];

pub const DATA_PLANES: &[&str] = &["Longitudinal", "Transverse"];

pub const PARTICIPANT_SEX: &[&str] = &["Male", "Female", "Both"];

// =============================================================================
// File Types
// =============================================================================

/// Conceptual partition of [`FILE_TYPES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFamily {
    Image,
    Video,
    Volume,
}

pub const IMAGE_FILE_TYPES: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif", "webp", "svg", "raw", "dcm",
];

pub const VIDEO_FILE_TYPES: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "mpeg", "mpg", "3gp", "asf", "c3d",
];

pub const VOLUME_FILE_TYPES: &[&str] = &[
    "nii", "nii.gz", "nrrd", "mha", "mhd", "vtk", "stl", "mat", "h5",
];

/// Every accepted file extension, image formats first.
pub const FILE_TYPES: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif", "webp", "svg", "raw", "dcm",
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "mpeg", "mpg", "3gp", "asf", "c3d",
    "nii", "nii.gz", "nrrd", "mha", "mhd", "vtk", "stl", "mat", "h5",
];

/// Family of a file extension, if it is part of the vocabulary.
pub fn file_family(extension: &str) -> Option<FileFamily> {
    if IMAGE_FILE_TYPES.contains(&extension) {
        Some(FileFamily::Image)
    } else if VIDEO_FILE_TYPES.contains(&extension) {
        Some(FileFamily::Video)
    } else if VOLUME_FILE_TYPES.contains(&extension) {
        Some(FileFamily::Volume)
    } else {
        None
    }
}

// =============================================================================
// Licenses
// =============================================================================

pub const LICENSES: &[&str] = &[
    "MIT License",
    "Apache License 2.0",
    "GNU General Public License (GPL) 2.0",
    "GNU General Public License (GPL) 3.0",
    "GNU Lesser General Public License (LGPL) 2.1",
    "GNU Lesser General Public License (LGPL) 3.0",
    "BSD 2-Clause License (Simplified)",
    "BSD 3-Clause License (Revised)",
    "Mozilla Public License 2.0 (MPL 2.0)",
    "Eclipse Public License 2.0",
    "Artistic License 2.0",
    "Creative Commons Zero v1.0 Universal (CC0)",
    "Creative Commons Attribution 4.0 International (CC BY 4.0)",
    "Creative Commons Attribution-ShareAlike 4.0 International (CC BY-SA 4.0)",
    "Creative Commons Attribution-NonCommercial 4.0 International (CC BY-NC 4.0)",
    "The Unlicense",
    "Public Domain Dedication and License (PDDL)",
    "Academic Free License v3.0",
    "Boost Software License 1.0",
    "ISC License",
    "Open Data Commons Attribution License (ODC-By)",
    "Open Data Commons Open Database License (ODbL)",
    "Open Data Commons Public Domain Dedication and License (PDDL)",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_unique(name: &str, table: &[&str]) {
        let set: HashSet<_> = table.iter().collect();
        assert_eq!(set.len(), table.len(), "duplicate entry in {}", name);
    }

    #[test]
    fn test_tables_have_no_duplicates() {
        assert_unique("MUSCLES", MUSCLES);
        assert_unique("DEVICES", DEVICES);
        assert_unique("FILE_TYPES", FILE_TYPES);
        assert_unique("LICENSES", LICENSES);
    }

    #[test]
    fn test_file_types_are_the_union_of_families() {
        assert_eq!(
            FILE_TYPES.len(),
            IMAGE_FILE_TYPES.len() + VIDEO_FILE_TYPES.len() + VOLUME_FILE_TYPES.len()
        );
        for ext in FILE_TYPES {
            assert!(file_family(ext).is_some(), "{} has no family", ext);
        }
    }

    #[test]
    fn test_file_family() {
        assert_eq!(file_family("png"), Some(FileFamily::Image));
        assert_eq!(file_family("mp4"), Some(FileFamily::Video));
        assert_eq!(file_family("nii.gz"), Some(FileFamily::Volume));
        assert_eq!(file_family("docx"), None);
    }

    #[test]
    fn test_vocabulary_sizes() {
        assert!(MUSCLES.len() >= 30);
        assert!(DEVICES.len() >= 60);
        assert!(LICENSES.len() >= 20);
    }
}
