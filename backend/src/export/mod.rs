//! Download artifacts built from catalog records.
//!
//! - [`to_json_sidecar`] - the `dataset_metadata.json` a contributor keeps or mails in
//! - [`records_to_csv`] - the filtered catalog as one CSV row per record
//! - [`mailto_link`] - prefilled e-mail for the manual submission path

use crate::error::{ExportError, ExportResult};
use crate::models::{DatasetMetadataRecord, Field};

/// File name of the metadata sidecar.
pub const SIDECAR_FILENAME: &str = "dataset_metadata.json";

/// File name of the filtered catalog download.
pub const CSV_FILENAME: &str = "filtered_data.csv";

/// Address that receives e-mailed submissions.
pub const SUBMISSION_ADDRESS: &str = "umudrepository@gmail.com";

/// Pretty-printed JSON of a normalized record.
pub fn to_json_sidecar(record: &DatasetMetadataRecord) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// CSV with one column per field, in declaration order.
///
/// List values are joined with `", "`; absent values are empty cells.
pub fn records_to_csv(records: &[DatasetMetadataRecord]) -> ExportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(Field::ALL.iter().map(|f| f.name()))?;

    for record in records {
        writer.write_record(
            Field::ALL
                .iter()
                .map(|f| record.get(*f).map(|v| v.display()).unwrap_or_default()),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
}

/// `mailto:` link with subject, body and recipient prefilled.
///
/// The body is extended with an `Attachments:` section listing the files the
/// contributor is expected to attach by hand.
pub fn mailto_link(subject: &str, body: &str, recipient: &str, filenames: &[&str]) -> String {
    let body = format!("{}\n\nAttachments:\n{}", body, filenames.join("\n"));
    format!(
        "mailto:?subject={}&body={}&to={}",
        urlencoding::encode(subject),
        urlencoding::encode(&body),
        urlencoding::encode(recipient)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_record;
    use crate::validation::validate;

    #[test]
    fn test_sidecar_revalidates() {
        let sidecar = to_json_sidecar(&sample_record()).unwrap();
        assert!(sidecar.contains("\n  \"name\": \"DeepACSA_2022\""));
        assert!(!sidecar.contains("scanningFrequencyMHz"));

        let parsed: serde_json::Value = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(validate(&parsed).unwrap(), sample_record());
    }

    #[test]
    fn test_csv_export() {
        let mut second = sample_record();
        second.name = "Other_2023".into();
        second.muscles = vec!["Soleus".into()];
        second.participant_age = None;

        let csv = records_to_csv(&[sample_record(), second]).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), Field::ALL.len());
        assert_eq!(&headers[0], "name");

        let muscles = headers.iter().position(|h| h == "muscles").unwrap();
        let age = headers.iter().position(|h| h == "participantAge").unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][muscles], "Rectus Femoris, Vastus Lateralis");
        assert_eq!(&rows[0][age], "38.2");
        assert_eq!(&rows[1][muscles], "Soleus");
        assert_eq!(&rows[1][age], "");
    }

    #[test]
    fn test_csv_export_empty() {
        let csv = records_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_mailto_link() {
        let link = mailto_link(
            "Test Subject",
            "Test Body",
            "test@example.com",
            &["file1.txt", "file2.txt"],
        );
        assert!(link.starts_with("mailto:?"));
        assert!(link.contains("subject=Test%20Subject"));
        assert!(link.contains("body=Test%20Body%0A%0AAttachments%3A%0Afile1.txt%0Afile2.txt"));
        assert!(link.ends_with("&to=test%40example.com"));
    }
}
