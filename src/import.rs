// 📥 CSV import of predictions
//
// Every row goes through the same validator as the web form. Rows that fail
// are reported with their line number and skipped; the rest are saved.

use crate::db::PredictionDraft;
use crate::forms::{self, FormData, FormErrors};
use crate::store::{RecordStore, Repository};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// A CSV row that did not validate.
#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub line: u64,
    pub errors: FormErrors,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub inserted: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Parse prediction drafts out of CSV text.
///
/// Expected headers: `year, exchange_rate, money_supply, observed_inflation`
/// and optionally `predicted_inflation`. Unknown columns are ignored.
pub fn read_predictions<R: Read>(reader: R) -> Result<(Vec<PredictionDraft>, Vec<RejectedRow>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let mut drafts = Vec::new();
    let mut rejected = Vec::new();

    for result in rdr.records() {
        let record = result.context("Failed to read CSV record")?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let form: FormData = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();

        match validate_row(&form) {
            Ok(draft) => drafts.push(draft),
            Err(errors) => rejected.push(RejectedRow { line, errors }),
        }
    }

    Ok((drafts, rejected))
}

fn validate_row(form: &FormData) -> Result<PredictionDraft, FormErrors> {
    let mut draft = forms::validate_prediction(form)?;

    let mut errors = FormErrors::new("Prediction");
    draft.predicted_inflation = forms::optional_float(form, "predicted_inflation", &mut errors);
    if errors.is_empty() {
        Ok(draft)
    } else {
        Err(errors)
    }
}

pub fn load_predictions_csv(path: &Path) -> Result<(Vec<PredictionDraft>, Vec<RejectedRow>)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    read_predictions(file)
}

/// Validate and save every row of a CSV file.
pub fn import_predictions(store: &RecordStore, path: &Path) -> Result<ImportReport> {
    let (drafts, rejected) = load_predictions_csv(path)?;

    let repo = store.predictions();
    let mut inserted = 0;
    for draft in drafts {
        repo.save(draft).context("Failed to save imported prediction")?;
        inserted += 1;
    }

    tracing::info!(inserted, rejected = rejected.len(), path = %path.display(), "csv import finished");

    Ok(ImportReport { inserted, rejected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs::BlobStore;

    const SAMPLE: &str = "\
year,exchange_rate,money_supply,observed_inflation,predicted_inflation
2021,1990.5,8000,5.3,
2022, 2010.0 ,8500,,6.1
oops,2100,9000,7.0,
2024,2700,,18.2,
";

    #[test]
    fn test_read_predictions_splits_valid_and_rejected() {
        let (drafts, rejected) = read_predictions(SAMPLE.as_bytes()).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].year, 2021);
        assert_eq!(drafts[0].observed_inflation, Some(5.3));
        assert_eq!(drafts[0].predicted_inflation, None);
        assert_eq!(drafts[1].exchange_rate, 2010.0);
        assert_eq!(drafts[1].observed_inflation, None);
        assert_eq!(drafts[1].predicted_inflation, Some(6.1));

        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].line, 4);
        assert!(rejected[0].errors.has_field("year"));
        assert_eq!(rejected[1].line, 5);
        assert!(rejected[1].errors.has_field("money_supply"));
    }

    #[test]
    fn test_bad_predicted_value_rejects_row() {
        let csv = "year,exchange_rate,money_supply,predicted_inflation\n2020,1,2,high\n";
        let (drafts, rejected) = read_predictions(csv.as_bytes()).unwrap();

        assert!(drafts.is_empty());
        assert_eq!(rejected[0].errors.for_field("predicted_inflation"), vec![forms::MSG_INVALID_FLOAT]);
    }

    #[test]
    fn test_import_predictions_saves_valid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("predictions.csv");
        std::fs::write(&csv_path, SAMPLE).unwrap();

        let store = RecordStore::open_in_memory(BlobStore::new(dir.path().join("media"), "uploads")).unwrap();
        let report = import_predictions(&store, &csv_path).unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(store.predictions().count().unwrap(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_predictions_csv(&dir.path().join("absent.csv")).is_err());
    }
}
