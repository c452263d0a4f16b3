// 📐 Form Validator
// Raw submitted values → typed drafts, or per-field errors

use crate::db::PredictionDraft;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const NAME_MAX_CHARS: usize = 100;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_INT: &str = "Enter a whole number.";
pub const MSG_INVALID_FLOAT: &str = "Enter a number.";
pub const MSG_NO_FILE: &str = "No file was submitted.";
pub const MSG_EMPTY_FILE: &str = "The submitted file is empty.";

// ============================================================================
// SUBMITTED DATA
// ============================================================================

/// A file attached to a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        FilePayload {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Field name → raw value mapping, as received from a request.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    values: HashMap<String, String>,
    files: HashMap<String, FilePayload>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a text value
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_value(field, value);
        self
    }

    /// Builder: add a file
    pub fn with_file(mut self, field: impl Into<String>, file: FilePayload) -> Self {
        self.insert_file(field, file);
        self
    }

    pub fn insert_value(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn insert_file(&mut self, field: impl Into<String>, file: FilePayload) {
        self.files.insert(field.into(), file);
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn file(&self, field: &str) -> Option<&FilePayload> {
        self.files.get(field)
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (field, value) in iter {
            form.insert_value(field, value);
        }
        form
    }
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// All errors collected while validating one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    context: String,
    errors: Vec<ValidationError>,
}

impl FormErrors {
    pub fn new(context: &str) -> Self {
        FormErrors {
            context: context.to_string(),
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
            context: self.context.clone(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Messages attached to one field, in insertion order.
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for e in &self.errors {
            map.entry(e.field.clone()).or_default().push(e.message.clone());
        }
        map
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FormErrors {}

// ============================================================================
// FIELD COERCION
// ============================================================================

/// Parse an integer, accepting a trailing all-zero fraction ("2024.0").
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let digits = match s.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
        Some(_) => return None,
        None => s,
    };
    digits.parse::<i64>().ok()
}

/// Parse a finite float. NaN and infinities are rejected.
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trimmed, non-empty value of a field.
fn present<'a>(form: &'a FormData, field: &str) -> Option<&'a str> {
    form.value(field).map(str::trim).filter(|s| !s.is_empty())
}

fn required_int(form: &FormData, field: &str, errors: &mut FormErrors) -> Option<i64> {
    match present(form, field) {
        None => {
            errors.push(field, MSG_REQUIRED);
            None
        }
        Some(raw) => {
            let parsed = parse_int(raw);
            if parsed.is_none() {
                errors.push(field, MSG_INVALID_INT);
            }
            parsed
        }
    }
}

fn required_float(form: &FormData, field: &str, errors: &mut FormErrors) -> Option<f64> {
    match present(form, field) {
        None => {
            errors.push(field, MSG_REQUIRED);
            None
        }
        Some(raw) => optional_float_value(raw, field, errors),
    }
}

/// Parse an optional float field; absent or blank is `None`.
pub fn optional_float(form: &FormData, field: &str, errors: &mut FormErrors) -> Option<f64> {
    present(form, field).and_then(|raw| optional_float_value(raw, field, errors))
}

fn optional_float_value(raw: &str, field: &str, errors: &mut FormErrors) -> Option<f64> {
    let parsed = parse_float(raw);
    if parsed.is_none() {
        errors.push(field, MSG_INVALID_FLOAT);
    }
    parsed
}

// ============================================================================
// PREDICTION FORM
// ============================================================================

/// Validate a prediction submission.
///
/// The form never carries a predicted value; the draft's
/// `predicted_inflation` is always `None` here.
pub fn validate_prediction(form: &FormData) -> Result<PredictionDraft, FormErrors> {
    let mut errors = FormErrors::new("Prediction");

    let year = required_int(form, "year", &mut errors);
    let exchange_rate = required_float(form, "exchange_rate", &mut errors);
    let money_supply = required_float(form, "money_supply", &mut errors);
    let observed_inflation = optional_float(form, "observed_inflation", &mut errors);

    errors.into_result(|| PredictionDraft {
        year: year.unwrap_or_default(),
        exchange_rate: exchange_rate.unwrap_or_default(),
        money_supply: money_supply.unwrap_or_default(),
        observed_inflation,
        predicted_inflation: None,
    })
}

// ============================================================================
// UPLOAD FORM
// ============================================================================

/// A validated upload, not yet written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadDraft {
    pub name: String,
    pub observation: String,
    pub file: FilePayload,
}

pub fn validate_upload(form: &FormData) -> Result<UploadDraft, FormErrors> {
    let mut errors = FormErrors::new("UploadedFile");

    let name = match present(form, "name") {
        None => {
            errors.push("name", MSG_REQUIRED);
            None
        }
        Some(name) => {
            let len = name.chars().count();
            if len > NAME_MAX_CHARS {
                errors.push(
                    "name",
                    format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        NAME_MAX_CHARS, len
                    ),
                );
                None
            } else {
                Some(name.to_string())
            }
        }
    };

    let file = match form.file("file") {
        None => {
            errors.push("file", MSG_REQUIRED);
            None
        }
        Some(file) if file.filename.trim().is_empty() => {
            errors.push("file", MSG_NO_FILE);
            None
        }
        Some(file) if file.bytes.is_empty() => {
            errors.push("file", MSG_EMPTY_FILE);
            None
        }
        Some(file) => Some(file.clone()),
    };

    let observation = form.value("observation").unwrap_or("").trim().to_string();

    match (name, file) {
        (Some(name), Some(file)) if errors.is_empty() => Ok(UploadDraft {
            name,
            observation,
            file,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction_form(year: &str, rate: &str, supply: &str) -> FormData {
        FormData::new()
            .with_value("year", year)
            .with_value("exchange_rate", rate)
            .with_value("money_supply", supply)
    }

    #[test]
    fn test_valid_prediction() {
        let form = prediction_form("2024", "2750.5", "12000000").with_value("observed_inflation", "18.2");
        let draft = validate_prediction(&form).unwrap();

        assert_eq!(draft.year, 2024);
        assert_eq!(draft.exchange_rate, 2750.5);
        assert_eq!(draft.money_supply, 12_000_000.0);
        assert_eq!(draft.observed_inflation, Some(18.2));
        assert_eq!(draft.predicted_inflation, None);
    }

    #[test]
    fn test_observed_inflation_is_optional() {
        let draft = validate_prediction(&prediction_form("2023", "1.5", "3")).unwrap();
        assert_eq!(draft.observed_inflation, None);

        let blank = prediction_form("2023", "1.5", "3").with_value("observed_inflation", "  ");
        assert_eq!(validate_prediction(&blank).unwrap().observed_inflation, None);
    }

    #[test]
    fn test_missing_prediction_fields_are_named() {
        let errors = validate_prediction(&FormData::new()).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.for_field("year"), vec![MSG_REQUIRED]);
        assert_eq!(errors.for_field("exchange_rate"), vec![MSG_REQUIRED]);
        assert_eq!(errors.for_field("money_supply"), vec![MSG_REQUIRED]);
        assert!(!errors.has_field("observed_inflation"));
    }

    #[test]
    fn test_bad_coercion() {
        let form = prediction_form("twenty", "abc", "1e3").with_value("observed_inflation", "NaN");
        let errors = validate_prediction(&form).unwrap_err();

        assert_eq!(errors.for_field("year"), vec![MSG_INVALID_INT]);
        assert_eq!(errors.for_field("exchange_rate"), vec![MSG_INVALID_FLOAT]);
        assert!(!errors.has_field("money_supply"));
        assert_eq!(errors.for_field("observed_inflation"), vec![MSG_INVALID_FLOAT]);
    }

    #[test]
    fn test_parse_int_accepts_zero_fraction() {
        assert_eq!(parse_int(" 2024 "), Some(2024));
        assert_eq!(parse_int("2024.0"), Some(2024));
        assert_eq!(parse_int("2024."), Some(2024));
        assert_eq!(parse_int("-5"), Some(-5));
        assert_eq!(parse_int("2024.5"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_parse_float_rejects_non_finite() {
        assert_eq!(parse_float("3.25"), Some(3.25));
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("-infinity"), None);
        assert_eq!(parse_float("1,5"), None);
    }

    #[test]
    fn test_valid_upload() {
        let form = FormData::new()
            .with_value("name", "  report ")
            .with_value("observation", "")
            .with_file("file", FilePayload::new("report.pdf", b"%PDF-1.4".to_vec()));

        let draft = validate_upload(&form).unwrap();
        assert_eq!(draft.name, "report");
        assert_eq!(draft.observation, "");
        assert_eq!(draft.file.filename, "report.pdf");
    }

    #[test]
    fn test_upload_missing_name_and_file() {
        let errors = validate_upload(&FormData::new().with_value("name", "")).unwrap_err();

        assert_eq!(errors.for_field("name"), vec![MSG_REQUIRED]);
        assert_eq!(errors.for_field("file"), vec![MSG_REQUIRED]);
    }

    #[test]
    fn test_upload_name_too_long() {
        let long = "é".repeat(101);
        let form = FormData::new()
            .with_value("name", long)
            .with_file("file", FilePayload::new("a.txt", b"x".to_vec()));

        let errors = validate_upload(&form).unwrap_err();
        assert_eq!(
            errors.for_field("name"),
            vec!["Ensure this value has at most 100 characters (it has 101)."]
        );

        let exact = FormData::new()
            .with_value("name", "é".repeat(100))
            .with_file("file", FilePayload::new("a.txt", b"x".to_vec()));
        assert!(validate_upload(&exact).is_ok());
    }

    #[test]
    fn test_upload_empty_file_input() {
        let no_name = FormData::new()
            .with_value("name", "report")
            .with_file("file", FilePayload::new("", Vec::<u8>::new()));
        assert_eq!(validate_upload(&no_name).unwrap_err().for_field("file"), vec![MSG_NO_FILE]);

        let empty = FormData::new()
            .with_value("name", "report")
            .with_file("file", FilePayload::new("a.txt", Vec::<u8>::new()));
        assert_eq!(validate_upload(&empty).unwrap_err().for_field("file"), vec![MSG_EMPTY_FILE]);
    }

    #[test]
    fn test_errors_map_groups_by_field() {
        let errors = validate_prediction(&FormData::new()).unwrap_err();
        let map = errors.to_map();

        assert_eq!(map.len(), 3);
        assert_eq!(map["year"], vec![MSG_REQUIRED.to_string()]);
        assert!(errors.to_string().contains("[Prediction] year"));
    }
}
