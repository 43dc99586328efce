//! Coercion of raw JSON import documents into comment records.
//!
//! The bulk importer accepts three document shapes: an object wrapping a
//! `comments` array, a bare array, or a single record object. Individual
//! records are coerced leniently (missing fields get defaults, `likes`
//! may arrive as an integer string); a record that cannot be coerced at
//! all is an error the caller logs and skips without aborting the run.

use serde_json::Value;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Author recorded for imported records that carry none.
pub const IMPORT_AUTHOR: &str = "Anonymous";

/// A comment record coerced from one entry of an import document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub text: String,
    pub author: String,
    pub likes: i64,
    pub date: ImportDate,
    pub image_url: Option<String>,
}

/// Creation time carried by an import record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportDate {
    /// No usable `date` key; the caller picks the fallback.
    Absent,
    /// A parseable ISO 8601 date.
    Parsed(Timestamp),
    /// A `date` key was present but unreadable. Callers warn and fall
    /// back to the current time.
    Malformed,
}

/// Extract the list of record values from an import document.
///
/// Accepted shapes: `{"comments": [...]}`, a bare array, or anything
/// else as a one-record list. A `comments` key holding a non-array is
/// the one shape that fails the whole run.
pub fn flatten_document(document: Value) -> Result<Vec<Value>, CoreError> {
    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("comments") {
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(CoreError::Validation(
                "the comments key must hold an array".to_string(),
            )),
            None => Ok(vec![Value::Object(map)]),
        },
        other => Ok(vec![other]),
    }
}

/// Identifier used in log lines for a record, taken from its `id` field.
pub fn record_label(record: &Value) -> String {
    match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Coerce one record value into an [`ImportRecord`].
///
/// Missing `text` becomes empty, missing `author` becomes
/// [`IMPORT_AUTHOR`], and `likes` accepts integers or integer strings.
/// Both `image` and `image_url` keys are honored; `image` wins when both
/// are present and non-empty.
pub fn coerce_record(record: &Value) -> Result<ImportRecord, CoreError> {
    let record = record
        .as_object()
        .ok_or_else(|| CoreError::Validation("record is not a JSON object".to_string()))?;

    let text = match record.get("text") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(text)) => text.to_string(),
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            return Err(CoreError::Validation(format!(
                "unusable text value: {other}"
            )))
        }
    };

    let author = match record.get("author") {
        Some(Value::String(author)) => author.clone(),
        None | Some(Value::Null) => IMPORT_AUTHOR.to_string(),
        Some(other) => {
            return Err(CoreError::Validation(format!(
                "unusable author value: {other}"
            )))
        }
    };

    let likes = match record.get("likes") {
        None | Some(Value::Null) => 0,
        Some(Value::Number(likes)) => likes
            .as_i64()
            .or_else(|| likes.as_f64().map(|fractional| fractional as i64))
            .ok_or_else(|| CoreError::Validation(format!("unusable likes value: {likes}")))?,
        Some(Value::String(likes)) => likes
            .trim()
            .parse::<i64>()
            .map_err(|_| CoreError::Validation(format!("unusable likes value: {likes:?}")))?,
        Some(other) => {
            return Err(CoreError::Validation(format!(
                "unusable likes value: {other}"
            )))
        }
    };

    let date = match record.get("date") {
        Some(Value::String(date)) if !date.is_empty() => parse_import_date(date),
        None | Some(Value::Null) | Some(Value::String(_)) => ImportDate::Absent,
        Some(_) => ImportDate::Malformed,
    };

    let image_url = ["image", "image_url"].iter().find_map(|key| {
        match record.get(*key) {
            Some(Value::String(url)) if !url.is_empty() => Some(url.clone()),
            _ => None,
        }
    });

    Ok(ImportRecord {
        text,
        author,
        likes,
        date,
        image_url,
    })
}

/// Parse an ISO 8601 date with or without an offset. `Z` and explicit
/// offsets are honored; a naive datetime (`T` or space separated) is
/// taken as UTC, and a bare date means midnight UTC.
fn parse_import_date(raw: &str) -> ImportDate {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
        return ImportDate::Parsed(parsed.with_timezone(&chrono::Utc));
    }
    if let Ok(naive) = raw.parse::<chrono::NaiveDateTime>() {
        return ImportDate::Parsed(naive.and_utc());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return ImportDate::Parsed(naive.and_utc());
    }
    if let Ok(date) = raw.parse::<chrono::NaiveDate>() {
        return ImportDate::Parsed(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    ImportDate::Malformed
}
