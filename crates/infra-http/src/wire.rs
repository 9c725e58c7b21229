//! Wire format of the recognition REST API
//!
//! Field names follow the backend's JSON. Everything optional on the wire is
//! optional here; conversion to domain types happens in `convert`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Text that may arrive as a string or, for digit-only words, as a number
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Number that may arrive as a string (`"96.5"`)
fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// One tesseract row (`image_to_data` output)
#[derive(Debug, Clone, Deserialize)]
pub struct WireRegion {
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub page_num: Option<i64>,
    #[serde(default)]
    pub block_num: Option<i64>,
    #[serde(default)]
    pub par_num: Option<i64>,
    #[serde(default)]
    pub line_num: Option<i64>,
    #[serde(default)]
    pub word_num: Option<i64>,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, deserialize_with = "loose_number")]
    pub conf: Option<f64>,
    #[serde(default, deserialize_with = "loose_text")]
    pub text: Option<String>,
}

/// Region data of one page
#[derive(Debug, Clone, Deserialize)]
pub struct WirePage {
    #[serde(default = "first_page")]
    pub page_num: u32,
    #[serde(default)]
    pub ocr_data: Vec<WireRegion>,
    #[serde(default)]
    pub image_width: u32,
    #[serde(default)]
    pub image_height: u32,
}

fn first_page() -> u32 {
    1
}

/// Per-file result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireFileResult {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub ocr_data: Vec<WirePage>,
    #[serde(default)]
    pub tesseract_version: Option<String>,
}

/// `POST /api/ocr` answer: timing envelope plus the flattened result
#[derive(Debug, Clone, Deserialize)]
pub struct WireSyncResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(flatten)]
    pub result: WireFileResult,
}

/// One entry of `POST /api/async_ocr`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireBatchFile {
    Inline {
        filename: String,
        base64: String,
        language: String,
    },
    Url {
        url: String,
        language: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireBatchRequest {
    pub files: Vec<WireBatchFile>,
}

/// `POST /api/async_ocr` answer
#[derive(Debug, Clone, Deserialize)]
pub struct WireBatchAccepted {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /api/ocr_status/<id>` answer
#[derive(Debug, Clone, Deserialize)]
pub struct WireJobStatus {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub results: Vec<WireFileResult>,
    #[serde(default)]
    pub overall_start_time: Option<String>,
    #[serde(default)]
    pub overall_end_time: Option<String>,
    #[serde(default)]
    pub overall_duration: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /api/languages` answer
#[derive(Debug, Clone, Deserialize)]
pub struct WireLanguages {
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

/// Error body (`{"error": ...}` or `{"status": ..., "message": ...}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl WireErrorBody {
    /// Best human-readable text of an error response
    pub fn describe(raw: &str) -> String {
        let parsed: WireErrorBody = serde_json::from_str(raw).unwrap_or_default();
        parsed
            .error
            .or(parsed.message)
            .unwrap_or_else(|| raw.trim().to_string())
    }
}
