//! Saved tab document
//!
//! ```json
//! { "tabs": [ { "title": "Terminal 1", "path": "/home/user", "color": "#ff0000" } ] }
//! ```
//!
//! `title` is required. `path` is omitted when the directory is unknown.
//! `color` is always written, `#000000` standing for "no color".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tabshell_tabs::{SessionSnapshot, TabColor};

use crate::error::SessionError;
use crate::warning::RestoreWarning;
use crate::Result;

pub const TABS_KEY: &str = "tabs";

#[derive(Serialize)]
struct SavedDocument<'a> {
    tabs: Vec<SavedTab<'a>>,
}

#[derive(Serialize)]
struct SavedTab<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    color: String,
}

/// One entry as found on disk; `path` and `color` are checked by hand so a
/// bad value only loses that field.
#[derive(Deserialize)]
struct LoadedTab {
    title: String,
    #[serde(default)]
    path: Option<Value>,
    #[serde(default)]
    color: Option<Value>,
}

/// Snapshots recovered from a document plus whatever had to be dropped
#[derive(Debug, Default)]
pub struct Decoded {
    pub snapshots: Vec<SessionSnapshot>,
    pub warnings: Vec<RestoreWarning>,
}

pub fn encode(snapshots: &[SessionSnapshot]) -> Result<Value> {
    Ok(serde_json::to_value(saved_document(snapshots))?)
}

/// Pretty-printed document bytes, ready to write
pub fn encode_to_vec(snapshots: &[SessionSnapshot]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&saved_document(snapshots))?)
}

fn saved_document(snapshots: &[SessionSnapshot]) -> SavedDocument<'_> {
    SavedDocument {
        tabs: snapshots
            .iter()
            .map(|s| SavedTab {
                title: &s.title,
                path: s.working_directory.as_deref(),
                color: TabColor::encode_tag(s.color),
            })
            .collect(),
    }
}

/// Parse raw bytes; anything that is not JSON is a format error.
pub fn decode_slice(bytes: &[u8]) -> Result<Decoded> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| SessionError::Format(format!("not valid JSON: {}", e)))?;
    decode(&document)
}

/// Recover snapshots in document order.
///
/// Fails only when the top level is not an object or `tabs` is present but
/// not an array. A missing `tabs` decodes as no sessions. Entries that are
/// not objects or lack a string `title` are skipped with a warning.
pub fn decode(document: &Value) -> Result<Decoded> {
    let object = document
        .as_object()
        .ok_or_else(|| SessionError::Format(format!("top level is {}", kind(document))))?;

    let entries = match object.get(TABS_KEY) {
        None => return Ok(Decoded::default()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(SessionError::Format(format!(
                "\"{}\" is {}, expected an array",
                TABS_KEY,
                kind(other)
            )))
        }
    };

    let mut decoded = Decoded::default();

    for (entry, value) in entries.iter().enumerate() {
        let tab = match LoadedTab::deserialize(value) {
            Ok(tab) => tab,
            Err(e) => {
                decoded.warnings.push(RestoreWarning::SkippedEntry {
                    entry,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let working_directory = match tab.path {
            None => None,
            Some(Value::String(path)) => Some(path),
            Some(other) => {
                decoded.warnings.push(RestoreWarning::DroppedPath {
                    entry,
                    reason: format!("expected a string, found {}", kind(&other)),
                });
                None
            }
        };

        let color = match tab.color {
            None => None,
            Some(Value::String(text)) => match TabColor::decode_tag(&text) {
                Ok(color) => color,
                Err(_) => {
                    decoded
                        .warnings
                        .push(RestoreWarning::DroppedColor { entry, value: text });
                    None
                }
            },
            Some(other) => {
                decoded.warnings.push(RestoreWarning::DroppedColor {
                    entry,
                    value: other.to_string(),
                });
                None
            }
        };

        decoded.snapshots.push(SessionSnapshot {
            title: tab.title,
            working_directory,
            color,
        });
    }

    Ok(decoded)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
