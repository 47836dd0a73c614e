//! JSON files edited by outfit authors: one file per group, plus the plugin
//! configuration holding the ignored-item list.

use std::fs;
use std::path::Path;

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::warn;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::form::FormRef;

pub const GROUP_FILE_EXTENSION: &str = "json";

const OUTFITS_KEY: &str = "outfits";
const IGNORED_FORMS_KEY: &str = "ignoredForms";

/// An outfit as written in a group file. Items that could not be decoded
/// keep their raw JSON text so the caller can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoredOutfit {
    pub name: String,
    pub items: Vec<Result<FormRef, String>>,
}

pub fn read_group_file(path: &Path) -> Result<Vec<AuthoredOutfit>, CoreError> {
    let text = read_text(path)?;
    parse_group_document(&text)
}

/// Parses a group document. Both `{"outfits": {...}}` and a bare
/// `{name: [items]}` object are accepted.
pub fn parse_group_document(text: &str) -> Result<Vec<AuthoredOutfit>, CoreError> {
    let root = parse_object(text)?;
    let outfits = match root.get(OUTFITS_KEY) {
        Some(JsonValue::Object(map)) => map,
        Some(_) => {
            return Err(CoreError::new(
                CoreErrorCode::Parse,
                "\"outfits\" must be an object of outfit name to item list",
            ));
        }
        None => &root,
    };

    let mut out = Vec::with_capacity(outfits.len());
    for (name, value) in outfits {
        let Some(entries) = value.as_array() else {
            warn!("Invalid outfit JSON {name}: expected a list of forms");
            continue;
        };
        out.push(AuthoredOutfit {
            name: name.clone(),
            items: entries.iter().map(decode_form_ref).collect(),
        });
    }
    Ok(out)
}

/// Builds the document for one group. Outfits whose names are byte-identical
/// get a `.NNN` suffix so that no JSON key is lost.
pub fn group_document<'a, I>(outfits: I) -> JsonValue
where
    I: IntoIterator<Item = (&'a str, Vec<FormRef>)>,
{
    let mut dict = JsonMap::new();
    for (name, refs) in outfits {
        let mut key = name.to_string();
        let mut discriminator = 0u32;
        while dict.contains_key(&key) {
            discriminator += 1;
            key = format!("{name}.{discriminator:03}");
        }
        let items = refs
            .iter()
            .map(|form_ref| JsonValue::String(form_ref.to_string()))
            .collect();
        dict.insert(key, JsonValue::Array(items));
    }

    let mut root = JsonMap::new();
    root.insert(OUTFITS_KEY.to_string(), JsonValue::Object(dict));
    JsonValue::Object(root)
}

pub fn write_group_file(path: &Path, document: &JsonValue) -> Result<(), CoreError> {
    let mut text = serde_json::to_string_pretty(document).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("failed to encode {}: {e}", path.display()),
        )
    })?;
    text.push('\n');
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to create {}: {e}", parent.display()),
            )
        })?;
    }
    fs::write(path, text).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to write {}: {e}", path.display()),
        )
    })
}

/// Reads the `ignoredForms` list of the plugin configuration file.
pub fn read_ignored_forms(path: &Path) -> Result<Vec<Result<FormRef, String>>, CoreError> {
    let text = read_text(path)?;
    parse_ignored_forms(&text)
}

pub fn parse_ignored_forms(text: &str) -> Result<Vec<Result<FormRef, String>>, CoreError> {
    let root = parse_object(text)?;
    match root.get(IGNORED_FORMS_KEY) {
        Some(JsonValue::Array(entries)) => Ok(entries.iter().map(decode_form_ref).collect()),
        Some(_) => Err(CoreError::new(
            CoreErrorCode::Parse,
            "\"ignoredForms\" must be a list of forms",
        )),
        None => Ok(Vec::new()),
    }
}

fn decode_form_ref(value: &JsonValue) -> Result<FormRef, String> {
    serde_json::from_value(value.clone()).map_err(|_| value.to_string())
}

fn read_text(path: &Path) -> Result<String, CoreError> {
    fs::read_to_string(path).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to read {}: {e}", path.display()),
        )
    })
}

fn parse_object(text: &str) -> Result<JsonMap<String, JsonValue>, CoreError> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(_) => Err(CoreError::new(
            CoreErrorCode::Parse,
            "top-level JSON value must be an object",
        )),
        Err(e) => Err(CoreError::new(
            CoreErrorCode::Parse,
            format!("invalid JSON: {e}"),
        )),
    }
}
