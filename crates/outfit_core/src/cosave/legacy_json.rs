//! Records written by releases that stored the actor map as a JSON blob.

use std::io;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::warn;

use super::SavedEntry;
use crate::form::FormId;

#[derive(Debug, Deserialize)]
struct LegacyDocument {
    #[serde(rename = "actorOutfits", default)]
    actor_outfits: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyEntry {
    name: String,
    group: String,
    #[serde(rename = "doNotRemove")]
    do_not_remove: Option<bool>,
    #[serde(rename = "doNotSave")]
    do_not_save: Option<bool>,
    forms: Vec<u32>,
}

pub fn decode_entries(data: &[u8]) -> io::Result<Vec<SavedEntry>> {
    let text = json_payload(data)?;
    let document: LegacyDocument = serde_json::from_slice(text)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut entries = Vec::with_capacity(document.actor_outfits.len());
    for (key, value) in document.actor_outfits {
        let Some(actor) = FormId::from_hex(&key) else {
            warn!("Invalid saved actor key {key:?}");
            continue;
        };
        let entry: LegacyEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Invalid saved outfit for {actor}: {e}");
                continue;
            }
        };
        entries.push(SavedEntry {
            actor,
            name: entry.name,
            group_name: entry.group,
            do_not_remove: entry.do_not_remove.unwrap_or(false)
                || entry.do_not_save.unwrap_or(false),
            items: entry.forms.into_iter().map(FormId).collect(),
        });
    }
    Ok(entries)
}

/// The blob is either bare JSON text or a `u32` length followed by the text.
fn json_payload(data: &[u8]) -> io::Result<&[u8]> {
    if data.first() == Some(&b'{') {
        return Ok(data);
    }
    let Some((len, rest)) = data.split_first_chunk::<4>() else {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "legacy record is too short",
        ));
    };
    let len = u32::from_le_bytes(*len) as usize;
    rest.get(..len).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("legacy record declares {len} bytes, has {}", rest.len()),
        )
    })
}
