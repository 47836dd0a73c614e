mod binary;
mod container;
mod legacy_json;

use std::fmt;

use tracing::{error, info, warn};

use crate::actor_map::{ActorOutfitMap, EquippedOutfit};
use crate::core_api::{CoreError, CoreErrorCode};
use crate::form::{FormId, FormTable};

pub use container::CosaveFile;

/// Unique id the plugin registers with the host's co-save interface.
pub const PLUGIN_UNIQUE_ID: RecordTag = RecordTag::new(*b"OPL\0");
/// Tag of the record holding the actor outfit map.
pub const ACTOR_OUTFITS_TAG: RecordTag = RecordTag::new(*b"OPLE");
/// Version written by this build.
pub const FORMAT_VERSION: u32 = 2;
/// JSON-blob records written by earlier releases; read only.
pub const LEGACY_JSON_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordTag([u8; 4]);

impl RecordTag {
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw.to_be_bytes())
    }

    pub fn raw(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRecord {
    pub tag: RecordTag,
    pub version: u32,
    pub data: Vec<u8>,
}

/// Write side of the host's co-save interface.
pub trait SaveRecordSink {
    fn open_record(&mut self, tag: RecordTag, version: u32) -> std::io::Result<()>;
    fn write_data(&mut self, data: &[u8]) -> std::io::Result<()>;
}

/// Read side of the host's co-save interface.
pub trait SaveRecordSource {
    fn next_record(&mut self) -> Option<SaveRecord>;

    /// Maps a form id stored by an earlier session to the current session's
    /// id, or `None` when the form's source file is no longer loaded.
    fn resolve_form_id(&self, saved: FormId) -> Option<FormId>;
}

/// An actor entry exactly as stored, before any id resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEntry {
    pub actor: FormId,
    pub name: String,
    pub group_name: String,
    pub do_not_remove: bool,
    pub items: Vec<FormId>,
}

/// Writes the actor outfit record. Nothing is written for an empty map.
///
/// Returns whether a record was written. Actors that no longer exist are
/// left out.
pub fn save_actor_outfits<S, H>(
    map: &ActorOutfitMap,
    sink: &mut S,
    host: &H,
) -> Result<bool, CoreError>
where
    S: SaveRecordSink + ?Sized,
    H: FormTable + ?Sized,
{
    if map.is_empty() {
        return Ok(false);
    }

    let entries: Vec<SavedEntry> = map
        .iter()
        .filter(|(actor, _)| host.actor(*actor).is_some())
        .map(|(actor, outfit)| SavedEntry {
            actor,
            name: outfit.name.clone(),
            group_name: outfit.group_name.clone(),
            do_not_remove: outfit.do_not_remove,
            items: outfit.items.clone(),
        })
        .collect();

    let data = binary::encode_entries(&entries).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to encode actor outfits: {e}"),
        )
    })?;

    sink.open_record(ACTOR_OUTFITS_TAG, FORMAT_VERSION)
        .map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("unable to open record to write co-save data: {e}"),
            )
        })?;
    sink.write_data(&data).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to write co-save data: {e}"),
        )
    })?;

    info!("Saved outfits for {} actors", entries.len());
    Ok(true)
}

/// Reads every actor outfit record from `source`, re-resolving stored ids
/// against the current session. Unusable entries are logged and dropped.
pub fn restore_actor_outfits<S, H>(source: &mut S, host: &H) -> ActorOutfitMap
where
    S: SaveRecordSource + ?Sized,
    H: FormTable + ?Sized,
{
    let mut map = ActorOutfitMap::new();

    while let Some(record) = source.next_record() {
        if record.tag != ACTOR_OUTFITS_TAG {
            continue;
        }

        let decoded = match record.version {
            FORMAT_VERSION => binary::decode_entries(&record.data),
            LEGACY_JSON_VERSION => legacy_json::decode_entries(&record.data),
            other => {
                warn!(
                    "Skipping {} record with unknown version {other}",
                    record.tag
                );
                continue;
            }
        };
        let entries = match decoded {
            Ok(entries) => entries,
            Err(e) => {
                error!("Unreadable {} record: {e}", record.tag);
                continue;
            }
        };

        info!("Reading saved outfits for {} actors", entries.len());
        for entry in entries {
            if let Some((actor, outfit)) = resolve_entry(entry, &*source, host) {
                map.insert(actor, outfit);
            }
        }
    }

    map
}

fn resolve_entry<S, H>(
    entry: SavedEntry,
    source: &S,
    host: &H,
) -> Option<(FormId, EquippedOutfit)>
where
    S: SaveRecordSource + ?Sized,
    H: FormTable + ?Sized,
{
    let Some(actor) = source.resolve_form_id(entry.actor) else {
        error!("Failed to resolve actor form id {}", entry.actor);
        return None;
    };
    let Some(actor_form) = host.actor(actor) else {
        error!("Actor not found {actor}");
        return None;
    };

    let mut items = Vec::with_capacity(entry.items.len());
    for saved in &entry.items {
        let Some(id) = source.resolve_form_id(*saved) else {
            error!("Failed to resolve form id {saved}");
            continue;
        };
        if host.item(id).is_none() {
            error!("Outfit form not found {id}");
            continue;
        }
        items.push(id);
    }

    if entry.name.is_empty() || entry.group_name.is_empty() {
        warn!("Invalid outfit save for {}", actor_form.name);
        return None;
    }
    if items.is_empty() && !entry.items.is_empty() {
        warn!(
            "No forms of outfit {} survived loading for {}",
            entry.name, actor_form.name
        );
        return None;
    }

    info!("Loaded outfit {} for {}", entry.name, actor_form.name);
    Some((
        actor,
        EquippedOutfit {
            name: entry.name,
            group_name: entry.group_name,
            items,
            do_not_remove: entry.do_not_remove,
        },
    ))
}
