use std::io::{self, Cursor};

use super::SavedEntry;
use crate::form::FormId;
use crate::reader::{LittleEndianReader, LittleEndianWriter};

// actor + two empty strings + flag + item count
const MIN_ENTRY_SIZE: u64 = 4 + 2 + 2 + 1 + 4;
const ITEM_SIZE: u64 = 4;

pub fn encode_entries(entries: &[SavedEntry]) -> io::Result<Vec<u8>> {
    let mut w = LittleEndianWriter::new(Vec::new());
    w.write_count(entries.len())?;
    for entry in entries {
        w.write_u32(entry.actor.raw())?;
        w.write_string(&entry.name)?;
        w.write_string(&entry.group_name)?;
        w.write_bool(entry.do_not_remove)?;
        w.write_count(entry.items.len())?;
        for item in &entry.items {
            w.write_u32(item.raw())?;
        }
    }
    Ok(w.into_inner())
}

pub fn decode_entries(data: &[u8]) -> io::Result<Vec<SavedEntry>> {
    let mut r = LittleEndianReader::new(Cursor::new(data));
    let count = r.read_count(MIN_ENTRY_SIZE)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let actor = FormId(r.read_u32()?);
        let name = r.read_string()?;
        let group_name = r.read_string()?;
        let do_not_remove = r.read_bool()?;
        let item_count = r.read_count(ITEM_SIZE)?;
        let mut items = Vec::with_capacity(item_count);
        for _ in 0..item_count {
            items.push(FormId(r.read_u32()?));
        }
        entries.push(SavedEntry {
            actor,
            name,
            group_name,
            do_not_remove,
            items,
        });
    }

    let trailing = r.remaining()?;
    if trailing != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{trailing} trailing bytes after actor outfit entries"),
        ));
    }
    Ok(entries)
}
