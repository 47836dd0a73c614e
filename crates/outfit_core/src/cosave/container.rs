use std::collections::HashMap;
use std::io::{self, Cursor};

use super::{RecordTag, SaveRecord, SaveRecordSink, SaveRecordSource};
use crate::form::FormId;
use crate::layout::{FileLayout, SectionId};
use crate::reader::{LittleEndianReader, LittleEndianWriter};

const MAGIC: [u8; 4] = *b"OPCS";
const CONTAINER_VERSION: u32 = 1;
const HEADER_SIZE: usize = 12;
const RECORD_HEADER_SIZE: u64 = 12;

/// Stand-alone co-save file: a header followed by tagged, versioned records.
///
/// Stored form ids are remapped by load-order index, the way the host
/// remaps them when the source-file order changed between sessions.
#[derive(Debug, Clone, Default)]
pub struct CosaveFile {
    records: Vec<SaveRecord>,
    open: Option<usize>,
    cursor: usize,
    index_remap: HashMap<u8, Option<u8>>,
}

impl CosaveFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(bytes: &[u8]) -> io::Result<Self> {
        Self::parse_with_layout(bytes).map(|(file, _)| file)
    }

    pub fn parse_with_layout(bytes: &[u8]) -> io::Result<(Self, FileLayout)> {
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        let magic = r.read_bytes(MAGIC.len())?;
        if magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "not a co-save file (bad magic)",
            ));
        }
        let version = r.read_u32()?;
        if version != CONTAINER_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported co-save container version {version}"),
            ));
        }
        let count = r.read_count(RECORD_HEADER_SIZE)?;

        let mut layout = FileLayout {
            file_len: bytes.len(),
            sections: Vec::with_capacity(count + 1),
        };
        layout.record(SectionId::Header, 0, HEADER_SIZE);

        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let start = r.position()? as usize;
            let tag = RecordTag::from_raw(r.read_u32()?);
            let version = r.read_u32()?;
            let len = r.read_u32()? as usize;
            if len as u64 > r.remaining()? {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("record {index} ({tag}) runs past the end of the file"),
                ));
            }
            let data = r.read_bytes(len)?;
            let end = r.position()? as usize;
            layout.record(SectionId::Record(index), start, end);
            records.push(SaveRecord { tag, version, data });
        }
        layout.validate()?;

        Ok((
            Self {
                records,
                ..Self::default()
            },
            layout,
        ))
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut w = LittleEndianWriter::new(Vec::new());
        w.write_bytes(&MAGIC)?;
        w.write_u32(CONTAINER_VERSION)?;
        w.write_count(self.records.len())?;
        for record in &self.records {
            w.write_u32(record.tag.raw())?;
            w.write_u32(record.version)?;
            w.write_count(record.data.len())?;
            w.write_bytes(&record.data)?;
        }
        Ok(w.into_inner())
    }

    pub fn records(&self) -> &[SaveRecord] {
        &self.records
    }

    pub fn push_record(&mut self, record: SaveRecord) {
        self.records.push(record);
        self.open = None;
    }

    /// Forms saved under load index `saved` now live under `current`, or are
    /// gone when `current` is `None`.
    pub fn remap_load_index(&mut self, saved: u8, current: Option<u8>) {
        self.index_remap.insert(saved, current);
    }

    /// Restarts reading from the first record.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl SaveRecordSink for CosaveFile {
    fn open_record(&mut self, tag: RecordTag, version: u32) -> io::Result<()> {
        self.records.push(SaveRecord {
            tag,
            version,
            data: Vec::new(),
        });
        self.open = Some(self.records.len() - 1);
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> io::Result<()> {
        let record = self
            .open
            .and_then(|index| self.records.get_mut(index))
            .ok_or_else(|| io::Error::other("no co-save record is open"))?;
        record.data.extend_from_slice(data);
        Ok(())
    }
}

impl SaveRecordSource for CosaveFile {
    fn next_record(&mut self) -> Option<SaveRecord> {
        let record = self.records.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(record)
    }

    fn resolve_form_id(&self, saved: FormId) -> Option<FormId> {
        let index = (saved.raw() >> 24) as u8;
        match self.index_remap.get(&index) {
            Some(Some(current)) => Some(FormId::compose(*current, saved.raw())),
            Some(None) => None,
            None => Some(saved),
        }
    }
}
