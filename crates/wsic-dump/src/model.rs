use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use wsic_rs::record::{Record, RecordReader};

#[derive(Debug, Clone, Serialize)]
pub struct ObjectFile {
    pub records: Vec<Record>,
    /// Bytes left over after the last decodable record.
    pub trailing: usize,
}

pub fn parse_object(bytes: &[u8]) -> ObjectFile {
    let mut reader = RecordReader::new(bytes);
    let records: Vec<Record> = reader.by_ref().collect();
    ObjectFile { records, trailing: bytes.len() - reader.offset() }
}

pub fn load_object(path: &Path) -> Result<ObjectFile> {
    let file = std::fs::read(path)?;
    let obj = parse_object(&file);
    anyhow::ensure!(!obj.records.is_empty(), "{} holds no object records", path.display());
    Ok(obj)
}

/// Program name and extent from the header record, if present.
pub fn header(obj: &ObjectFile) -> Option<(&str, u32, u32)> {
    obj.records.iter().find_map(|r| match r {
        Record::Header { name, start, length } => Some((name.as_str(), *start, *length)),
        _ => None,
    })
}

/// Addresses patched by modification records.
pub fn relocations(obj: &ObjectFile) -> Vec<u32> {
    obj.records
        .iter()
        .filter_map(|r| match r {
            Record::Modification { address, .. } => Some(*address),
            _ => None,
        })
        .collect()
}
