//! Binary object records.
//!
//! Every record starts with a one-byte tag followed by fixed little-endian
//! fields. Text records are followed by their raw payload bytes.
//!
//! | Record       | Tag  | Fields                                   |
//! |--------------|------|------------------------------------------|
//! | Header       | 0x00 | name[6] (NUL padded), start:3, length:3  |
//! | Text         | 0x01 | start:3, len:1, payload[len]             |
//! | End          | 0x02 | exec:3                                   |
//! | Modification | 0x03 | address:3, len:1                         |

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::memory::WORD_MASK;

pub const HEADER_TAG: u8 = 0x00;
pub const TEXT_TAG: u8 = 0x01;
pub const END_TAG: u8 = 0x02;
pub const MODIFICATION_TAG: u8 = 0x03;

/// Largest payload a single text record may carry.
pub const MAX_TEXT_LEN: usize = 30;

pub const NAME_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Header { name: String, start: u32, length: u32 },
    Text { start: u32, payload: Vec<u8> },
    Modification { address: u32, length: u8 },
    End { exec: u32 },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("{field} value {value:#x} does not fit in 24 bits")]
    FieldOverflow { field: &'static str, value: u32 },
    #[error("text record payload of {len} bytes exceeds {MAX_TEXT_LEN}")]
    PayloadTooLong { len: usize },
    #[error("program name {0:?} is longer than {NAME_LEN} bytes")]
    NameTooLong(String),
}

fn put_u24(out: &mut Vec<u8>, field: &'static str, value: u32) -> Result<(), RecordError> {
    if value > WORD_MASK {
        return Err(RecordError::FieldOverflow { field, value });
    }
    out.extend_from_slice(&value.to_le_bytes()[..3]);
    Ok(())
}

fn get_u24(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], 0])
}

impl Record {
    pub fn tag(&self) -> u8 {
        match self {
            Record::Header { .. } => HEADER_TAG,
            Record::Text { .. } => TEXT_TAG,
            Record::End { .. } => END_TAG,
            Record::Modification { .. } => MODIFICATION_TAG,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), RecordError> {
        out.push(self.tag());
        match self {
            Record::Header { name, start, length } => {
                if name.len() > NAME_LEN {
                    return Err(RecordError::NameTooLong(name.clone()));
                }
                let mut field = [0u8; NAME_LEN];
                field[..name.len()].copy_from_slice(name.as_bytes());
                out.extend_from_slice(&field);
                put_u24(out, "start", *start)?;
                put_u24(out, "length", *length)?;
            }
            Record::Text { start, payload } => {
                if payload.len() > MAX_TEXT_LEN {
                    return Err(RecordError::PayloadTooLong { len: payload.len() });
                }
                put_u24(out, "start", *start)?;
                out.push(payload.len() as u8);
                out.extend_from_slice(payload);
            }
            Record::End { exec } => put_u24(out, "exec", *exec)?,
            Record::Modification { address, length } => {
                put_u24(out, "address", *address)?;
                out.push(*length);
            }
        }
        Ok(())
    }

    /// Decode one record from the front of `buf`, returning it together
    /// with the number of bytes consumed (payload included).
    ///
    /// `None` means the stream ends here: the buffer is empty, starts with
    /// an unknown tag, or holds a truncated record.
    pub fn decode(buf: &[u8]) -> Option<(Record, usize)> {
        let (&tag, body) = buf.split_first()?;
        let fixed = match tag {
            HEADER_TAG => NAME_LEN + 6,
            TEXT_TAG => 4,
            END_TAG => 3,
            MODIFICATION_TAG => 4,
            _ => return None,
        };
        if body.len() < fixed {
            warn!("truncated record with tag {tag:#04x}");
            return None;
        }
        let rec = match tag {
            HEADER_TAG => {
                let name = &body[..NAME_LEN];
                let end = name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
                Record::Header {
                    name: String::from_utf8_lossy(&name[..end]).into_owned(),
                    start: get_u24(&body[NAME_LEN..]),
                    length: get_u24(&body[NAME_LEN + 3..]),
                }
            }
            TEXT_TAG => {
                let len = body[3] as usize;
                let Some(payload) = body.get(fixed..fixed + len) else {
                    warn!("text record payload truncated ({len} bytes declared)");
                    return None;
                };
                Record::Text {
                    start: get_u24(body),
                    payload: payload.to_vec(),
                }
            }
            END_TAG => Record::End { exec: get_u24(body) },
            _ => Record::Modification {
                address: get_u24(body),
                length: body[3],
            },
        };
        let consumed = 1 + fixed + match &rec {
            Record::Text { payload, .. } => payload.len(),
            _ => 0,
        };
        Some((rec, consumed))
    }
}

/// Serialize a record sequence into an object file image.
pub fn encode_program(records: &[Record]) -> Result<Vec<u8>, RecordError> {
    let mut out = Vec::new();
    for r in records {
        r.encode(&mut out)?;
    }
    Ok(out)
}

/// Iterator over the records of an object file image.
pub struct RecordReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Byte offset of the next undecoded record.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for RecordReader<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let (rec, used) = Record::decode(&self.buf[self.offset..])?;
        self.offset += used;
        Some(rec)
    }
}

pub fn decode_program(buf: &[u8]) -> Vec<Record> {
    RecordReader::new(buf).collect()
}
