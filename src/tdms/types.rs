use crate::error::{BatchError, Result};
use chrono::{DateTime, Utc};

/// On-disk TDMS data type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdsType {
    Void,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Boolean,
    Timestamp,
}

impl TdsType {
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0x00 => Ok(TdsType::Void),
            0x01 => Ok(TdsType::I8),
            0x02 => Ok(TdsType::I16),
            0x03 => Ok(TdsType::I32),
            0x04 => Ok(TdsType::I64),
            0x05 => Ok(TdsType::U8),
            0x06 => Ok(TdsType::U16),
            0x07 => Ok(TdsType::U32),
            0x08 => Ok(TdsType::U64),
            0x09 => Ok(TdsType::F32),
            0x0A => Ok(TdsType::F64),
            0x20 => Ok(TdsType::String),
            0x21 => Ok(TdsType::Boolean),
            0x44 => Ok(TdsType::Timestamp),
            other => Err(BatchError::Unsupported {
                feature: format!("data type code 0x{:08X}", other),
            }),
        }
    }

    /// Size of one value on disk. None for variable-length types.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            TdsType::Void => Some(1),
            TdsType::I8 | TdsType::U8 | TdsType::Boolean => Some(1),
            TdsType::I16 | TdsType::U16 => Some(2),
            TdsType::I32 | TdsType::U32 | TdsType::F32 => Some(4),
            TdsType::I64 | TdsType::U64 | TdsType::F64 => Some(8),
            TdsType::Timestamp => Some(16),
            TdsType::String => None,
        }
    }
}

/// A single decoded channel value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Text rendering used for CSV cells. Numbers use Rust's shortest
    /// round-trip formatting; timestamps render as UTC with microseconds.
    pub fn render(&self) -> String {
        match self {
            Value::I8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U8(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Timestamp(v) => v.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        }
    }
}

/// Seconds between the TDMS epoch (1904-01-01) and the Unix epoch.
const TDMS_EPOCH_OFFSET_SECS: i64 = 2_082_844_800;

/// Convert a raw TDMS timestamp (seconds since 1904 plus 2^-64 second
/// fractions) to a UTC datetime. Out-of-range values are an invalid file,
/// not a crash.
pub fn timestamp_from_raw(seconds: i64, fractions: u64) -> Result<DateTime<Utc>> {
    let unix_seconds = seconds
        .checked_sub(TDMS_EPOCH_OFFSET_SECS)
        .ok_or_else(|| BatchError::InvalidFormat {
            message: format!("timestamp seconds out of range: {}", seconds),
        })?;
    let nanos = ((fractions as u128 * 1_000_000_000) >> 64) as u32;

    DateTime::<Utc>::from_timestamp(unix_seconds, nanos).ok_or_else(|| BatchError::InvalidFormat {
        message: format!("timestamp out of range: {} s since 1904", seconds),
    })
}

/// Parsed TDMS object path: `/` (root), `/'Group'` or `/'Group'/'Channel'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectPath {
    Root,
    Group(String),
    Channel { group: String, channel: String },
}

impl ObjectPath {
    /// Parse an on-disk object path. Names are single-quoted with inner
    /// quotes doubled, e.g. `/'Eve''s group'/'chan'`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == "/" {
            return Ok(ObjectPath::Root);
        }

        let mut names = Vec::new();
        let mut chars = raw.chars().peekable();

        while chars.peek().is_some() {
            if chars.next() != Some('/') {
                return Err(invalid_path(raw));
            }
            if chars.next() != Some('\'') {
                return Err(invalid_path(raw));
            }

            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('\'') => {
                        // Doubled quote is an escaped quote inside the name.
                        if chars.peek() == Some(&'\'') {
                            chars.next();
                            name.push('\'');
                        } else {
                            break;
                        }
                    }
                    Some(c) => name.push(c),
                    None => return Err(invalid_path(raw)),
                }
            }
            names.push(name);
        }

        match names.len() {
            1 => Ok(ObjectPath::Group(names.remove(0))),
            2 => {
                let channel = names.pop().unwrap();
                let group = names.pop().unwrap();
                Ok(ObjectPath::Channel { group, channel })
            }
            _ => Err(invalid_path(raw)),
        }
    }
}

fn invalid_path(raw: &str) -> BatchError {
    BatchError::InvalidFormat {
        message: format!("malformed object path: {:?}", raw),
    }
}
