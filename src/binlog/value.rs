//! Cell value decoding for rows events

use crate::binlog::column::ColumnMetadata;
use crate::protocol::constants::column_type;
use crate::protocol::Reader;
use crate::{Error, Result};
use serde::Serialize;

/// One decoded cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BinlogValue {
    /// SQL NULL
    Null,
    /// Signed integer (TINY, SHORT, INT24, LONG, LONGLONG, ENUM)
    Int(i64),
    /// Unsigned integer (BIT)
    UInt(u64),
    /// FLOAT
    Float(f32),
    /// DOUBLE
    Double(f64),
    /// YEAR, stored with a 1900 offset
    Year(u16),
    /// Text value (VARCHAR, STRING)
    String(String),
    /// Binary value (BLOB family)
    Bytes(Vec<u8>),
    /// DATE
    Date {
        /// Four-digit year
        year: u16,
        /// Month 1..=12
        month: u8,
        /// Day of month
        day: u8,
    },
    /// TIME2, a signed duration
    Time {
        /// True for negative durations
        negative: bool,
        /// Whole hours (up to 838 in MySQL)
        hours: u16,
        /// Minutes 0..=59
        minutes: u8,
        /// Seconds 0..=59
        seconds: u8,
        /// Fractional seconds in microseconds
        micros: u32,
    },
    /// DATETIME2, a calendar timestamp without timezone
    DateTime {
        /// Four-digit year
        year: u16,
        /// Month 1..=12
        month: u8,
        /// Day of month
        day: u8,
        /// Hour 0..=23
        hour: u8,
        /// Minute 0..=59
        minute: u8,
        /// Second 0..=59
        second: u8,
        /// Fractional seconds in microseconds
        micros: u32,
    },
    /// TIMESTAMP2, seconds since the epoch
    Timestamp {
        /// Whole seconds since the epoch
        seconds: u32,
        /// Fractional seconds in microseconds
        micros: u32,
    },
}

/// Decode one non-NULL cell of the given column type
pub(crate) fn decode_value(
    r: &mut Reader<'_>,
    col_type: u8,
    metadata: &ColumnMetadata,
) -> Result<BinlogValue> {
    match col_type {
        column_type::MYSQL_TYPE_TINY => Ok(BinlogValue::Int(i64::from(r.u8()? as i8))),
        column_type::MYSQL_TYPE_SHORT => Ok(BinlogValue::Int(i64::from(r.u16_le()? as i16))),
        column_type::MYSQL_TYPE_INT24 => {
            let v = r.u24_le()?;
            // Sign-extend from 24 bits
            let signed = (v as i32) << 8 >> 8;
            Ok(BinlogValue::Int(i64::from(signed)))
        }
        column_type::MYSQL_TYPE_LONG => Ok(BinlogValue::Int(i64::from(r.u32_le()? as i32))),
        column_type::MYSQL_TYPE_LONGLONG => Ok(BinlogValue::Int(r.u64_le()? as i64)),

        column_type::MYSQL_TYPE_FLOAT => {
            Ok(BinlogValue::Float(f32::from_le_bytes(fixed4(r.bytes(4)?))))
        }
        column_type::MYSQL_TYPE_DOUBLE => {
            Ok(BinlogValue::Double(f64::from_le_bytes(fixed8(r.bytes(8)?))))
        }

        column_type::MYSQL_TYPE_NULL => Ok(BinlogValue::Null),

        column_type::MYSQL_TYPE_YEAR => {
            let v = r.u8()?;
            if v == 0 {
                Ok(BinlogValue::Year(0))
            } else {
                Ok(BinlogValue::Year(1900 + u16::from(v)))
            }
        }

        column_type::MYSQL_TYPE_DATE => {
            let v = r.u24_le()?;
            Ok(BinlogValue::Date {
                year: (v >> 9) as u16,
                month: ((v >> 5) & 0x0F) as u8,
                day: (v & 0x1F) as u8,
            })
        }

        column_type::MYSQL_TYPE_TIME2 => decode_time2(r, metadata.fsp()?),
        column_type::MYSQL_TYPE_DATETIME2 => decode_datetime2(r, metadata.fsp()?),
        column_type::MYSQL_TYPE_TIMESTAMP2 => decode_timestamp2(r, metadata.fsp()?),

        column_type::MYSQL_TYPE_VARCHAR => {
            let max_len = match metadata {
                ColumnMetadata::MaxLength(n) => *n,
                other => {
                    return Err(Error::Binlog(format!(
                        "VARCHAR column with metadata {:?}",
                        other
                    )))
                }
            };
            let len = if max_len < 256 {
                r.u8()? as usize
            } else {
                r.u16_le()? as usize
            };
            Ok(BinlogValue::String(
                String::from_utf8_lossy(r.bytes(len)?).into_owned(),
            ))
        }

        column_type::MYSQL_TYPE_STRING | column_type::MYSQL_TYPE_VAR_STRING => {
            let (real_type, field_len) = match metadata {
                ColumnMetadata::String { real_type, length } => (*real_type, *length),
                other => {
                    return Err(Error::Binlog(format!(
                        "STRING column with metadata {:?}",
                        other
                    )))
                }
            };
            match real_type {
                // ENUM values are stored as 1 or 2 byte indexes
                column_type::MYSQL_TYPE_ENUM => {
                    let v = if field_len == 1 {
                        u64::from(r.u8()?)
                    } else {
                        u64::from(r.u16_le()?)
                    };
                    Ok(BinlogValue::Int(v as i64))
                }
                // SET values are a bitmask of field_len bytes
                column_type::MYSQL_TYPE_SET => {
                    let mut v = 0u64;
                    for (i, b) in r.bytes(field_len as usize)?.iter().enumerate() {
                        v |= u64::from(*b) << (8 * i);
                    }
                    Ok(BinlogValue::UInt(v))
                }
                _ => {
                    // Length prefix width follows the field length, as for VARCHAR
                    let len = if field_len > 255 {
                        r.u16_le()? as usize
                    } else {
                        r.u8()? as usize
                    };
                    Ok(BinlogValue::String(
                        String::from_utf8_lossy(r.bytes(len)?).into_owned(),
                    ))
                }
            }
        }

        column_type::MYSQL_TYPE_BIT => {
            let (bits, bytes) = match metadata {
                ColumnMetadata::Bits { bits, bytes } => (*bits, *bytes),
                other => {
                    return Err(Error::Binlog(format!("BIT column with metadata {:?}", other)))
                }
            };
            let total = (usize::from(bytes) * 8 + usize::from(bits) + 7) / 8;
            if total > 8 {
                return Err(Error::Unsupported("BIT columns wider than 64 bits".into()));
            }
            let mut v = 0u64;
            for b in r.bytes(total)? {
                v = v << 8 | u64::from(*b);
            }
            Ok(BinlogValue::UInt(v))
        }

        column_type::MYSQL_TYPE_BLOB
        | column_type::MYSQL_TYPE_GEOMETRY
        | column_type::MYSQL_TYPE_JSON => {
            let prefix = metadata.pack_size()?;
            let mut len = 0usize;
            for (i, b) in r.bytes(prefix)?.iter().enumerate() {
                len |= usize::from(*b) << (8 * i);
            }
            Ok(BinlogValue::Bytes(r.bytes(len)?.to_vec()))
        }

        column_type::MYSQL_TYPE_NEWDECIMAL => {
            Err(Error::Unsupported("NEWDECIMAL values".into()))
        }

        other => Err(Error::Unsupported(format!(
            "column type {} in rows event",
            other
        ))),
    }
}

fn fixed4(b: &[u8]) -> [u8; 4] {
    [b[0], b[1], b[2], b[3]]
}

fn fixed8(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// Bytes used to store `fsp` fractional digits
fn frac_pack_size(fsp: u8) -> usize {
    (usize::from(fsp) + 1) / 2
}

/// Read the big-endian fractional part and scale it to microseconds
fn read_micros(r: &mut Reader<'_>, fsp: u8) -> Result<u32> {
    let size = frac_pack_size(fsp);
    if size == 0 {
        return Ok(0);
    }
    let mut v = 0u32;
    for b in r.bytes(size)? {
        v = v << 8 | u32::from(*b);
    }
    // Stored value holds fsp digits; scale up to 6
    let scale = match size {
        1 => 10_000,
        2 => 100,
        _ => 1,
    };
    Ok(v * scale)
}

/// TIME2: 3 bytes big-endian, sign + 10-bit hour + 6-bit minute + 6-bit second
fn decode_time2(r: &mut Reader<'_>, fsp: u8) -> Result<BinlogValue> {
    let mut v = 0u32;
    for b in r.bytes(3)? {
        v = v << 8 | u32::from(*b);
    }

    // Sign bit clear means a negative duration, stored in complement form
    let negative = v & 0x80_0000 == 0;
    let v = if negative { 0x100_0000 - v } else { v };

    let micros = read_micros(r, fsp)?;
    Ok(BinlogValue::Time {
        negative,
        hours: ((v >> 12) & 0x3FF) as u16,
        minutes: ((v >> 6) & 0x3F) as u8,
        seconds: (v & 0x3F) as u8,
        micros,
    })
}

/// DATETIME2: 5 bytes big-endian, sign + 17-bit year*13+month + day/hour/minute/second
fn decode_datetime2(r: &mut Reader<'_>, fsp: u8) -> Result<BinlogValue> {
    let mut v = 0u64;
    for b in r.bytes(5)? {
        v = v << 8 | u64::from(*b);
    }

    let year_month = (v >> 22) & 0x1_FFFF;
    let micros = read_micros(r, fsp)?;
    Ok(BinlogValue::DateTime {
        year: (year_month / 13) as u16,
        month: (year_month % 13) as u8,
        day: ((v >> 17) & 0x1F) as u8,
        hour: ((v >> 12) & 0x1F) as u8,
        minute: ((v >> 6) & 0x3F) as u8,
        second: (v & 0x3F) as u8,
        micros,
    })
}

/// TIMESTAMP2: 4 bytes big-endian seconds, then the fractional part
fn decode_timestamp2(r: &mut Reader<'_>, fsp: u8) -> Result<BinlogValue> {
    let b = r.bytes(4)?;
    let seconds = u32::from_be_bytes(fixed4(b));
    let micros = read_micros(r, fsp)?;
    Ok(BinlogValue::Timestamp { seconds, micros })
}
