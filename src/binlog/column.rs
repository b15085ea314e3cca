//! Per-column metadata from table map events
//!
//! The metadata block in a table map event carries a variable number of
//! bytes per column, keyed by the column type. Each variant decodes into
//! the fields the rows decoder needs.

use crate::protocol::constants::column_type;
use crate::protocol::Reader;
use crate::{Error, Result};

/// Decoded metadata for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMetadata {
    /// Column type carries no metadata
    None,
    /// Size in bytes of the value's length prefix (BLOB, GEOMETRY) or of
    /// the value itself (FLOAT, DOUBLE)
    PackSize(u8),
    /// Maximum length for VARCHAR and VAR_STRING columns
    MaxLength(u16),
    /// Real type byte plus field length for STRING columns, which may hold
    /// ENUM and SET values under the covers
    String {
        /// Underlying type byte
        real_type: u8,
        /// Field length in bytes
        length: u16,
    },
    /// Bit count and pack size for BIT columns
    Bits {
        /// Number of bits
        bits: u8,
        /// Bytes used to store them
        bytes: u8,
    },
    /// Precision and scale for NEWDECIMAL columns
    Decimal {
        /// Total digits
        precision: u8,
        /// Digits after the decimal point
        decimals: u8,
    },
    /// Fractional-seconds precision (0..=6) for TIME2/DATETIME2/TIMESTAMP2
    Fsp(u8),
}

impl ColumnMetadata {
    /// Decode metadata for one column of the given type
    pub(crate) fn decode(r: &mut Reader<'_>, col_type: u8) -> Result<Self> {
        match col_type {
            column_type::MYSQL_TYPE_FLOAT
            | column_type::MYSQL_TYPE_DOUBLE
            | column_type::MYSQL_TYPE_BLOB
            | column_type::MYSQL_TYPE_GEOMETRY
            | column_type::MYSQL_TYPE_JSON => Ok(Self::PackSize(r.u8()?)),

            column_type::MYSQL_TYPE_TIMESTAMP2
            | column_type::MYSQL_TYPE_DATETIME2
            | column_type::MYSQL_TYPE_TIME2 => {
                let fsp = r.u8()?;
                if fsp > 6 {
                    return Err(Error::Binlog(format!(
                        "fractional seconds precision {} out of range",
                        fsp
                    )));
                }
                Ok(Self::Fsp(fsp))
            }

            column_type::MYSQL_TYPE_VARCHAR => Ok(Self::MaxLength(r.u16_le()?)),

            column_type::MYSQL_TYPE_VAR_STRING | column_type::MYSQL_TYPE_STRING => {
                let b0 = r.u8()?;
                let b1 = r.u8()?;
                // Byte lengths above 255 are packed into the first byte:
                // b0 = real_type XOR ((length & 0x300) >> 4)
                let (real_type, length) = if b0 & 0x30 != 0x30 {
                    (b0 | 0x30, u16::from(b1) + (u16::from((b0 & 0x30) ^ 0x30) << 4))
                } else {
                    (b0, u16::from(b1))
                };
                Ok(Self::String { real_type, length })
            }

            column_type::MYSQL_TYPE_BIT => {
                let bits = r.u8()?;
                let bytes = r.u8()?;
                Ok(Self::Bits { bits, bytes })
            }

            column_type::MYSQL_TYPE_NEWDECIMAL => {
                let precision = r.u8()?;
                let decimals = r.u8()?;
                Ok(Self::Decimal {
                    precision,
                    decimals,
                })
            }

            _ => Ok(Self::None),
        }
    }

    /// Length-prefix size for BLOB-family values
    pub fn pack_size(&self) -> Result<usize> {
        match self {
            Self::PackSize(n) => Ok(*n as usize),
            other => Err(Error::Binlog(format!(
                "column metadata {:?} has no pack size",
                other
            ))),
        }
    }

    /// Fractional-seconds precision for temporal v2 values
    pub fn fsp(&self) -> Result<u8> {
        match self {
            Self::Fsp(fsp) => Ok(*fsp),
            other => Err(Error::Binlog(format!(
                "column metadata {:?} has no fractional precision",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pack_size() {
        let mut r = Reader::new(&[2]);
        let meta = ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_BLOB).unwrap();
        assert_eq!(meta, ColumnMetadata::PackSize(2));
        assert_eq!(meta.pack_size().unwrap(), 2);
    }

    #[test]
    fn test_decode_varchar() {
        let mut r = Reader::new(&[0x00, 0x01]); // max length 256
        let meta = ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_VARCHAR).unwrap();
        assert_eq!(meta, ColumnMetadata::MaxLength(256));
    }

    #[test]
    fn test_decode_fsp() {
        let mut r = Reader::new(&[3]);
        let meta = ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_DATETIME2).unwrap();
        assert_eq!(meta.fsp().unwrap(), 3);
    }

    #[test]
    fn test_decode_fsp_out_of_range() {
        let mut r = Reader::new(&[7]);
        assert!(ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_TIME2).is_err());
    }

    #[test]
    fn test_decode_no_metadata() {
        let mut r = Reader::new(&[]);
        let meta = ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_LONG).unwrap();
        assert_eq!(meta, ColumnMetadata::None);
    }

    #[test]
    fn test_decode_string_short() {
        let mut r = Reader::new(&[column_type::MYSQL_TYPE_STRING, 64]);
        let meta = ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_STRING).unwrap();
        assert_eq!(
            meta,
            ColumnMetadata::String {
                real_type: column_type::MYSQL_TYPE_STRING,
                length: 64
            }
        );
    }

    #[test]
    fn test_decode_string_packed_wide_length() {
        // CHAR with byte length 300: 0xFE ^ ((300 & 0x300) >> 4) = 0xEE,
        // low byte 300 - 256 = 44
        let mut r = Reader::new(&[0xEE, 44]);
        let meta = ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_STRING).unwrap();
        assert_eq!(
            meta,
            ColumnMetadata::String {
                real_type: column_type::MYSQL_TYPE_STRING,
                length: 300
            }
        );
    }

    #[test]
    fn test_decode_string_packed_enum() {
        // ENUM (0xF7) hides under STRING; 0xF7 & 0x30 == 0x30, no packing
        let mut r = Reader::new(&[column_type::MYSQL_TYPE_ENUM, 1]);
        let meta = ColumnMetadata::decode(&mut r, column_type::MYSQL_TYPE_STRING).unwrap();
        assert_eq!(
            meta,
            ColumnMetadata::String {
                real_type: column_type::MYSQL_TYPE_ENUM,
                length: 1
            }
        );
    }

    #[test]
    fn test_pack_size_wrong_variant() {
        assert!(ColumnMetadata::None.pack_size().is_err());
        assert!(ColumnMetadata::MaxLength(10).fsp().is_err());
    }
}
