//! Table map event decoding
//!
//! A table map event precedes every run of rows events and binds a numeric
//! table id to the schema, table name and column layout the rows decoder
//! needs.

use crate::binlog::bitset::Bitset;
use crate::binlog::column::ColumnMetadata;
use crate::protocol::Reader;
use crate::{Error, Result};

/// Decoded table map event
#[derive(Debug, Clone)]
pub struct TableMapEvent {
    /// Numeric table id referenced by following rows events
    pub table_id: u64,
    /// Event flags
    pub flags: u16,
    /// Schema (database) name
    pub schema: String,
    /// Table name
    pub table: String,
    /// Column type bytes, one per column
    pub column_types: Vec<u8>,
    /// Per-column metadata, parallel to `column_types`
    pub column_metadata: Vec<ColumnMetadata>,
    /// Columns that may hold NULL
    pub nullable: Bitset,
}

impl TableMapEvent {
    /// Decode from the event payload (header already stripped)
    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);

        let table_id = r.u48_le()?;
        let flags = r.u16_le()?;

        let schema_len = r.u8()? as usize;
        let schema = String::from_utf8_lossy(r.bytes(schema_len)?).into_owned();
        expect_nul(&mut r)?;

        let table_len = r.u8()? as usize;
        let table = String::from_utf8_lossy(r.bytes(table_len)?).into_owned();
        expect_nul(&mut r)?;

        let column_count = r.lenenc_int()? as usize;
        let column_types = r.bytes(column_count)?.to_vec();

        let metadata_len = r.lenenc_int()? as usize;
        if metadata_len > r.remaining() {
            return Err(Error::Binlog(format!(
                "metadata length {} exceeds remaining payload",
                metadata_len
            )));
        }
        let mut meta_reader = Reader::new(r.bytes(metadata_len)?);
        let mut column_metadata = Vec::with_capacity(column_count);
        for &col_type in &column_types {
            column_metadata.push(ColumnMetadata::decode(&mut meta_reader, col_type)?);
        }
        if meta_reader.remaining() > 0 {
            return Err(Error::Binlog("trailing bytes in column metadata".into()));
        }

        let null_bytes = r.bytes(Bitset::byte_len(column_count))?;
        let nullable = Bitset::from_bytes(null_bytes, column_count);

        Ok(Self {
            table_id,
            flags,
            schema,
            table,
            column_types,
            column_metadata,
            nullable,
        })
    }

    /// Number of columns in the mapped table
    pub fn column_count(&self) -> usize {
        self.column_types.len()
    }
}

fn expect_nul(r: &mut Reader<'_>) -> Result<()> {
    if r.u8()? != 0 {
        return Err(Error::Binlog("missing string terminator".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::column_type;

    /// Table map payload for `pets.bunnies (id INT, name VARCHAR(64))`
    fn sample_payload() -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&[0x6E, 0x00, 0x00, 0x00, 0x00, 0x00]); // table id 110
        p.extend_from_slice(&1u16.to_le_bytes()); // flags
        p.push(4);
        p.extend_from_slice(b"pets\0");
        p.push(7);
        p.extend_from_slice(b"bunnies\0");
        p.push(2); // column count
        p.push(column_type::MYSQL_TYPE_LONG);
        p.push(column_type::MYSQL_TYPE_VARCHAR);
        p.push(2); // metadata length
        p.extend_from_slice(&64u16.to_le_bytes()); // varchar max length
        p.push(0b0000_0010); // name is nullable
        p
    }

    #[test]
    fn test_decode_table_map() {
        let event = TableMapEvent::decode(&sample_payload()).unwrap();
        assert_eq!(event.table_id, 110);
        assert_eq!(event.schema, "pets");
        assert_eq!(event.table, "bunnies");
        assert_eq!(event.column_count(), 2);
        assert_eq!(event.column_metadata[0], ColumnMetadata::None);
        assert_eq!(event.column_metadata[1], ColumnMetadata::MaxLength(64));
        assert!(!event.nullable.bit(0));
        assert!(event.nullable.bit(1));
    }

    #[test]
    fn test_decode_missing_terminator() {
        let mut p = sample_payload();
        p[13] = b'x'; // overwrite the schema NUL
        assert!(TableMapEvent::decode(&p).is_err());
    }

    #[test]
    fn test_decode_truncated() {
        let p = sample_payload();
        assert!(TableMapEvent::decode(&p[..10]).is_err());
    }

    #[test]
    fn test_decode_metadata_overrun() {
        let mut p = sample_payload();
        p[26] = 200; // metadata length field
        assert!(TableMapEvent::decode(&p).is_err());
    }
}
