//! Rows event decoding (write, update, delete)

use crate::binlog::bitset::Bitset;
use crate::binlog::event::EventType;
use crate::binlog::table_map::TableMapEvent;
use crate::binlog::value::{decode_value, BinlogValue};
use crate::protocol::Reader;
use crate::{Error, Result};

/// One row image: a value per table column. Columns not present in the
/// event's column bitmap decode as `None`.
pub type RowImage = Vec<Option<BinlogValue>>;

/// One decoded row change
#[derive(Debug, Clone)]
pub enum Row {
    /// Inserted row
    Write(RowImage),
    /// Deleted row
    Delete(RowImage),
    /// Updated row with before and after images
    Update {
        /// Row as it was
        before: RowImage,
        /// Row as it is now
        after: RowImage,
    },
}

/// Decoded rows event
#[derive(Debug, Clone)]
pub struct RowsEvent {
    /// Event type (write/update/delete, v1 or v2)
    pub event_type: EventType,
    /// Table id, resolved against the preceding table map event
    pub table_id: u64,
    /// Event flags
    pub flags: u16,
    /// Number of columns in the table
    pub column_count: usize,
    /// Decoded row changes
    pub rows: Vec<Row>,
}

impl RowsEvent {
    /// Decode from the event payload using the table map for this table id
    pub(crate) fn decode(
        payload: &[u8],
        event_type: EventType,
        table_map: impl Fn(u64) -> Option<TableMapEvent>,
    ) -> Result<Self> {
        let mut r = Reader::new(payload);

        let table_id = r.u48_le()?;
        let flags = r.u16_le()?;

        // v2 events carry a self-sized extra-data block, length inclusive
        if event_type.is_rows_v2() {
            let extra_len = r.u16_le()? as usize;
            if extra_len < 2 {
                return Err(Error::Binlog("rows event extra data shorter than its length field".into()));
            }
            r.bytes(extra_len - 2)?;
        }

        let table = table_map(table_id).ok_or_else(|| {
            Error::Binlog(format!("no table map event seen for table id {}", table_id))
        })?;

        let column_count = r.lenenc_int()? as usize;
        if column_count != table.column_count() {
            return Err(Error::Binlog(format!(
                "rows event has {} columns but table map has {}",
                column_count,
                table.column_count()
            )));
        }

        let present = read_bitset(&mut r, column_count)?;
        // Update events carry a second bitmap for the after image
        let present_after = if event_type.is_update() {
            Some(read_bitset(&mut r, column_count)?)
        } else {
            None
        };

        let mut rows = Vec::new();
        while r.remaining() > 0 {
            let image = decode_image(&mut r, &table, &present)?;
            let row = match (&present_after, event_type) {
                (Some(after_set), _) => {
                    let after = decode_image(&mut r, &table, after_set)?;
                    Row::Update {
                        before: image,
                        after,
                    }
                }
                (None, t) if matches!(t, EventType::DeleteRowsV0 | EventType::DeleteRowsV1 | EventType::DeleteRowsV2) => {
                    Row::Delete(image)
                }
                _ => Row::Write(image),
            };
            rows.push(row);
        }

        Ok(Self {
            event_type,
            table_id,
            flags,
            column_count,
            rows,
        })
    }
}

fn read_bitset(r: &mut Reader<'_>, bits: usize) -> Result<Bitset> {
    let bytes = r.bytes(Bitset::byte_len(bits))?;
    Ok(Bitset::from_bytes(bytes, bits))
}

/// Decode one row image: a null bitmap over the present columns, then a
/// value for every present, non-null column.
fn decode_image(r: &mut Reader<'_>, table: &TableMapEvent, present: &Bitset) -> Result<RowImage> {
    let present_count = present.count_set();
    let null_set = read_bitset(r, present_count)?;

    let mut image = Vec::with_capacity(table.column_count());
    let mut present_idx = 0;
    for col in 0..table.column_count() {
        if !present.bit(col) {
            image.push(None);
            continue;
        }

        let value = if null_set.bit(present_idx) {
            BinlogValue::Null
        } else {
            decode_value(r, table.column_types[col], &table.column_metadata[col])?
        };
        present_idx += 1;
        image.push(Some(value));
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::column_type;
    use crate::binlog::column::ColumnMetadata;

    /// Table map for `pets.bunnies (id INT, name VARCHAR(64))`
    fn bunnies_map() -> TableMapEvent {
        TableMapEvent {
            table_id: 110,
            flags: 1,
            schema: "pets".into(),
            table: "bunnies".into(),
            column_types: vec![column_type::MYSQL_TYPE_LONG, column_type::MYSQL_TYPE_VARCHAR],
            column_metadata: vec![ColumnMetadata::None, ColumnMetadata::MaxLength(64)],
            nullable: Bitset::from_bytes(&[0b10], 2),
        }
    }

    fn row_bytes(id: i32, name: &str) -> Vec<u8> {
        let mut p = Vec::new();
        p.push(0b00); // null bitmap, nothing null
        p.extend_from_slice(&id.to_le_bytes());
        p.push(name.len() as u8);
        p.extend_from_slice(name.as_bytes());
        p
    }

    fn write_rows_payload(rows: &[(i32, &str)]) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&[110, 0, 0, 0, 0, 0]); // table id
        p.extend_from_slice(&1u16.to_le_bytes()); // flags
        p.extend_from_slice(&2u16.to_le_bytes()); // v2 extra data: just the length
        p.push(2); // column count
        p.push(0b11); // both columns present
        for (id, name) in rows {
            p.extend_from_slice(&row_bytes(*id, name));
        }
        p
    }

    #[test]
    fn test_decode_write_rows() {
        let payload = write_rows_payload(&[(1, "bugs"), (2, "lola")]);
        let event =
            RowsEvent::decode(&payload, EventType::WriteRowsV2, |_| Some(bunnies_map())).unwrap();

        assert_eq!(event.table_id, 110);
        assert_eq!(event.column_count, 2);
        assert_eq!(event.rows.len(), 2);
        match &event.rows[0] {
            Row::Write(image) => {
                assert_eq!(image[0], Some(BinlogValue::Int(1)));
                assert_eq!(image[1], Some(BinlogValue::String("bugs".into())));
            }
            other => panic!("expected write row, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_null_cell() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[110, 0, 0, 0, 0, 0]);
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.push(2); // column count
        payload.push(0b11); // both present
        payload.push(0b10); // name is null
        payload.extend_from_slice(&7i32.to_le_bytes());

        let event =
            RowsEvent::decode(&payload, EventType::WriteRowsV1, |_| Some(bunnies_map())).unwrap();
        match &event.rows[0] {
            Row::Write(image) => {
                assert_eq!(image[0], Some(BinlogValue::Int(7)));
                assert_eq!(image[1], Some(BinlogValue::Null));
            }
            other => panic!("expected write row, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_update_rows_pairs() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[110, 0, 0, 0, 0, 0]);
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.push(2); // column count
        payload.push(0b11); // before image columns
        payload.push(0b11); // after image columns
        payload.extend_from_slice(&row_bytes(1, "bugs"));
        payload.extend_from_slice(&row_bytes(1, "daffy"));

        let event =
            RowsEvent::decode(&payload, EventType::UpdateRowsV1, |_| Some(bunnies_map())).unwrap();
        assert_eq!(event.rows.len(), 1);
        match &event.rows[0] {
            Row::Update { before, after } => {
                assert_eq!(before[1], Some(BinlogValue::String("bugs".into())));
                assert_eq!(after[1], Some(BinlogValue::String("daffy".into())));
            }
            other => panic!("expected update row, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_delete_rows() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[110, 0, 0, 0, 0, 0]);
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.push(2);
        payload.push(0b11);
        payload.extend_from_slice(&row_bytes(2, "lola"));

        let event =
            RowsEvent::decode(&payload, EventType::DeleteRowsV1, |_| Some(bunnies_map())).unwrap();
        assert!(matches!(event.rows[0], Row::Delete(_)));
    }

    #[test]
    fn test_decode_without_table_map() {
        let payload = write_rows_payload(&[(1, "bugs")]);
        let err = RowsEvent::decode(&payload, EventType::WriteRowsV2, |_| None).unwrap_err();
        assert!(matches!(err, Error::Binlog(_)));
    }

    #[test]
    fn test_decode_column_count_mismatch() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[110, 0, 0, 0, 0, 0]);
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.push(3); // table map says 2
        payload.push(0b111);

        let err =
            RowsEvent::decode(&payload, EventType::WriteRowsV1, |_| Some(bunnies_map())).unwrap_err();
        assert!(matches!(err, Error::Binlog(_)));
    }

    #[test]
    fn test_decode_partial_column_bitmap() {
        // Only the id column present; name decodes as absent
        let mut payload = Vec::new();
        payload.extend_from_slice(&[110, 0, 0, 0, 0, 0]);
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.push(2);
        payload.push(0b01); // only column 0
        payload.push(0b0); // null bitmap over one present column
        payload.extend_from_slice(&9i32.to_le_bytes());

        let event =
            RowsEvent::decode(&payload, EventType::WriteRowsV1, |_| Some(bunnies_map())).unwrap();
        match &event.rows[0] {
            Row::Write(image) => {
                assert_eq!(image[0], Some(BinlogValue::Int(9)));
                assert_eq!(image[1], None);
            }
            other => panic!("expected write row, got {:?}", other),
        }
    }
}
