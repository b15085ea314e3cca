//! Binlog file reader
//!
//! Reads v4 binary log files: verifies the magic number, parses the format
//! description event, and then yields decoded events one at a time. Table
//! map events are retained so that following rows events can be resolved.

use crate::binlog::event::{
    Event, EventData, EventHeader, EventType, FormatDescriptionEvent, EVENT_HEADER_LEN,
};
use crate::binlog::rows::RowsEvent;
use crate::binlog::table_map::TableMapEvent;
use crate::protocol::Reader;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// File magic: 0xFE 'b' 'i' 'n'
const BINLOG_MAGIC: [u8; 4] = [0xFE, 0x62, 0x69, 0x6E];

/// CRC32 checksum algorithm marker in the format description event
const CHECKSUM_CRC32: u8 = 1;

/// Reader over one binary log file
#[derive(Debug)]
pub struct BinlogFile<R> {
    reader: R,
    format: FormatDescriptionEvent,
    table_maps: HashMap<u64, TableMapEvent>,
}

impl BinlogFile<BufReader<File>> {
    /// Open a binlog file on disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> BinlogFile<R> {
    /// Read the magic number and format description from `reader`
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != BINLOG_MAGIC {
            return Err(Error::Binlog(
                "bad magic number, this is probably not a binlog".into(),
            ));
        }

        let header_bytes = read_header(&mut reader)?
            .ok_or_else(|| Error::Binlog("log ends before the first event".into()))?;
        let header = EventHeader::decode(&header_bytes)?;
        if header.event_type != EventType::FormatDescription {
            // v1/v3 logs start with a START_EVENT_V3 or go straight to data
            return Err(Error::Unsupported(format!(
                "only v4 binlogs are supported, first event is {}",
                header.event_type.name()
            )));
        }

        let mut payload = vec![0u8; header.payload_len()];
        reader.read_exact(&mut payload)?;
        let format = decode_format_description(&payload)?;
        tracing::debug!(
            server_version = %format.server_version,
            checksum = format.checksum_algorithm,
            "read format description"
        );

        Ok(Self {
            reader,
            format,
            table_maps: HashMap::new(),
        })
    }

    /// Format description of this log
    pub fn format(&self) -> &FormatDescriptionEvent {
        &self.format
    }

    /// Read and decode the next event, `None` at a clean end of file
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let header_bytes = match read_header(&mut self.reader)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let header = EventHeader::decode(&header_bytes)?;

        let mut payload = vec![0u8; header.payload_len()];
        self.reader.read_exact(&mut payload)?;

        // CRC32 trailer covers header and payload; strip it before decoding
        if self.format.checksum_algorithm == CHECKSUM_CRC32 {
            if payload.len() < 4 {
                return Err(Error::Binlog("event shorter than its checksum".into()));
            }
            payload.truncate(payload.len() - 4);
        }

        crate::metrics::counters::binlog_event_read(header.event_type.name());
        let data = self.decode_data(&header, &payload)?;
        Ok(Some(Event { header, data }))
    }

    fn decode_data(&mut self, header: &EventHeader, payload: &[u8]) -> Result<EventData> {
        match header.event_type {
            EventType::FormatDescription => {
                Ok(EventData::FormatDescription(self.format.clone()))
            }
            EventType::Rotate => {
                let mut r = Reader::new(payload);
                let position = r.u64_le()?;
                let next_log = String::from_utf8_lossy(r.rest()).into_owned();
                Ok(EventData::Rotate { position, next_log })
            }
            EventType::Query => decode_query(payload),
            EventType::Xid => {
                let mut r = Reader::new(payload);
                Ok(EventData::Xid(r.u64_le()?))
            }
            EventType::TableMap => {
                let event = TableMapEvent::decode(payload)?;
                self.table_maps.insert(event.table_id, event.clone());
                Ok(EventData::TableMap(event))
            }
            t if t.is_rows_event() => {
                let maps = &self.table_maps;
                let event = RowsEvent::decode(payload, t, |id| maps.get(&id).cloned())?;
                Ok(EventData::Rows(event))
            }
            other => {
                tracing::trace!(event_type = other.name(), "skipping event");
                Ok(EventData::Ignored(other))
            }
        }
    }
}

impl<R: Read> Iterator for BinlogFile<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

/// Read the next 19-byte event header, or `None` at a clean end of file
fn read_header(reader: &mut impl Read) -> Result<Option<[u8; EVENT_HEADER_LEN]>> {
    let mut buf = [0u8; EVENT_HEADER_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(Error::Binlog("truncated event header at end of log".into()));
        }
        filled += n;
    }
    Ok(Some(buf))
}

/// Parse the format description payload and detect the checksum algorithm.
///
/// Servers from 5.6.1 on append a checksum algorithm byte and a CRC32 of the
/// event itself; older servers end the payload with the post-header length
/// table.
fn decode_format_description(payload: &[u8]) -> Result<FormatDescriptionEvent> {
    let mut r = Reader::new(payload);
    let binlog_version = r.u16_le()?;
    if binlog_version != 4 {
        return Err(Error::Unsupported(format!(
            "binlog format version {}",
            binlog_version
        )));
    }

    let version_bytes = r.bytes(50)?;
    let server_version = String::from_utf8_lossy(
        version_bytes.split(|&b| b == 0).next().unwrap_or(&[]),
    )
    .into_owned();
    let create_timestamp = r.u32_le()?;
    let header_len = r.u8()?;
    if usize::from(header_len) != EVENT_HEADER_LEN {
        return Err(Error::Unsupported(format!(
            "event header length {}",
            header_len
        )));
    }

    let rest = r.rest();
    let checksum_algorithm = if version_at_least(&server_version, 5, 6, 1) && rest.len() >= 5 {
        rest[rest.len() - 5]
    } else {
        0
    };

    Ok(FormatDescriptionEvent {
        binlog_version,
        server_version,
        create_timestamp,
        header_len,
        checksum_algorithm,
    })
}

/// Compare a `major.minor.patch` server version string against a minimum
fn version_at_least(version: &str, major: u32, minor: u32, patch: u32) -> bool {
    let mut parts = version.split(|c: char| !c.is_ascii_digit());
    let got = (
        parts.next().and_then(|p| p.parse().ok()).unwrap_or(0u32),
        parts.next().and_then(|p| p.parse().ok()).unwrap_or(0u32),
        parts.next().and_then(|p| p.parse().ok()).unwrap_or(0u32),
    );
    got >= (major, minor, patch)
}

fn decode_query(payload: &[u8]) -> Result<EventData> {
    let mut r = Reader::new(payload);
    let thread_id = r.u32_le()?;
    let exec_time = r.u32_le()?;
    let schema_len = r.u8()? as usize;
    let error_code = r.u16_le()?;
    let status_len = r.u16_le()? as usize;
    r.bytes(status_len)?;
    let schema = String::from_utf8_lossy(r.bytes(schema_len)?).into_owned();
    let _nul = r.u8()?;
    let query = String::from_utf8_lossy(r.rest()).into_owned();

    Ok(EventData::Query {
        thread_id,
        exec_time,
        error_code,
        schema,
        query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_at_least() {
        assert!(version_at_least("5.6.1", 5, 6, 1));
        assert!(version_at_least("8.0.36-log", 5, 6, 1));
        assert!(!version_at_least("5.5.62", 5, 6, 1));
        assert!(!version_at_least("garbage", 5, 6, 1));
    }

    #[test]
    fn test_bad_magic() {
        let data = b"not a binlog at all";
        let err = BinlogFile::from_reader(&data[..]).unwrap_err();
        assert!(matches!(err, Error::Binlog(_)));
    }

    #[test]
    fn test_decode_query_payload() {
        let mut p = Vec::new();
        p.extend_from_slice(&7u32.to_le_bytes()); // thread id
        p.extend_from_slice(&0u32.to_le_bytes()); // exec time
        p.push(4); // schema length
        p.extend_from_slice(&0u16.to_le_bytes()); // error code
        p.extend_from_slice(&0u16.to_le_bytes()); // status vars length
        p.extend_from_slice(b"pets\0");
        p.extend_from_slice(b"BEGIN");

        match decode_query(&p).unwrap() {
            EventData::Query {
                thread_id,
                schema,
                query,
                ..
            } => {
                assert_eq!(thread_id, 7);
                assert_eq!(schema, "pets");
                assert_eq!(query, "BEGIN");
            }
            other => panic!("expected query event, got {:?}", other),
        }
    }
}
