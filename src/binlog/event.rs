//! Binlog event types and the common event header

use crate::binlog::rows::RowsEvent;
use crate::binlog::table_map::TableMapEvent;
use crate::protocol::Reader;
use crate::{Error, Result};

/// Fixed size of the v4 event header
pub const EVENT_HEADER_LEN: usize = 19;

/// Binlog event type codes (v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EventType {
    Unknown,
    StartV3,
    Query,
    Stop,
    Rotate,
    Intvar,
    Load,
    Slave,
    CreateFile,
    AppendBlock,
    ExecLoad,
    DeleteFile,
    NewLoad,
    Rand,
    UserVar,
    FormatDescription,
    Xid,
    BeginLoadQuery,
    ExecuteLoadQuery,
    TableMap,
    WriteRowsV0,
    UpdateRowsV0,
    DeleteRowsV0,
    WriteRowsV1,
    UpdateRowsV1,
    DeleteRowsV1,
    Incident,
    Heartbeat,
    Ignorable,
    RowsQuery,
    WriteRowsV2,
    UpdateRowsV2,
    DeleteRowsV2,
    Gtid,
    AnonymousGtid,
    PreviousGtids,
    Other(u8),
}

impl EventType {
    /// Map the header type byte to an event type
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::StartV3,
            2 => Self::Query,
            3 => Self::Stop,
            4 => Self::Rotate,
            5 => Self::Intvar,
            6 => Self::Load,
            7 => Self::Slave,
            8 => Self::CreateFile,
            9 => Self::AppendBlock,
            10 => Self::ExecLoad,
            11 => Self::DeleteFile,
            12 => Self::NewLoad,
            13 => Self::Rand,
            14 => Self::UserVar,
            15 => Self::FormatDescription,
            16 => Self::Xid,
            17 => Self::BeginLoadQuery,
            18 => Self::ExecuteLoadQuery,
            19 => Self::TableMap,
            20 => Self::WriteRowsV0,
            21 => Self::UpdateRowsV0,
            22 => Self::DeleteRowsV0,
            23 => Self::WriteRowsV1,
            24 => Self::UpdateRowsV1,
            25 => Self::DeleteRowsV1,
            26 => Self::Incident,
            27 => Self::Heartbeat,
            28 => Self::Ignorable,
            29 => Self::RowsQuery,
            30 => Self::WriteRowsV2,
            31 => Self::UpdateRowsV2,
            32 => Self::DeleteRowsV2,
            33 => Self::Gtid,
            34 => Self::AnonymousGtid,
            35 => Self::PreviousGtids,
            other => Self::Other(other),
        }
    }

    /// True for write/update/delete rows events of any version
    pub fn is_rows_event(&self) -> bool {
        matches!(
            self,
            Self::WriteRowsV0
                | Self::UpdateRowsV0
                | Self::DeleteRowsV0
                | Self::WriteRowsV1
                | Self::UpdateRowsV1
                | Self::DeleteRowsV1
                | Self::WriteRowsV2
                | Self::UpdateRowsV2
                | Self::DeleteRowsV2
        )
    }

    /// True for v2 rows events, which carry an extra-data block after the table id
    pub fn is_rows_v2(&self) -> bool {
        matches!(
            self,
            Self::WriteRowsV2 | Self::UpdateRowsV2 | Self::DeleteRowsV2
        )
    }

    /// True for update rows events, which carry before/after image pairs
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            Self::UpdateRowsV0 | Self::UpdateRowsV1 | Self::UpdateRowsV2
        )
    }

    /// Short name for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::StartV3 => "start_v3",
            Self::Query => "query",
            Self::Stop => "stop",
            Self::Rotate => "rotate",
            Self::Intvar => "intvar",
            Self::Load => "load",
            Self::Slave => "slave",
            Self::CreateFile => "create_file",
            Self::AppendBlock => "append_block",
            Self::ExecLoad => "exec_load",
            Self::DeleteFile => "delete_file",
            Self::NewLoad => "new_load",
            Self::Rand => "rand",
            Self::UserVar => "user_var",
            Self::FormatDescription => "format_description",
            Self::Xid => "xid",
            Self::BeginLoadQuery => "begin_load_query",
            Self::ExecuteLoadQuery => "execute_load_query",
            Self::TableMap => "table_map",
            Self::WriteRowsV0 | Self::WriteRowsV1 | Self::WriteRowsV2 => "write_rows",
            Self::UpdateRowsV0 | Self::UpdateRowsV1 | Self::UpdateRowsV2 => "update_rows",
            Self::DeleteRowsV0 | Self::DeleteRowsV1 | Self::DeleteRowsV2 => "delete_rows",
            Self::Incident => "incident",
            Self::Heartbeat => "heartbeat",
            Self::Ignorable => "ignorable",
            Self::RowsQuery => "rows_query",
            Self::Gtid => "gtid",
            Self::AnonymousGtid => "anonymous_gtid",
            Self::PreviousGtids => "previous_gtids",
            Self::Other(_) => "other",
        }
    }
}

/// Common v4 event header (19 bytes, little-endian)
#[derive(Debug, Clone)]
pub struct EventHeader {
    /// Event creation time (seconds since the epoch)
    pub timestamp: u32,
    /// Event type
    pub event_type: EventType,
    /// Server id of the originating server
    pub server_id: u32,
    /// Total event size, header included
    pub event_size: u32,
    /// Offset of the next event in the log file
    pub next_position: u32,
    /// Event flags
    pub flags: u16,
}

impl EventHeader {
    /// Decode the 19-byte header
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < EVENT_HEADER_LEN {
            return Err(Error::Binlog("truncated event header".into()));
        }
        let mut r = Reader::new(bytes);
        let timestamp = r.u32_le()?;
        let event_type = EventType::from_u8(r.u8()?);
        let server_id = r.u32_le()?;
        let event_size = r.u32_le()?;
        let next_position = r.u32_le()?;
        let flags = r.u16_le()?;

        if (event_size as usize) < EVENT_HEADER_LEN {
            return Err(Error::Binlog(format!(
                "event size {} smaller than header",
                event_size
            )));
        }

        Ok(Self {
            timestamp,
            event_type,
            server_id,
            event_size,
            next_position,
            flags,
        })
    }

    /// Payload length after the header
    pub fn payload_len(&self) -> usize {
        self.event_size as usize - EVENT_HEADER_LEN
    }
}

/// Format description event (the first event in every v4 log)
#[derive(Debug, Clone)]
pub struct FormatDescriptionEvent {
    /// Binlog format version, always 4 here
    pub binlog_version: u16,
    /// Server version string that wrote the log
    pub server_version: String,
    /// Log creation time
    pub create_timestamp: u32,
    /// Header length for all following events
    pub header_len: u8,
    /// Checksum algorithm: 0 = off, 1 = CRC32
    pub checksum_algorithm: u8,
}

/// A decoded binlog event
#[derive(Debug, Clone)]
pub struct Event {
    /// Common header
    pub header: EventHeader,
    /// Type-specific payload
    pub data: EventData,
}

/// Type-specific event payloads
#[derive(Debug, Clone)]
pub enum EventData {
    /// Format description, first event of the log
    FormatDescription(FormatDescriptionEvent),
    /// Rotate to the next log file
    Rotate {
        /// Position in the next file
        position: u64,
        /// Next file name
        next_log: String,
    },
    /// Statement executed on the server
    Query {
        /// Id of the thread that issued the statement
        thread_id: u32,
        /// Execution time in seconds
        exec_time: u32,
        /// Error code of the statement
        error_code: u16,
        /// Default schema at execution time
        schema: String,
        /// Statement text
        query: String,
    },
    /// Transaction commit
    Xid(u64),
    /// Table id to schema/table/column mapping for following rows events
    TableMap(TableMapEvent),
    /// Row changes (insert, update or delete)
    Rows(RowsEvent),
    /// Event type the reader does not decode
    Ignored(EventType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_roundtrip() {
        assert_eq!(EventType::from_u8(15), EventType::FormatDescription);
        assert_eq!(EventType::from_u8(19), EventType::TableMap);
        assert_eq!(EventType::from_u8(30), EventType::WriteRowsV2);
        assert_eq!(EventType::from_u8(200), EventType::Other(200));
    }

    #[test]
    fn test_rows_event_classification() {
        assert!(EventType::WriteRowsV1.is_rows_event());
        assert!(EventType::UpdateRowsV2.is_rows_event());
        assert!(EventType::UpdateRowsV2.is_rows_v2());
        assert!(EventType::UpdateRowsV2.is_update());
        assert!(!EventType::WriteRowsV1.is_rows_v2());
        assert!(!EventType::TableMap.is_rows_event());
    }

    #[test]
    fn test_event_header_decode() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1700000000u32.to_le_bytes());
        bytes.push(19); // table map
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&57u32.to_le_bytes());
        bytes.extend_from_slice(&1234u32.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());

        let header = EventHeader::decode(&bytes).unwrap();
        assert_eq!(header.timestamp, 1700000000);
        assert_eq!(header.event_type, EventType::TableMap);
        assert_eq!(header.server_id, 1);
        assert_eq!(header.event_size, 57);
        assert_eq!(header.next_position, 1234);
        assert_eq!(header.payload_len(), 38);
    }

    #[test]
    fn test_event_header_truncated() {
        assert!(EventHeader::decode(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_event_header_size_below_header_len() {
        let mut bytes = vec![0u8; 19];
        bytes[9] = 10; // event_size = 10
        assert!(EventHeader::decode(&bytes).is_err());
    }
}
