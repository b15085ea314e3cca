//! Binary log (binlog) file parsing
//!
//! Supports v4 log files as written by MySQL 5.x and 8.x: the format
//! description event, table maps, and row change events with typed cell
//! values. Events the reader does not decode are yielded as
//! [`EventData::Ignored`] rather than failing the stream.

mod bitset;
mod column;
mod event;
mod reader;
mod rows;
mod table_map;
mod value;

pub use bitset::Bitset;
pub use column::ColumnMetadata;
pub use event::{Event, EventData, EventHeader, EventType, FormatDescriptionEvent};
pub use reader::BinlogFile;
pub use rows::{Row, RowImage, RowsEvent};
pub use table_map::TableMapEvent;
pub use value::BinlogValue;
