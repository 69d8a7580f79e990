//! Lead records and the sinks they are appended to.

pub mod migrations;
pub mod model;
pub mod sheets;
pub mod sink;
pub mod store;
pub mod writer;

pub use model::{LEAD_ROW_WIDTH, LeadRecord, column};
pub use sheets::{SheetsConfig, SheetsLeadSink};
pub use sink::{LeadSink, MemoryLeadSink};
pub use store::LibSqlLeadStore;
pub use writer::LeadWriter;
