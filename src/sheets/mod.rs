pub mod google;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// A (spreadsheet, tab) pair identifying where rows are written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub spreadsheet_id: String,
    pub tab: String,
}

impl Destination {
    pub fn new(spreadsheet_id: &str, tab: &str) -> Self {
        Destination {
            spreadsheet_id: spreadsheet_id.to_string(),
            tab: tab.to_string(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spreadsheet_id, self.tab)
    }
}

/// The sheet-store capability. Append-only from the core's
/// perspective: existing data rows are never rewritten or deleted,
/// only read for dedup seeding and cosmetically formatted at the end.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// All rows currently at the destination, in order. An absent tab
    /// is not an error; it reads as no rows, same as an empty tab.
    async fn read_rows(&self, destination: &Destination) -> Result<Vec<Vec<String>>>;

    async fn append_rows(&self, destination: &Destination, rows: Vec<Vec<String>>) -> Result<()>;

    /// Apply table formatting over the first `row_count` rows.
    /// Idempotent: repeating the call with the same extent must not
    /// stack additional formatting rules.
    async fn format_range(&self, destination: &Destination, row_count: usize) -> Result<()>;
}
