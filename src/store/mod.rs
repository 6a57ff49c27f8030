mod memory;
pub mod range;
mod sheets;

pub use memory::MemoryStore;
pub use sheets::{SheetsConfig, SheetsStore, DEFAULT_ENDPOINT};

use async_trait::async_trait;

/// Sheet holding one reservation per row, header in row 1.
pub const RESERVATIONS_SHEET: &str = "Reservations";
pub const RESERVATIONS_RANGE: &str = "A2:G";
pub const ROOMS_SHEET: &str = "Rooms";
pub const ROOMS_RANGE: &str = "A2:B";
pub const SLOTS_SHEET: &str = "Slots";
pub const SLOTS_RANGE: &str = "A2:B";
/// Cell holding the highest reservation id ever issued.
pub const META_SHEET: &str = "Meta";
pub const ID_COUNTER_CELL: &str = "A1";

/// First data row of every sheet (row 1 is the header).
pub const FIRST_DATA_ROW: usize = 2;

/// A positional row of cell values.
pub type Row = Vec<String>;

/// Remote tabular store. Rows and columns are 1-based, as in the sheet UI.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Rows of `range` in `sheet`, top to bottom. A sheet or range with no
    /// values yields an empty vector.
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Vec<Row>, StoreError>;

    /// Append `row` after the last non-empty row of the table at `range`.
    async fn append_row(&self, sheet: &str, range: &str, row: Row) -> Result<(), StoreError>;

    async fn update_cell(
        &self,
        sheet: &str,
        row: usize,
        col: usize,
        value: String,
    ) -> Result<(), StoreError>;

    /// Remove `row`, shifting every later row up by one.
    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError>;
}

/// Which store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Append,
    UpdateCell,
    DeleteRow,
}

impl StoreOp {
    pub fn label(self) -> &'static str {
        match self {
            StoreOp::Read => "read",
            StoreOp::Append => "append",
            StoreOp::UpdateCell => "update_cell",
            StoreOp::DeleteRow => "delete_row",
        }
    }

    /// Whether the failed call may have changed the store.
    pub fn is_write(self) -> bool {
        !matches!(self, StoreOp::Read)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub op: StoreOp,
    pub message: String,
}

impl StoreError {
    pub fn new(op: StoreOp, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store {} failed: {}", self.op.label(), self.message)
    }
}

impl std::error::Error for StoreError {}
