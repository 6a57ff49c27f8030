use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::{RESERVATION_HEADER, Room, Slot};

use super::range::A1Range;
use super::{
    ReservationStore, Row, StoreError, StoreOp, RESERVATIONS_SHEET, ROOMS_SHEET, SLOTS_SHEET,
};

/// In-process stand-in for the spreadsheet. Each sheet is a grid of
/// strings; index 0 is sheet row 1.
pub struct MemoryStore {
    sheets: DashMap<String, Vec<Row>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sheets: DashMap::new(),
        }
    }

    /// A store laid out like a fresh deployment: header rows plus the
    /// given catalog.
    pub fn seeded(rooms: &[Room], slots: &[Slot]) -> Self {
        let store = Self::new();
        store.set_sheet(
            RESERVATIONS_SHEET,
            vec![RESERVATION_HEADER.iter().map(|s| s.to_string()).collect()],
        );

        let mut room_rows = vec![vec!["id".to_string(), "name".to_string()]];
        room_rows.extend(rooms.iter().map(|r| vec![r.id.clone(), r.name.clone()]));
        store.set_sheet(ROOMS_SHEET, room_rows);

        let mut slot_rows = vec![vec!["start".to_string(), "end".to_string()]];
        slot_rows.extend(slots.iter().map(|s| vec![s.start.to_string(), s.end.to_string()]));
        store.set_sheet(SLOTS_SHEET, slot_rows);
        store
    }

    // ── Direct access (setup and assertions) ─────────────────

    pub fn set_sheet(&self, sheet: &str, rows: Vec<Row>) {
        self.sheets.insert(sheet.to_string(), rows);
    }

    /// Every row of `sheet`, header included.
    pub fn rows(&self, sheet: &str) -> Vec<Row> {
        self.sheets
            .get(sheet)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self, sheet: &str) -> usize {
        self.sheets.get(sheet).map_or(0, |e| e.len())
    }
}

fn trim_trailing_empty(mut cells: Row) -> Row {
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Vec<Row>, StoreError> {
        let a1 = A1Range::parse(range)
            .ok_or_else(|| StoreError::new(StoreOp::Read, format!("invalid range {range:?}")))?;
        let Some(grid) = self.sheets.get(sheet) else {
            return Ok(Vec::new());
        };

        let first = a1.first_row - 1;
        let last = a1.last_row.map_or(grid.len(), |r| r.min(grid.len()));
        let mut rows: Vec<Row> = grid
            .iter()
            .take(last)
            .skip(first)
            .map(|row| {
                let from = (a1.first_col - 1).min(row.len());
                let to = a1.last_col.map_or(row.len(), |c| c.min(row.len()));
                trim_trailing_empty(row[from..to.max(from)].to_vec())
            })
            .collect();
        // Trailing blank rows are omitted, interior ones are kept so that
        // positions still map to sheet rows.
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn append_row(&self, sheet: &str, range: &str, row: Row) -> Result<(), StoreError> {
        let a1 = A1Range::parse(range)
            .ok_or_else(|| StoreError::new(StoreOp::Append, format!("invalid range {range:?}")))?;
        let mut grid = self.sheets.entry(sheet.to_string()).or_default();
        while grid.last().is_some_and(|r| r.iter().all(|c| c.is_empty())) {
            grid.pop();
        }
        while grid.len() < a1.first_row - 1 {
            grid.push(Vec::new());
        }
        let mut cells = vec![String::new(); a1.first_col - 1];
        cells.extend(row);
        grid.push(cells);
        Ok(())
    }

    async fn update_cell(
        &self,
        sheet: &str,
        row: usize,
        col: usize,
        value: String,
    ) -> Result<(), StoreError> {
        if row == 0 || col == 0 {
            return Err(StoreError::new(
                StoreOp::UpdateCell,
                format!("cell ({row}, {col}) out of range"),
            ));
        }
        let mut grid = self.sheets.entry(sheet.to_string()).or_default();
        if grid.len() < row {
            grid.resize(row, Vec::new());
        }
        let cells = &mut grid[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value;
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError> {
        let mut grid = self
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| StoreError::new(StoreOp::DeleteRow, format!("no sheet {sheet:?}")))?;
        if row == 0 || row > grid.len() {
            return Err(StoreError::new(
                StoreOp::DeleteRow,
                format!("row {row} out of range"),
            ));
        }
        grid.remove(row - 1);
        Ok(())
    }
}
