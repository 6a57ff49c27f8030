use tracing::{info, warn};

use crate::model::{Room, Slot};
use crate::store::{ReservationStore, Row, StoreError, ROOMS_RANGE, ROOMS_SHEET, SLOTS_RANGE, SLOTS_SHEET};

/// Rooms and bookable slots for one deployment. Fixed for the lifetime
/// of the process; a restart is the refresh mechanism.
#[derive(Debug, Clone, Default)]
pub struct SlotCatalog {
    rooms: Vec<Room>,
    slots: Vec<Slot>,
}

impl SlotCatalog {
    pub fn new(rooms: Vec<Room>, slots: Vec<Slot>) -> Self {
        let catalog = Self { rooms, slots };
        catalog.report();
        catalog
    }

    /// Read the `Rooms` and `Slots` sheets.
    pub async fn load(store: &dyn ReservationStore) -> Result<Self, StoreError> {
        let (room_rows, slot_rows) = futures::try_join!(
            store.read_range(ROOMS_SHEET, ROOMS_RANGE),
            store.read_range(SLOTS_SHEET, SLOTS_RANGE),
        )?;
        Ok(Self::from_rows(&room_rows, &slot_rows))
    }

    /// Rooms are `[id, name]` or `[name]`; slots are `[start, end]`.
    /// Blank rows and slots with invalid times are skipped.
    pub fn from_rows(room_rows: &[Row], slot_rows: &[Row]) -> Self {
        let rooms = room_rows
            .iter()
            .filter_map(|row| {
                let id = row.first().map(|s| s.trim()).unwrap_or_default();
                if id.is_empty() {
                    return None;
                }
                Some(match row.get(1).map(|s| s.trim()).filter(|s| !s.is_empty()) {
                    Some(name) => Room {
                        id: id.to_string(),
                        name: name.to_string(),
                    },
                    None => Room::named(id),
                })
            })
            .collect();

        let slots = slot_rows
            .iter()
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .filter_map(|row| {
                let start = row.first().map(|s| s.trim()).unwrap_or_default();
                let end = row.get(1).map(|s| s.trim()).unwrap_or_default();
                let slot = Slot::parse(start, end);
                if slot.is_none() {
                    warn!("skipping catalog slot with invalid times {start:?}-{end:?}");
                }
                slot
            })
            .collect();

        Self::new(rooms, slots)
    }

    fn report(&self) {
        if self.rooms.is_empty() {
            warn!("room catalog is empty; bookings will be rejected");
        }
        if self.slots.is_empty() {
            warn!("slot catalog is empty; bookings will be rejected");
        }
        info!(
            "catalog: {} rooms, {} slots",
            self.rooms.len(),
            self.slots.len()
        );
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn find_room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }
}
