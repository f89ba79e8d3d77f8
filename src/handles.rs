//! Handle table: stream-local object indices
//!
//! Index 0 is reserved for the metafile itself, so slot `n` is written as
//! `n + 1`. Released slots are reused but never renumbered.

use crate::error::{RecorderError, RecorderResult};
use crate::types::ObjectRef;
use log::debug;

/// Slots added each time the table runs out of room
pub const HANDLE_LIST_INC: usize = 20;

pub struct HandleTable {
    slots: Vec<Option<ObjectRef>>,
    /// Live handles, the reserved one included
    live: u32,
    /// Largest `live` ever seen; this is the header's handle count
    high_water: u32,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            slots: vec![None; HANDLE_LIST_INC],
            live: 1,
            high_water: 1,
        }
    }

    /// Index of the slot holding `object`, scanning from the lowest slot
    pub fn find(&self, object: ObjectRef) -> Option<u32> {
        self.slots
            .iter()
            .position(|slot| *slot == Some(object))
            .map(|pos| pos as u32 + 1)
    }

    /// Index the next [`occupy`](Self::occupy) call will use.
    ///
    /// Grows the table if every slot is taken, but records nothing, so a
    /// caller can write the record that names the index before committing.
    pub fn reserve(&mut self) -> RecorderResult<u32> {
        if self.live >= u16::MAX as u32 {
            return Err(RecorderError::HandleTableFull);
        }
        let pos = match self.slots.iter().position(Option::is_none) {
            Some(pos) => pos,
            None => {
                let pos = self.slots.len();
                self.slots
                    .try_reserve_exact(HANDLE_LIST_INC)
                    .map_err(|_| RecorderError::Allocation("handle table"))?;
                self.slots.resize(pos + HANDLE_LIST_INC, None);
                pos
            }
        };
        Ok(pos as u32 + 1)
    }

    /// Store `object` at an index returned by [`reserve`](Self::reserve)
    pub fn occupy(&mut self, index: u32, object: ObjectRef) {
        let pos = index as usize - 1;
        debug_assert!(self.slots[pos].is_none());
        self.slots[pos] = Some(object);
        self.live += 1;
        self.high_water = self.high_water.max(self.live);
        debug!("handle {} -> {:?}", index, object);
    }

    /// Store `object` in the first free slot and return its index
    pub fn allocate(&mut self, object: ObjectRef) -> RecorderResult<u32> {
        let index = self.reserve()?;
        self.occupy(index, object);
        Ok(index)
    }

    /// Free the slot behind `index`; other indices keep their values
    pub fn release(&mut self, index: u32) -> Option<ObjectRef> {
        let slot = self.slots.get_mut(index.checked_sub(1)? as usize)?;
        let object = slot.take()?;
        self.live -= 1;
        debug!("handle {} released ({:?})", index, object);
        Some(object)
    }

    pub fn live_count(&self) -> u32 {
        self.live
    }

    pub fn high_water(&self) -> u32 {
        self.high_water
    }

    /// Objects still holding a slot, in index order
    pub fn live_objects(&self) -> impl Iterator<Item = (u32, ObjectRef)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.map(|obj| (pos as u32 + 1, obj)))
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_one_based() {
        let mut table = HandleTable::new();
        assert_eq!(table.allocate(ObjectRef(10)).unwrap(), 1);
        assert_eq!(table.allocate(ObjectRef(11)).unwrap(), 2);
        assert_eq!(table.find(ObjectRef(11)), Some(2));
        assert_eq!(table.find(ObjectRef(12)), None);
        assert_eq!(table.live_count(), 3);
        assert_eq!(table.high_water(), 3);
    }

    #[test]
    fn test_release_reuses_lowest_slot_without_renumbering() {
        let mut table = HandleTable::new();
        let a = table.allocate(ObjectRef(1)).unwrap();
        let b = table.allocate(ObjectRef(2)).unwrap();
        let c = table.allocate(ObjectRef(3)).unwrap();
        assert_eq!(table.release(b), Some(ObjectRef(2)));
        assert_eq!(table.find(ObjectRef(1)), Some(a));
        assert_eq!(table.find(ObjectRef(3)), Some(c));

        let d = table.allocate(ObjectRef(4)).unwrap();
        assert_eq!(d, b);
        assert_ne!(d, a);
        assert_ne!(d, c);
        assert_eq!(table.high_water(), 4);
        assert_eq!(table.live_count(), 4);
    }

    #[test]
    fn test_release_unknown_index() {
        let mut table = HandleTable::new();
        assert_eq!(table.release(0), None);
        assert_eq!(table.release(5), None);
        assert_eq!(table.release(500), None);
        assert_eq!(table.live_count(), 1);
    }

    #[test]
    fn test_table_grows_in_steps() {
        let mut table = HandleTable::new();
        for i in 0..(HANDLE_LIST_INC as u64 * 2 + 1) {
            assert_eq!(table.allocate(ObjectRef(i)).unwrap(), i as u32 + 1);
        }
        assert_eq!(table.slots.len(), HANDLE_LIST_INC * 3);
        assert_eq!(table.live_objects().count(), HANDLE_LIST_INC * 2 + 1);
    }

    #[test]
    fn test_reserve_does_not_count() {
        let mut table = HandleTable::new();
        let index = table.reserve().unwrap();
        assert_eq!(table.reserve().unwrap(), index);
        assert_eq!(table.live_count(), 1);
        assert_eq!(table.high_water(), 1);
        table.occupy(index, ObjectRef(9));
        assert_eq!(table.find(ObjectRef(9)), Some(index));
        assert_eq!(table.high_water(), 2);
    }

    #[test]
    fn test_high_water_survives_release() {
        let mut table = HandleTable::new();
        let a = table.allocate(ObjectRef(1)).unwrap();
        let b = table.allocate(ObjectRef(2)).unwrap();
        table.release(a);
        table.release(b);
        assert_eq!(table.live_count(), 1);
        assert_eq!(table.high_water(), 3);
    }
}
