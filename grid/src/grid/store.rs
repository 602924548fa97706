/// Terminates a cell chain or the free list.
pub const NIL: u32 = u32::MAX;
/// Link value of a slot that was just handed out and is not chained yet.
pub const DETACHED: u32 = u32::MAX - 1;

#[derive(Clone, Debug)]
struct Slot<T> {
    value: Option<T>,
    link: u32,
}

/// Free-list backed array with O(1) insert and erase.
///
/// Indices returned by [`IndexStore::insert`] stay valid until that slot is
/// erased, no matter how many other slots are inserted or erased in between.
/// Slots are never compacted. Each live slot carries a `link` the owner uses
/// to chain slots together; erased slots reuse the same field to chain the
/// free list.
#[derive(Clone, Debug)]
pub struct IndexStore<T> {
    slots: Vec<Slot<T>>,
    free_head: u32,
    live: usize,
}

impl<T> IndexStore<T> {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: NIL,
            live: 0,
        }
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Stores `value`, reusing the most recently erased slot if there is one.
    /// The returned slot's link is [`DETACHED`].
    pub fn insert(&mut self, value: T) -> u32 {
        self.live += 1;
        if self.free_head != NIL {
            let index = self.free_head;
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.link;
            slot.value = Some(value);
            slot.link = DETACHED;
            return index;
        }
        let index = self.slots.len();
        debug_assert!(index < DETACHED as usize, "index store is full");
        // Vec growth doubles the backing allocation when full.
        self.slots.push(Slot {
            value: Some(value),
            link: DETACHED,
        });
        index as u32
    }

    /// Pushes `index` onto the free list and hands back its value.
    ///
    /// The caller must unlink `index` from whatever chain holds it first; the
    /// store does not know about chains. Returns `None` without touching the
    /// free list if `index` is out of bounds or already free.
    pub fn erase(&mut self, index: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        let value = slot.value.take()?;
        slot.link = self.free_head;
        self.free_head = index;
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index as usize)
            .and_then(|slot| slot.value.as_mut())
    }

    /// # Panics
    ///
    /// Panics if `index` was never handed out by this store.
    pub fn link(&self, index: u32) -> u32 {
        self.slots[index as usize].link
    }

    /// # Panics
    ///
    /// Panics if `index` was never handed out by this store.
    pub fn set_link(&mut self, index: u32, link: u32) {
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.value.is_some(), "set_link on free slot {}", index);
        slot.link = link;
    }

    /// Drops every value. All outstanding indices become invalid.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = NIL;
        self.live = 0;
    }

    /// Live slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.value.as_ref().map(|value| (index as u32, value)))
    }
}

impl<T: PartialEq> IndexStore<T> {
    /// Linear scan over live slots. Chain owners should walk their chain
    /// instead, since the first match here may belong to a different chain.
    pub fn find_index(&self, value: &T) -> Option<u32> {
        self.iter()
            .find(|(_, candidate)| *candidate == value)
            .map(|(index, _)| index)
    }
}

impl<T> Default for IndexStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
