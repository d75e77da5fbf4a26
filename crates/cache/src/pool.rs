//! Page slot pool with bounded capacity
//!
//! Provides a small arena of reusable page views. Slots are handed out per
//! page index and bound to at most one page at a time. When the pool is full,
//! the slot whose spread is furthest from the requested spread is reassigned,
//! which keeps memory bounded by the viewport rather than by document length.

use std::collections::{HashMap, HashSet};

/// Index of a slot inside the pool arena
pub type SlotId = usize;

/// A reusable rendering resource
///
/// The payload `V` is created once by the pool factory and survives every
/// reassignment to a new page.
#[derive(Debug)]
pub struct PageSlot<V> {
    id: SlotId,
    page: Option<u32>,
    spread: usize,
    view: V,
}

impl<V> PageSlot<V> {
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Page currently displayed by this slot, `None` when free
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Spread index the page was activated for
    pub fn spread(&self) -> usize {
        self.spread
    }

    pub fn is_free(&self) -> bool {
        self.page.is_none()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

/// Capacity policy for the pool
///
/// The cap is sized to the content that can be on screen at once plus a
/// lookahead buffer on each side of the scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCapacity {
    /// Maximum number of spreads that can intersect the viewport
    pub visible_spreads: usize,

    /// Pages per spread (1 in single mode, 2 in double mode)
    pub pages_per_spread: usize,

    /// Lookahead slots on each side
    pub buffer_slots: usize,
}

impl PoolCapacity {
    /// Capacity with one lookahead slot in each scroll direction
    pub fn for_layout(visible_spreads: usize, pages_per_spread: usize) -> Self {
        Self { visible_spreads, pages_per_spread, buffer_slots: 1 }
    }

    /// Total number of live slots allowed
    pub fn slots(&self) -> usize {
        (self.visible_spreads.max(1) * self.pages_per_spread.max(1) + 2 * self.buffer_slots).max(1)
    }
}

impl Default for PoolCapacity {
    fn default() -> Self {
        Self::for_layout(1, 1)
    }
}

/// Statistics about pool usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slots currently allocated (bound or free)
    pub live_slots: usize,

    /// Slots currently bound to a page
    pub bound_slots: usize,

    /// Configured cap
    pub capacity: usize,

    /// Activations served by a slot already bound to the page
    pub hits: u64,

    /// Activations that bound a page to a slot
    pub binds: u64,

    /// Slots returned to the free list
    pub recycles: u64,

    /// Bound slots reassigned because the pool was full
    pub evictions: u64,

    /// Slots allocated past the cap because every bound slot was pinned
    pub overflows: u64,

    /// Highest number of live slots observed
    pub peak_live_slots: usize,
}

impl PoolStats {
    /// Fraction of activations that found the page already bound (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.binds;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Arena of reusable page slots keyed by page index
///
/// # Example
///
/// ```
/// use folio_cache::{PageSlotPool, PoolCapacity};
///
/// let mut pool = PageSlotPool::new(PoolCapacity::for_layout(1, 1), |id| format!("view-{id}"));
///
/// let first = pool.activate(0, 0).id();
/// assert_eq!(pool.activate(0, 0).id(), first);
///
/// pool.recycle(0);
/// assert!(pool.slot_for(0).is_none());
/// ```
pub struct PageSlotPool<V> {
    slots: Vec<Option<PageSlot<V>>>,
    by_page: HashMap<u32, SlotId>,
    free: Vec<SlotId>,
    pinned: HashSet<u32>,
    capacity: PoolCapacity,
    factory: Box<dyn FnMut(SlotId) -> V>,
    stats: PoolStats,
}

impl<V> PageSlotPool<V> {
    /// Create an empty pool. Slots are allocated lazily by `factory`.
    pub fn new(capacity: PoolCapacity, factory: impl FnMut(SlotId) -> V + 'static) -> Self {
        Self {
            slots: Vec::new(),
            by_page: HashMap::new(),
            free: Vec::new(),
            pinned: HashSet::new(),
            capacity,
            factory: Box::new(factory),
            stats: PoolStats { capacity: capacity.slots(), ..Default::default() },
        }
    }

    /// Bind `page` to a slot and return it
    ///
    /// Returns the slot already bound to `page` without side effects when there
    /// is one. Otherwise reuses a free slot, grows the pool up to its cap, or
    /// evicts the unpinned slot furthest from `spread`.
    ///
    /// # Arguments
    ///
    /// * `page` - Logical page index to display
    /// * `spread` - Spread index owning `page`, used for eviction distance
    pub fn activate(&mut self, page: u32, spread: usize) -> &mut PageSlot<V> {
        if let Some(&id) = self.by_page.get(&page) {
            self.stats.hits += 1;
            return self.slot_mut(id);
        }

        let id = match self.free.pop() {
            Some(id) => id,
            None if self.live_slots() < self.capacity.slots() => self.allocate(),
            None => match self.eviction_candidate(spread) {
                Some(id) => {
                    if let Some(evicted) = self.unbind(id) {
                        tracing::trace!(evicted, page, "evicting page slot");
                    }
                    self.stats.evictions += 1;
                    id
                }
                None => {
                    tracing::debug!(page, live = self.live_slots(), "all slots pinned, overflowing");
                    self.stats.overflows += 1;
                    self.allocate()
                }
            },
        };

        self.bind(id, page, spread);
        self.slot_mut(id)
    }

    /// Release the slot bound to `page`. No-op when `page` has no slot.
    ///
    /// Returns true when a slot was released.
    pub fn recycle(&mut self, page: u32) -> bool {
        self.pinned.remove(&page);

        let Some(id) = self.unbind_page(page) else {
            return false;
        };

        self.free.push(id);
        self.stats.recycles += 1;
        tracing::trace!(page, slot = id, "recycled page slot");
        true
    }

    /// Slot currently bound to `page`
    pub fn slot_for(&self, page: u32) -> Option<&PageSlot<V>> {
        let id = *self.by_page.get(&page)?;
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// Mutable access to the slot bound to `page`
    pub fn slot_for_mut(&mut self, page: u32) -> Option<&mut PageSlot<V>> {
        let id = *self.by_page.get(&page)?;
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    /// Protect the slot bound to `page` from eviction
    pub fn pin(&mut self, page: u32) {
        if self.by_page.contains_key(&page) {
            self.pinned.insert(page);
        }
    }

    pub fn unpin_all(&mut self) {
        self.pinned.clear();
    }

    pub fn is_pinned(&self, page: u32) -> bool {
        self.pinned.contains(&page)
    }

    /// Pages with a bound slot, in ascending order
    pub fn bound_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.by_page.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Number of allocated slots, bound or free
    pub fn live_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn capacity(&self) -> PoolCapacity {
        self.capacity
    }

    /// Change the cap and release surplus free slots
    ///
    /// Bound slots are never dropped here; the caller recycles pages that are
    /// no longer visible and the next `trim` shrinks the pool.
    pub fn set_capacity(&mut self, capacity: PoolCapacity) {
        self.capacity = capacity;
        self.stats.capacity = capacity.slots();
        self.trim();
    }

    /// Destroy free slots while the pool is above its cap
    pub fn trim(&mut self) {
        while self.live_slots() > self.capacity.slots() {
            let Some(id) = self.free.pop() else {
                break;
            };
            if let Some(slot) = self.slots.get_mut(id) {
                *slot = None;
            }
        }
        self.refresh_stats();
    }

    /// Destroy every slot (document swap or teardown)
    pub fn reset(&mut self) {
        self.slots.clear();
        self.by_page.clear();
        self.free.clear();
        self.pinned.clear();
        self.refresh_stats();
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    fn allocate(&mut self) -> SlotId {
        let id = self.slots.iter().position(Option::is_none).unwrap_or(self.slots.len());
        let view = (self.factory)(id);
        let slot = PageSlot { id, page: None, spread: 0, view };

        if id == self.slots.len() {
            self.slots.push(Some(slot));
        } else {
            self.slots[id] = Some(slot);
        }

        let live = self.live_slots();
        self.stats.live_slots = live;
        self.stats.peak_live_slots = self.stats.peak_live_slots.max(live);
        id
    }

    fn bind(&mut self, id: SlotId, page: u32, spread: usize) {
        if let Some(slot) = self.slots.get_mut(id).and_then(Option::as_mut) {
            slot.page = Some(page);
            slot.spread = spread;
        }
        self.by_page.insert(page, id);
        self.stats.binds += 1;
        self.refresh_stats();
    }

    fn unbind(&mut self, id: SlotId) -> Option<u32> {
        let slot = self.slots.get_mut(id).and_then(Option::as_mut)?;
        let page = slot.page.take()?;
        self.by_page.remove(&page);
        self.pinned.remove(&page);
        Some(page)
    }

    fn unbind_page(&mut self, page: u32) -> Option<SlotId> {
        let id = self.by_page.remove(&page)?;
        if let Some(slot) = self.slots.get_mut(id).and_then(Option::as_mut) {
            slot.page = None;
        }
        self.refresh_stats();
        Some(id)
    }

    fn eviction_candidate(&self, spread: usize) -> Option<SlotId> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|slot| slot.page.map(|page| (slot, page)))
            .filter(|(_, page)| !self.pinned.contains(page))
            .max_by_key(|(slot, page)| (slot.spread.abs_diff(spread), *page))
            .map(|(slot, _)| slot.id)
    }

    fn slot_mut(&mut self, id: SlotId) -> &mut PageSlot<V> {
        match self.slots[id] {
            Some(ref mut slot) => slot,
            None => unreachable!("slot {id} is bound but not allocated"),
        }
    }

    fn refresh_stats(&mut self) {
        self.stats.live_slots = self.live_slots();
        self.stats.bound_slots = self.by_page.len();
    }
}

impl<V> std::fmt::Debug for PageSlotPool<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSlotPool")
            .field("capacity", &self.capacity)
            .field("bound_pages", &self.bound_pages())
            .field("stats", &self.stats)
            .finish()
    }
}
