//! Folio Cache Library
//!
//! Bounded pool of reusable page views for the paged document viewer.

pub mod pool;

pub use pool::{PageSlot, PageSlotPool, PoolCapacity, PoolStats, SlotId};
