//! Utility helpers: math extensions, the generational arena and logging timers.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, ArenaId};
pub use math::*;
