//! The tickable capability.

use crate::error::TickError;
use std::time::Duration;

/// Anything that advances its internal state by a virtual time delta.
///
/// Implemented by the controller, the electrical meter, tickable devices and
/// arbitrary observers. Methods take `&self` because entities are shared
/// between the tick loop and command callers; implementations keep their
/// mutable state behind their own locks.
pub trait Tickable: Send + Sync {
    /// Advances the entity by `delta` of virtual time.
    fn update_tick(&self, delta: Duration) -> Result<(), TickError>;
}
