//! Body handles
//!
//! Handles index the world's body arena. The generation makes a handle to a
//! removed body stay dead even after its slot is reused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generational index of a body in a [`World`](super::World)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation this handle was issued for
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({}, gen: {})", self.index, self.generation)
    }
}
