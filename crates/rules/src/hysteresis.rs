//! Consecutive-violation counter.

/// Counts consecutive ticks on which a condition held.
///
/// Any tick where the condition does not hold resets the count to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HysteresisCounter {
    count: u32,
}

impl HysteresisCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick and return the resulting count.
    ///
    /// Returns the new count (≥ 1) when `condition` holds, otherwise 0.
    pub fn observe(&mut self, condition: bool) -> u32 {
        if condition {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
