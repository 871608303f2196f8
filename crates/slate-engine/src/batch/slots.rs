use crate::gfx::TEX_SLOT_CAPACITY;

use super::BatchError;

/// Frame-scoped texture slot cursor.
///
/// Slots are handed out in order and only reclaimed by [`reset`](Self::reset).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextureSlots {
    next: u32,
}

impl TextureSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Returns the next free slot and advances the cursor.
    pub fn allocate(&mut self) -> Result<u32, BatchError> {
        if self.next as usize >= TEX_SLOT_CAPACITY {
            return Err(BatchError::TextureSlotsExhausted {
                capacity: TEX_SLOT_CAPACITY,
            });
        }
        let slot = self.next;
        self.next += 1;
        Ok(slot)
    }

    /// Slots handed out since the last reset.
    #[inline]
    pub fn in_use(&self) -> u32 {
        self.next
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        TEX_SLOT_CAPACITY
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        TEX_SLOT_CAPACITY - self.next as usize
    }

    /// Texture unit per slot: `i` for allocated slots, `-1` for the rest.
    pub fn sampler_units(&self) -> Vec<i32> {
        (0..TEX_SLOT_CAPACITY as i32)
            .map(|i| if i < self.next as i32 { i } else { -1 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_in_order_until_exhausted() {
        let mut slots = TextureSlots::new();
        for expected in 0..TEX_SLOT_CAPACITY as u32 {
            assert_eq!(slots.allocate(), Ok(expected));
        }
        assert_eq!(
            slots.allocate(),
            Err(BatchError::TextureSlotsExhausted { capacity: TEX_SLOT_CAPACITY })
        );
        assert_eq!(slots.in_use(), TEX_SLOT_CAPACITY as u32);
        assert_eq!(slots.remaining(), 0);
    }

    #[test]
    fn reset_reclaims_everything() {
        let mut slots = TextureSlots::new();
        slots.allocate().unwrap();
        slots.allocate().unwrap();
        slots.reset();
        assert_eq!(slots.in_use(), 0);
        assert_eq!(slots.allocate(), Ok(0));
    }

    #[test]
    fn sampler_units_cover_allocated_prefix() {
        let mut slots = TextureSlots::new();
        slots.allocate().unwrap();
        slots.allocate().unwrap();
        let units = slots.sampler_units();
        assert_eq!(units.len(), TEX_SLOT_CAPACITY);
        assert_eq!(&units[..3], &[0, 1, -1]);
        assert!(units[2..].iter().all(|&u| u == -1));
    }
}
