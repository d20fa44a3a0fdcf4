//! Round-robin particle emission.
//!
//! A [`ParticleRing`] is a fixed pool where every emission overwrites the
//! oldest slot. Nothing is ever freed: once the ring is full the cursor
//! simply comes back around, so the cost per emission is constant and the
//! GPU copy only needs the slots written since the last upload.
//!
//! # Example
//!
//! ```ignore
//! let mut ring = ParticleRing::new(2);
//! ring.emit(Vec3::X);  // slot 0
//! ring.emit(Vec3::Y);  // slot 1
//! ring.emit(Vec3::Z);  // slot 0 again
//! assert_eq!(ring.slots(), &[Vec3::Z, Vec3::Y]);
//!
//! for span in ring.drain_dirty() {
//!     queue.write_buffer(&buffer, ParticleRing::byte_offset(span.start), ring.bytes(span));
//! }
//! ```

use std::ops::Range;

use glam::Vec3;

use crate::spawn::SpawnContext;

const SLOT_BYTES: usize = std::mem::size_of::<Vec3>();

/// Fixed-capacity pool recycled in strict round-robin order.
#[derive(Debug, Clone)]
pub struct ParticleRing {
    slots: Box<[Vec3]>,
    cursor: usize,
    /// Emissions since the last `drain_dirty`.
    pending: usize,
}

impl ParticleRing {
    /// Ring of `capacity` slots initialised to the origin. A capacity of
    /// zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::filled(capacity, Vec3::ZERO)
    }

    /// Ring with every slot set to `fill`.
    pub fn filled(capacity: usize, fill: Vec3) -> Self {
        Self {
            slots: vec![fill; capacity.max(1)].into_boxed_slice(),
            cursor: 0,
            pending: 0,
        }
    }

    /// Overwrite the slot under the cursor, advance the cursor, and return
    /// the slot that was written.
    pub fn emit(&mut self, position: Vec3) -> usize {
        let slot = self.cursor;
        self.slots[slot] = position;
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.pending = self.pending.saturating_add(1);
        slot
    }

    /// Emit from separate coordinates.
    #[inline]
    pub fn emit_xyz(&mut self, x: f32, y: f32, z: f32) -> usize {
        self.emit(Vec3::new(x, y, z))
    }

    /// Emit `count` particles scattered uniformly in a cube of half-size
    /// `spread` around `center`.
    pub fn emit_burst(&mut self, center: Vec3, count: usize, spread: f32, ctx: &mut SpawnContext) {
        for _ in 0..count {
            let jitter = ctx.random_in_cube(-spread, spread);
            self.emit(center + jitter);
        }
    }

    /// Slot the next emission will overwrite.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn slots(&self) -> &[Vec3] {
        &self.slots
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<Vec3> {
        self.slots.get(slot).copied()
    }

    /// Whole pool as bytes, for the initial upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }

    /// Bytes of the given slot range.
    #[inline]
    pub fn bytes(&self, slots: Range<usize>) -> &[u8] {
        bytemuck::cast_slice(&self.slots[slots])
    }

    /// Byte offset of `slot` within the uploaded buffer.
    #[inline]
    pub fn byte_offset(slot: usize) -> u64 {
        (slot * SLOT_BYTES) as u64
    }

    /// Slot ranges written since the previous call, oldest first. At most
    /// two spans are returned (the write window may straddle the end of the
    /// ring); a full lap or more collapses into a single span.
    pub fn drain_dirty(&mut self) -> impl Iterator<Item = Range<usize>> {
        let cap = self.slots.len();
        let n = self.pending.min(cap);
        self.pending = 0;

        let (first, second) = if n == 0 {
            (None, None)
        } else if n == cap {
            (Some(0..cap), None)
        } else {
            let start = (self.cursor + cap - n) % cap;
            if start + n <= cap {
                (Some(start..start + n), None)
            } else {
                (Some(start..cap), Some(0..start + n - cap))
            }
        };
        first.into_iter().chain(second)
    }
}
