//! Copy-on-write byte buffer with an observable sharing count.
//!
//! # Sharing model
//! A [`CowBuffer`] is one handle onto a reference-counted byte allocation.
//! Cloning a handle is O(1): no bytes move, the shared count goes up by one,
//! and every handle in the group observes the new count.  The backing cell is
//! an `Rc<Vec<u8>>`, so the count IS the number of live handles — it can never
//! drift and never reaches 0 while a handle exists.
//!
//! Mutation follows the copy-on-write rule:
//!   - count == 1 → the handle owns the storage exclusively and writes in
//!     place, storage identity unchanged.
//!   - count > 1  → the mutating handle detaches: it takes a private copy,
//!     applies the write there, and leaves the old group (old count −1).
//!     Siblings keep the original bytes at the original address.
//!
//! # Single-threaded by construction
//! The cell is `Rc`, not `Arc`: handles are `!Send`/`!Sync`.  The design
//! targets single-threaded ownership transfer, not concurrent sharing.
//!
//! # Sharp edge: stale observation
//! There is no generation or validity tagging.  After a sibling detaches, a
//! handle simply keeps observing the old allocation — that is defined
//! behavior, not an error this module detects.

use std::rc::Rc;
use thiserror::Error;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// `update` was called with an index outside `[0, len)`.
    /// The buffer (bytes and shared count) is left untouched.
    #[error("index {index} out of bounds for buffer of length {len}")]
    IndexOutOfBounds { index: isize, len: usize },
}

// ── CowBuffer ────────────────────────────────────────────────────────────────

/// One handle onto a shared, copy-on-write byte allocation.
#[derive(Debug)]
pub struct CowBuffer {
    data: Rc<Vec<u8>>,
}

impl CowBuffer {
    /// Construct a buffer from `bytes`, taking ownership without copying.
    /// The new allocation starts with a shared count of 1.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { data: Rc::new(bytes) }
    }

    /// Number of bytes in the buffer.  Fixed for the lifetime of an
    /// allocation: there is no resizing or growth.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of live handles currently aliasing this handle's storage.
    /// Every handle in one sharing group reports the same value.
    #[inline]
    pub fn share_count(&self) -> usize {
        Rc::strong_count(&self.data)
    }

    /// True when this handle owns its storage exclusively (count == 1),
    /// i.e. `update` will mutate in place without copying.
    #[inline]
    pub fn is_exclusive(&self) -> bool {
        Rc::strong_count(&self.data) == 1
    }

    /// Address of the backing allocation.  Two handles return the same value
    /// iff they alias the same storage; a detach changes it.  Diagnostic
    /// identity only — never dereferenced.
    #[inline]
    pub fn storage_id(&self) -> usize {
        Rc::as_ptr(&self.data) as *const u8 as usize
    }

    /// Borrowed, zero-copy view of the current bytes.  Valid for as long as
    /// the borrow of this handle; no allocation occurs.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Owned, independent copy of the current bytes, for callers that need
    /// the data beyond the borrow of [`as_bytes`](Self::as_bytes).
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.as_ref().clone()
    }

    /// Set the byte at `index` to `value`.
    ///
    /// Exclusive handle (count == 1): writes in place, storage identity
    /// unchanged.  Shared handle (count > 1): detaches first — allocates a
    /// private copy with the write applied, leaves the old sharing group
    /// (its count drops by 1), and rebinds to a fresh count of 1.  Siblings
    /// are unaffected either way and keep the pre-mutation bytes.
    ///
    /// The only failure is an out-of-range `index` (negative or `>= len`),
    /// which leaves bytes and count exactly as they were.
    pub fn update(&mut self, index: isize, value: u8) -> Result<(), BufferError> {
        let len = self.data.len();
        if index < 0 || index as usize >= len {
            return Err(BufferError::IndexOutOfBounds { index, len });
        }
        let index = index as usize;
        match Rc::get_mut(&mut self.data) {
            // Sole owner: in-place write, no allocation.
            Some(bytes) => bytes[index] = value,
            // Shared: detach into a private copy.  Rebinding drops our claim
            // on the old allocation, decrementing its count by exactly 1.
            None => {
                let mut copy = self.data.as_ref().clone();
                copy[index] = value;
                self.data = Rc::new(copy);
            }
        }
        Ok(())
    }

    /// Leave the current sharing group.
    ///
    /// Decrements the old allocation's count by 1 and rebinds this handle to
    /// a fresh private copy of the current bytes with a count of 1.  If this
    /// handle was the last member, the old allocation is released.
    ///
    /// Note the semantics carefully: `close` detaches, it does not free.
    /// The handle remains fully usable afterwards, holding the same bytes at
    /// a new storage identity.  Callers expecting a conventional dispose that
    /// invalidates the handle will be surprised; the behavior is kept for
    /// compatibility with the system this buffer reproduces.
    pub fn close(&mut self) {
        let copy = self.data.as_ref().clone();
        self.data = Rc::new(copy);
    }
}

/// Cloning aliases the same storage and counter — no bytes are copied, and
/// the shared count observed by every existing handle increases by 1.
impl Clone for CowBuffer {
    fn clone(&self) -> Self {
        Self { data: Rc::clone(&self.data) }
    }
}

impl AsRef<[u8]> for CowBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for CowBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for CowBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl PartialEq for CowBuffer {
    /// Content equality.  Two handles in one sharing group always compare
    /// equal; two detached handles compare equal until their bytes diverge.
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for CowBuffer {}
