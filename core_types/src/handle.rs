//! Opaque capability handles
//!
//! A [`Handle`] is the only way user-side code can name a kernel object.
//! The value is allocated by the owning handle table and carries no
//! meaning outside it; in particular, handles from different domains
//! must never be mixed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque capability reference to a kernel object.
///
/// Handles are unforgeable in the sense that the kernel only honors
/// values it has itself issued; a guessed or stale handle fails with
/// `BadIndex` before any side effect. The raw representation is a
/// signed 64-bit integer so that the scalar syscall ABI can return a
/// handle in the same register that carries negative error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(i64);

impl Handle {
    /// Reconstructs a handle from its raw ABI representation.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw ABI representation.
    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}
