//! Page-table entries
//!
//! An [`Entry`] is the unit of a Table slot when the Table is used as
//! an address-space page table: an access mode plus the handle of the
//! backing object. The same struct travels through the syscall ABI for
//! `MMAP`/`MPROTECT`/`TABLE_MAP` and for the table-slot operations.

use crate::{DataType, ErrorCode, Handle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access mode of a page-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Slot is empty; no backing handle.
    None,
    /// Reads allowed, writes rejected.
    ReadOnly,
    /// Reads and writes allowed.
    ReadWrite,
}

impl EntryMode {
    pub fn is_writable(self) -> bool {
        matches!(self, EntryMode::ReadWrite)
    }
}

/// A page-table slot: mode, backing datatype, backing handle.
///
/// Invariant: `mode == None` if and only if `data == None`. Every
/// occupied entry references a mappable object (Page or Table for
/// already-paged backings; Word/Blob/Atom backings are up-sized to
/// whole pages by the mapping engine at install time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub mode: EntryMode,
    pub datatype: DataType,
    pub data: Option<Handle>,
}

impl Entry {
    /// An empty slot.
    pub fn none() -> Self {
        Self {
            mode: EntryMode::None,
            datatype: DataType::Null,
            data: None,
        }
    }

    /// An occupied slot backed by `handle` of the given datatype.
    pub fn mapped(mode: EntryMode, datatype: DataType, handle: Handle) -> Self {
        Self {
            mode,
            datatype,
            data: Some(handle),
        }
    }

    pub fn is_none(&self) -> bool {
        self.mode == EntryMode::None
    }

    /// Checks the mode/data invariant and that the backing datatype is
    /// one the mapping engine accepts.
    pub fn validate(&self) -> Result<(), ErrorCode> {
        match (self.mode, self.data) {
            (EntryMode::None, None) => Ok(()),
            (EntryMode::None, Some(_)) | (_, None) => Err(ErrorCode::BadArgument),
            (_, Some(_)) => {
                if self.datatype.is_mappable() {
                    Ok(())
                } else {
                    Err(ErrorCode::BadType)
                }
            }
        }
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            None => write!(f, "Entry(none)"),
            Some(handle) => write!(f, "Entry({:?} {} {})", self.mode, self.datatype, handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_entry_is_valid() {
        let entry = Entry::none();
        assert!(entry.is_none());
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_mapped_entry_is_valid() {
        let entry = Entry::mapped(EntryMode::ReadWrite, DataType::Page, Handle::from_raw(3));
        assert!(!entry.is_none());
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_mode_data_invariant() {
        let missing_data = Entry {
            mode: EntryMode::ReadOnly,
            datatype: DataType::Page,
            data: None,
        };
        assert_eq!(missing_data.validate(), Err(ErrorCode::BadArgument));

        let stray_data = Entry {
            mode: EntryMode::None,
            datatype: DataType::Page,
            data: Some(Handle::from_raw(1)),
        };
        assert_eq!(stray_data.validate(), Err(ErrorCode::BadArgument));
    }

    #[test]
    fn test_unmappable_backing_rejected() {
        let entry = Entry::mapped(EntryMode::ReadOnly, DataType::Lambda, Handle::from_raw(5));
        assert_eq!(entry.validate(), Err(ErrorCode::BadType));
    }
}
