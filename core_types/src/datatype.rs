//! The closed datatype taxonomy of the object model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying the variant of a kernel object.
///
/// An object's datatype is fixed at creation and never changes; every
/// typed operation checks the tag and fails with `BadType` on a
/// mismatch. The discriminants are part of the syscall ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    Null = 0,
    Word = 1,
    Atom = 2,
    Exception = 3,
    Blob = 4,
    Tuple = 5,
    Page = 6,
    Table = 7,
    Lambda = 8,
    Thunk = 9,
}

impl DataType {
    /// Decodes an ABI discriminant.
    pub fn from_raw(raw: u64) -> Option<Self> {
        Some(match raw {
            0 => DataType::Null,
            1 => DataType::Word,
            2 => DataType::Atom,
            3 => DataType::Exception,
            4 => DataType::Blob,
            5 => DataType::Tuple,
            6 => DataType::Page,
            7 => DataType::Table,
            8 => DataType::Lambda,
            9 => DataType::Thunk,
            _ => return None,
        })
    }

    /// Returns the ABI discriminant.
    pub fn as_raw(self) -> u64 {
        self as u64
    }

    /// True for the datatypes that may back a page-table entry.
    pub fn is_mappable(self) -> bool {
        matches!(
            self,
            DataType::Page | DataType::Table | DataType::Word | DataType::Blob | DataType::Atom
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Null => "null",
            DataType::Word => "word",
            DataType::Atom => "atom",
            DataType::Exception => "exception",
            DataType::Blob => "blob",
            DataType::Tuple => "tuple",
            DataType::Page => "page",
            DataType::Table => "table",
            DataType::Lambda => "lambda",
            DataType::Thunk => "thunk",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datatype_raw_round_trip() {
        for raw in 0..10 {
            let dt = DataType::from_raw(raw).unwrap();
            assert_eq!(dt.as_raw(), raw);
        }
        assert_eq!(DataType::from_raw(10), None);
        assert_eq!(DataType::from_raw(u64::MAX), None);
    }

    #[test]
    fn test_mappable_datatypes() {
        assert!(DataType::Page.is_mappable());
        assert!(DataType::Table.is_mappable());
        assert!(DataType::Blob.is_mappable());
        assert!(!DataType::Lambda.is_mappable());
        assert!(!DataType::Null.is_mappable());
    }
}
