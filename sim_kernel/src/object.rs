//! The tagged-union kernel object repository.
//!
//! Every kernel object is one variant of [`Object`]; the variant is
//! fixed at creation and every accessor pattern-matches against it.
//! Objects reference each other only through handles, which keeps
//! ownership explicit: [`Object::owned_children`] enumerates exactly
//! the handles an object holds a reference to, and the handle table
//! releases those when the object dies.

use core_types::{DataType, Entry, Handle, TABLE_SLOTS};

/// Index of a registered native function in the kernel's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeId(pub usize);

/// A callable object: either a captured continuation with an argument
/// slot, or a kernel-provided native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lambda {
    /// Resumes `thunk` with the applied argument bound at descriptor
    /// slot `index`.
    Continuation { thunk: Handle, index: u64 },
    /// Computes eagerly inside the kernel.
    Native(NativeId),
}

/// A captured, resumable execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thunk {
    /// Blob holding the serialized register file.
    pub registers: Handle,
    /// Root page table of the captured address space.
    pub memory: Handle,
    /// Tuple of descriptor handles.
    pub descriptors: Handle,
}

/// A fixed 512-slot indexed container of entries.
///
/// Tables serve two roles over the same storage: generic entry-indexed
/// containers (via `GET`/`TAKE`/`PUT`/`SET`) and address-space page
/// tables (via the mapping engine, which interprets `span` to size the
/// address range each slot covers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Bytes of address space this table covers when used as a page table.
    pub span: usize,
    pub slots: Vec<Entry>,
}

impl Table {
    pub fn new(span: usize) -> Self {
        Self {
            span,
            slots: vec![Entry::none(); TABLE_SLOTS],
        }
    }

    /// Bytes of address space each slot covers.
    pub fn slot_span(&self) -> usize {
        self.span / TABLE_SLOTS
    }
}

/// A kernel object. The variant never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Null,
    Word(u64),
    Atom(Box<[u8]>),
    Exception(Handle),
    Blob(Box<[u8]>),
    Tuple(Vec<Option<Handle>>),
    Page(Box<[u8]>),
    Table(Table),
    Lambda(Lambda),
    Thunk(Thunk),
}

impl Object {
    pub fn datatype(&self) -> DataType {
        match self {
            Object::Null => DataType::Null,
            Object::Word(_) => DataType::Word,
            Object::Atom(_) => DataType::Atom,
            Object::Exception(_) => DataType::Exception,
            Object::Blob(_) => DataType::Blob,
            Object::Tuple(_) => DataType::Tuple,
            Object::Page(_) => DataType::Page,
            Object::Table(_) => DataType::Table,
            Object::Lambda(_) => DataType::Lambda,
            Object::Thunk(_) => DataType::Thunk,
        }
    }

    /// Handles this object owns a reference to.
    ///
    /// Releasing the object must release each of these exactly once.
    pub fn owned_children(&self) -> Vec<Handle> {
        match self {
            Object::Null
            | Object::Word(_)
            | Object::Atom(_)
            | Object::Blob(_)
            | Object::Page(_)
            | Object::Lambda(Lambda::Native(_)) => Vec::new(),
            Object::Exception(handle) => vec![*handle],
            Object::Tuple(slots) => slots.iter().flatten().copied().collect(),
            Object::Table(table) => table.slots.iter().filter_map(|entry| entry.data).collect(),
            Object::Lambda(Lambda::Continuation { thunk, .. }) => vec![*thunk],
            Object::Thunk(thunk) => vec![thunk.registers, thunk.memory, thunk.descriptors],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::EntryMode;

    #[test]
    fn test_datatype_tags() {
        assert_eq!(Object::Null.datatype(), DataType::Null);
        assert_eq!(Object::Word(7).datatype(), DataType::Word);
        assert_eq!(
            Object::Table(Table::new(2 << 20)).datatype(),
            DataType::Table
        );
    }

    #[test]
    fn test_leaf_objects_own_nothing() {
        assert!(Object::Word(1).owned_children().is_empty());
        assert!(Object::Blob(Box::from(&b"abc"[..])).owned_children().is_empty());
    }

    #[test]
    fn test_container_children_enumeration() {
        let tuple = Object::Tuple(vec![Some(Handle::from_raw(3)), None, Some(Handle::from_raw(5))]);
        assert_eq!(
            tuple.owned_children(),
            vec![Handle::from_raw(3), Handle::from_raw(5)]
        );

        let mut table = Table::new(2 << 20);
        table.slots[9] = Entry::mapped(EntryMode::ReadWrite, DataType::Page, Handle::from_raw(8));
        assert_eq!(Object::Table(table).owned_children(), vec![Handle::from_raw(8)]);
    }

    #[test]
    fn test_thunk_owns_its_components() {
        let thunk = Object::Thunk(Thunk {
            registers: Handle::from_raw(1),
            memory: Handle::from_raw(2),
            descriptors: Handle::from_raw(3),
        });
        assert_eq!(thunk.owned_children().len(), 3);
    }
}
