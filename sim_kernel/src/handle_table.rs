//! The per-domain handle table.
//!
//! Maps opaque handles to reference-counted objects. Handle values are
//! allocated monotonically and never reused while the object is alive,
//! so a stale handle reliably fails with `BadIndex` instead of aliasing
//! a newer object.

use std::collections::HashMap;

use core_types::{ErrorCode, Handle};

use crate::object::Object;

#[derive(Debug)]
struct Slot {
    object: Object,
    refs: u64,
}

/// Dynamically-sized arena of live kernel objects keyed by handle.
///
/// An optional quota caps the number of live objects so that the
/// `OutOfMemory` path is reachable under test; without a quota the
/// table grows with the host heap.
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: HashMap<Handle, Slot>,
    next_raw: i64,
    quota: Option<usize>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            next_raw: 1,
            quota: None,
        }
    }

    /// Caps the number of simultaneously live objects.
    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Inserts an object unconditionally, bypassing the quota.
    ///
    /// Used for kernel-internal bootstrap objects (the initial address
    /// space root and descriptor tuple). Syscall paths go through
    /// [`HandleTable::alloc`] instead.
    pub(crate) fn insert(&mut self, object: Object) -> Handle {
        let handle = Handle::from_raw(self.next_raw);
        self.next_raw += 1;
        self.slots.insert(handle, Slot { object, refs: 1 });
        handle
    }

    /// Allocates a fresh handle for `object` with a refcount of one.
    pub fn alloc(&mut self, object: Object) -> Result<Handle, ErrorCode> {
        if let Some(quota) = self.quota {
            if self.slots.len() >= quota {
                return Err(ErrorCode::OutOfMemory);
            }
        }
        Ok(self.insert(object))
    }

    pub fn get(&self, handle: Handle) -> Result<&Object, ErrorCode> {
        self.slots
            .get(&handle)
            .map(|slot| &slot.object)
            .ok_or(ErrorCode::BadIndex)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut Object, ErrorCode> {
        self.slots
            .get_mut(&handle)
            .map(|slot| &mut slot.object)
            .ok_or(ErrorCode::BadIndex)
    }

    /// Increments the refcount and returns the same handle value.
    pub fn clone_handle(&mut self, handle: Handle) -> Result<Handle, ErrorCode> {
        let slot = self.slots.get_mut(&handle).ok_or(ErrorCode::BadIndex)?;
        slot.refs += 1;
        Ok(handle)
    }

    /// Drops one reference; at zero the object dies and every handle it
    /// owned is released in turn.
    ///
    /// The cascade runs on an explicit worklist rather than the call
    /// stack, so arbitrarily deep object graphs cannot overflow.
    pub fn release(&mut self, handle: Handle) -> Result<(), ErrorCode> {
        if !self.slots.contains_key(&handle) {
            return Err(ErrorCode::BadIndex);
        }
        let mut worklist = vec![handle];
        while let Some(current) = worklist.pop() {
            let Some(slot) = self.slots.get_mut(&current) else {
                continue;
            };
            slot.refs -= 1;
            if slot.refs == 0 {
                if let Some(dead) = self.slots.remove(&current) {
                    worklist.extend(dead.object.owned_children());
                }
            }
        }
        Ok(())
    }

    /// Removes an object whose refcount is exactly one, without
    /// releasing its children. The caller adopts those references.
    pub(crate) fn take_sole(&mut self, handle: Handle) -> Option<Object> {
        match self.slots.get(&handle) {
            Some(slot) if slot.refs == 1 => self.slots.remove(&handle).map(|slot| slot.object),
            _ => None,
        }
    }

    pub fn refs(&self, handle: Handle) -> Option<u64> {
        self.slots.get(&handle).map(|slot| slot.refs)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slots.contains_key(&handle)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
