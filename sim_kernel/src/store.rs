//! Typed object store operations.
//!
//! One operation per datatype family, all dispatched from the syscall
//! gate. Validation strictly precedes mutation: every fallible check
//! happens before the first observable side effect.

use core_types::{pages_for, table_span_for, DataType, Entry, ErrorCode, Handle, PAGE_SIZE, TABLE_SLOTS};
use kernel_api::{SlotValue, SyscallResult};

use crate::domain::REGISTER_FILE_BYTES;
use crate::object::{Lambda, Object, Table, Thunk};
use crate::Kernel;

/// A copied-out container slot, used to end the store borrow before
/// refcount mutation.
enum Occupant {
    Tuple(Option<Handle>),
    Table(Entry),
}

impl Kernel {
    pub fn create_null(&mut self) -> Result<Handle, ErrorCode> {
        self.objects.alloc(Object::Null)
    }

    pub fn create_word(&mut self, value: u64) -> Result<Handle, ErrorCode> {
        self.objects.alloc(Object::Word(value))
    }

    pub fn create_atom(&mut self, data: Vec<u8>) -> Result<Handle, ErrorCode> {
        self.objects.alloc(Object::Atom(data.into()))
    }

    /// Wraps `handle` in an Exception, consuming the reference.
    pub fn create_exception(&mut self, handle: Handle) -> Result<Handle, ErrorCode> {
        if !self.objects.contains(handle) {
            return Err(ErrorCode::BadIndex);
        }
        self.objects.alloc(Object::Exception(handle))
    }

    pub fn create_blob(&mut self, data: Vec<u8>) -> Result<Handle, ErrorCode> {
        self.objects.alloc(Object::Blob(data.into()))
    }

    /// Allocates a tuple of `len` empty slots. The length is caller
    /// controlled, so allocation failure surfaces as `OutOfMemory`
    /// rather than aborting the kernel.
    pub fn create_tuple(&mut self, len: u64) -> Result<Handle, ErrorCode> {
        let len = usize::try_from(len).map_err(|_| ErrorCode::BadArgument)?;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| ErrorCode::OutOfMemory)?;
        slots.resize(len, None);
        self.objects.alloc(Object::Tuple(slots))
    }

    /// Allocates a zero-filled page object covering `size` bytes,
    /// rounded up to whole pages (minimum one).
    pub fn create_page(&mut self, size: u64) -> Result<Handle, ErrorCode> {
        let bytes = pages_for(size as usize)
            .checked_mul(PAGE_SIZE)
            .ok_or(ErrorCode::BadArgument)?;
        self.objects.alloc(Object::Page(vec![0u8; bytes].into()))
    }

    /// Allocates an empty table spanning the smallest supported range
    /// that covers `size` bytes.
    pub fn create_table(&mut self, size: u64) -> Result<Handle, ErrorCode> {
        let span = table_span_for(size as usize).ok_or(ErrorCode::BadArgument)?;
        self.objects.alloc(Object::Table(Table::new(span)))
    }

    /// Wraps a thunk in a continuation lambda binding applied arguments
    /// at descriptor slot `index`. Consumes the thunk reference.
    pub fn create_lambda(&mut self, thunk: Handle, index: u64) -> Result<Handle, ErrorCode> {
        if !matches!(self.objects.get(thunk)?, Object::Thunk(_)) {
            return Err(ErrorCode::BadType);
        }
        self.objects
            .alloc(Object::Lambda(Lambda::Continuation { thunk, index }))
    }

    /// Assembles a thunk from its three components, consuming the
    /// references. The registers blob must be exactly one register file.
    pub fn create_thunk(
        &mut self,
        registers: Handle,
        memory: Handle,
        descriptors: Handle,
    ) -> Result<Handle, ErrorCode> {
        match self.objects.get(registers)? {
            Object::Blob(bytes) if bytes.len() == REGISTER_FILE_BYTES => {}
            Object::Blob(_) => return Err(ErrorCode::BadArgument),
            _ => return Err(ErrorCode::BadType),
        }
        if !matches!(self.objects.get(memory)?, Object::Table(_)) {
            return Err(ErrorCode::BadType);
        }
        if !matches!(self.objects.get(descriptors)?, Object::Tuple(_)) {
            return Err(ErrorCode::BadType);
        }
        self.objects.alloc(Object::Thunk(Thunk {
            registers,
            memory,
            descriptors,
        }))
    }

    pub fn type_of(&self, handle: Handle) -> Result<DataType, ErrorCode> {
        Ok(self.objects.get(handle)?.datatype())
    }

    /// Type-directed read: Word yields its value, Exception a cloned
    /// reference to the wrapped handle, byte objects a bounds-checked
    /// slice.
    pub fn read(&mut self, handle: Handle, offset: u64, len: u64) -> Result<SyscallResult, ErrorCode> {
        let wrapped = match self.objects.get(handle)? {
            Object::Word(value) => return Ok(SyscallResult::Word(*value)),
            Object::Atom(bytes) | Object::Blob(bytes) | Object::Page(bytes) => {
                let offset = offset as usize;
                let end = offset
                    .checked_add(len as usize)
                    .ok_or(ErrorCode::BadArgument)?;
                if end > bytes.len() {
                    return Err(ErrorCode::BadArgument);
                }
                return Ok(SyscallResult::Bytes(bytes[offset..end].to_vec()));
            }
            Object::Exception(inner) => *inner,
            _ => return Err(ErrorCode::BadType),
        };
        self.objects.clone_handle(wrapped)?;
        Ok(SyscallResult::Handle(wrapped))
    }

    /// Writes into a Blob or Page. Atoms are immutable.
    pub fn write(&mut self, handle: Handle, offset: u64, data: &[u8]) -> Result<(), ErrorCode> {
        match self.objects.get_mut(handle)? {
            Object::Blob(bytes) | Object::Page(bytes) => {
                let offset = offset as usize;
                let end = offset
                    .checked_add(data.len())
                    .ok_or(ErrorCode::BadArgument)?;
                if end > bytes.len() {
                    return Err(ErrorCode::BadArgument);
                }
                bytes[offset..end].copy_from_slice(data);
                Ok(())
            }
            _ => Err(ErrorCode::BadType),
        }
    }

    /// Structural equality for content objects, element identity for
    /// containers, reference identity for lambdas and thunks.
    pub fn equals(&self, left: Handle, right: Handle) -> Result<bool, ErrorCode> {
        let a = self.objects.get(left)?;
        let b = self.objects.get(right)?;
        if left == right {
            return Ok(true);
        }
        Ok(match (a, b) {
            (Object::Null, Object::Null) => true,
            (Object::Word(x), Object::Word(y)) => x == y,
            (Object::Atom(x), Object::Atom(y)) => x == y,
            (Object::Blob(x), Object::Blob(y)) => x == y,
            (Object::Page(x), Object::Page(y)) => x == y,
            (Object::Exception(x), Object::Exception(y)) => x == y,
            (Object::Tuple(x), Object::Tuple(y)) => x == y,
            (Object::Table(x), Object::Table(y)) => x.span == y.span && x.slots == y.slots,
            _ => false,
        })
    }

    pub fn length(&self, handle: Handle) -> Result<u64, ErrorCode> {
        match self.objects.get(handle)? {
            Object::Null => Ok(0),
            Object::Word(_) => Ok(8),
            Object::Atom(bytes) | Object::Blob(bytes) | Object::Page(bytes) => {
                Ok(bytes.len() as u64)
            }
            Object::Tuple(slots) => Ok(slots.len() as u64),
            Object::Table(table) => Ok(table.span as u64),
            _ => Err(ErrorCode::BadType),
        }
    }

    fn occupant(&self, container: Handle, index: u64) -> Result<Occupant, ErrorCode> {
        let index = index as usize;
        match self.objects.get(container)? {
            Object::Tuple(slots) => {
                if index >= slots.len() {
                    return Err(ErrorCode::BadIndex);
                }
                Ok(Occupant::Tuple(slots[index]))
            }
            Object::Table(table) => {
                if index >= TABLE_SLOTS {
                    return Err(ErrorCode::BadIndex);
                }
                Ok(Occupant::Table(table.slots[index]))
            }
            _ => Err(ErrorCode::BadType),
        }
    }

    /// Non-destructive read of a container slot; the occupant reference
    /// is cloned. An empty slot yields a fresh Null handle (tuples) or
    /// a NONE entry (tables).
    pub fn get(&mut self, container: Handle, index: u64) -> Result<SyscallResult, ErrorCode> {
        match self.occupant(container, index)? {
            Occupant::Tuple(Some(handle)) => {
                self.objects.clone_handle(handle)?;
                Ok(SyscallResult::Handle(handle))
            }
            Occupant::Tuple(None) => {
                let null = self.objects.alloc(Object::Null)?;
                Ok(SyscallResult::Handle(null))
            }
            Occupant::Table(entry) => {
                if let Some(handle) = entry.data {
                    self.objects.clone_handle(handle)?;
                }
                Ok(SyscallResult::Entry(entry))
            }
        }
    }

    /// Destructive removal of a container slot; ownership of the
    /// occupant moves to the caller and the slot is left empty.
    pub fn take(&mut self, container: Handle, index: u64) -> Result<SyscallResult, ErrorCode> {
        // Bounds and type check before mutating.
        match self.occupant(container, index)? {
            Occupant::Tuple(_) => {}
            Occupant::Table(_) => {}
        }
        let index = index as usize;
        let removed = match self.objects.get_mut(container)? {
            Object::Tuple(slots) => Occupant::Tuple(slots[index].take()),
            Object::Table(table) => {
                Occupant::Table(std::mem::replace(&mut table.slots[index], Entry::none()))
            }
            _ => return Err(ErrorCode::BadType),
        };
        match removed {
            Occupant::Tuple(Some(handle)) => Ok(SyscallResult::Handle(handle)),
            Occupant::Tuple(None) => {
                let null = self.objects.alloc(Object::Null)?;
                Ok(SyscallResult::Handle(null))
            }
            Occupant::Table(entry) => Ok(SyscallResult::Entry(entry)),
        }
    }

    /// Installs `value` at a container slot and returns the previous
    /// occupant, transferring its ownership to the caller.
    pub fn put(
        &mut self,
        container: Handle,
        index: u64,
        value: SlotValue,
    ) -> Result<SyscallResult, ErrorCode> {
        let container_type = self.objects.get(container)?.datatype();
        match (container_type, value) {
            (DataType::Tuple, SlotValue::Handle(incoming)) => {
                if !self.objects.contains(incoming) {
                    return Err(ErrorCode::BadIndex);
                }
                let previously_empty = match self.occupant(container, index)? {
                    Occupant::Tuple(slot) => slot.is_none(),
                    Occupant::Table(_) => return Err(ErrorCode::BadType),
                };
                // Preallocate the Null stand-in so the swap cannot fail
                // after it takes effect.
                let null = if previously_empty {
                    Some(self.objects.alloc(Object::Null)?)
                } else {
                    None
                };
                let index = index as usize;
                let previous = match self.objects.get_mut(container)? {
                    Object::Tuple(slots) => std::mem::replace(&mut slots[index], Some(incoming)),
                    _ => return Err(ErrorCode::BadType),
                };
                match (previous, null) {
                    (Some(handle), _) => Ok(SyscallResult::Handle(handle)),
                    (None, Some(null)) => Ok(SyscallResult::Handle(null)),
                    (None, None) => Err(ErrorCode::BadArgument),
                }
            }
            (DataType::Table, SlotValue::Entry(entry)) => {
                entry.validate()?;
                if let Some(handle) = entry.data {
                    if self.objects.get(handle)?.datatype() != entry.datatype {
                        return Err(ErrorCode::BadType);
                    }
                }
                match self.occupant(container, index)? {
                    Occupant::Table(_) => {}
                    Occupant::Tuple(_) => return Err(ErrorCode::BadType),
                }
                let index = index as usize;
                let previous = match self.objects.get_mut(container)? {
                    Object::Table(table) => std::mem::replace(&mut table.slots[index], entry),
                    _ => return Err(ErrorCode::BadType),
                };
                Ok(SyscallResult::Entry(previous))
            }
            (DataType::Tuple, SlotValue::Entry(_)) | (DataType::Table, SlotValue::Handle(_)) => {
                Err(ErrorCode::BadType)
            }
            _ => Err(ErrorCode::BadType),
        }
    }

    /// Installs `value` at a container slot and releases the previous
    /// occupant.
    pub fn set(&mut self, container: Handle, index: u64, value: SlotValue) -> Result<(), ErrorCode> {
        match self.put(container, index, value)? {
            SyscallResult::Handle(previous) => self.objects.release(previous),
            SyscallResult::Entry(previous) => match previous.data {
                Some(handle) => self.objects.release(handle),
                None => Ok(()),
            },
            _ => Err(ErrorCode::BadType),
        }
    }

    /// Invokes a lambda with an argument handle, consuming both the
    /// function and argument references.
    ///
    /// Native lambdas compute eagerly; continuation lambdas produce a
    /// new thunk with the argument bound at the lambda's descriptor
    /// slot, resumable via `TAILCALL`.
    pub fn apply(&mut self, function: Handle, argument: Handle) -> Result<Handle, ErrorCode> {
        if !self.objects.contains(argument) {
            return Err(ErrorCode::BadIndex);
        }
        let lambda = match self.objects.get(function)? {
            Object::Lambda(lambda) => *lambda,
            _ => return Err(ErrorCode::BadType),
        };
        match lambda {
            Lambda::Native(id) => {
                let native = *self.natives.get(id.0).ok_or(ErrorCode::BadIndex)?;
                let result = native(&mut self.objects, argument)?;
                self.objects.release(function)?;
                Ok(result)
            }
            Lambda::Continuation { thunk, index } => {
                let parts = match self.objects.get(thunk)? {
                    Object::Thunk(parts) => *parts,
                    _ => return Err(ErrorCode::BadType),
                };
                let descriptor_len = match self.objects.get(parts.descriptors)? {
                    Object::Tuple(slots) => slots.len(),
                    _ => return Err(ErrorCode::BadType),
                };
                let bind = index as usize;
                if bind >= descriptor_len {
                    return Err(ErrorCode::BadIndex);
                }
                let register_bytes = match self.objects.get(parts.registers)? {
                    Object::Blob(bytes) => bytes.clone(),
                    _ => return Err(ErrorCode::BadType),
                };
                // The produced thunk is an independent snapshot: its
                // memory is a deep copy, so resuming it cannot mutate
                // state still owned by the original capture.
                let registers = self.objects.alloc(Object::Blob(register_bytes))?;
                let memory = self.deep_copy_memory(parts.memory)?;
                let descriptors = self.shallow_copy_tuple(parts.descriptors)?;
                let previous = match self.objects.get_mut(descriptors)? {
                    Object::Tuple(slots) => std::mem::replace(&mut slots[bind], Some(argument)),
                    _ => return Err(ErrorCode::BadType),
                };
                if let Some(displaced) = previous {
                    self.objects.release(displaced)?;
                }
                let produced = self.objects.alloc(Object::Thunk(Thunk {
                    registers,
                    memory,
                    descriptors,
                }))?;
                self.objects.release(function)?;
                Ok(produced)
            }
        }
    }
}
