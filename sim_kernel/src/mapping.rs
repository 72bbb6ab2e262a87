//! The memory-mapping engine.
//!
//! Interprets Table objects as page tables. Every table level has 512
//! slots; a table spanning S bytes gives each slot S/512 bytes, so the
//! supported leaf granularities are 4 KiB, 2 MiB and 1 GiB. Install
//! operations walk from the root, creating intermediate tables on
//! demand, and swap the new entry with the previous occupant in one
//! step; the previous entry (and ownership of its backing handle) is
//! returned to the caller. That install-and-return-previous contract is
//! the system's only ownership-transfer idiom for mapped storage.

use core_types::{
    pages_for, DataType, Entry, EntryMode, ErrorCode, Handle, PAGE_SIZE, TABLE_SLOTS,
};

use crate::object::{Object, Table};
use crate::Kernel;

/// Largest supported address-space span (a depth-3 table).
const MAX_SPAN: usize = PAGE_SIZE * TABLE_SLOTS * TABLE_SLOTS * TABLE_SLOTS;

/// Largest content size the sub-page attach path will up-size.
const MAX_ATTACH_BYTES: usize = PAGE_SIZE * TABLE_SLOTS;

impl Kernel {
    /// Installs `entry` at the slot containing `address` in the current
    /// address space, growing the root table as needed, and returns the
    /// previous occupant.
    pub fn mmap(&mut self, address: u64, entry: Entry) -> Result<Entry, ErrorCode> {
        entry.validate()?;
        let Some(backing) = entry.data else {
            return self.install_none(self.domain.memory, address);
        };
        if self.objects.get(backing)?.datatype() != entry.datatype {
            return Err(ErrorCode::BadType);
        }
        let target = self.plan_target_span(&entry)?;
        // Grow the root until the address is in range and a slot of the
        // entry's granularity is reachable.
        loop {
            let span = self.root_span()?;
            if (address as usize) < span && target * TABLE_SLOTS <= span {
                break;
            }
            self.embiggen_root()?;
        }
        let root = self.domain.memory;
        self.validate_walk(root, address as usize, target)?;
        let prepared = self.prepare_backing(entry)?;
        self.commit_walk(root, address as usize, prepared, target)
    }

    /// The same install-and-swap against an explicit table object,
    /// used to build an address space for a not-yet-activated context.
    /// Strict: an out-of-range address fails instead of growing.
    pub fn table_map(&mut self, table: Handle, address: u64, entry: Entry) -> Result<Entry, ErrorCode> {
        if !matches!(self.objects.get(table)?, Object::Table(_)) {
            return Err(ErrorCode::BadType);
        }
        entry.validate()?;
        let Some(backing) = entry.data else {
            return self.install_none(table, address);
        };
        if self.objects.get(backing)?.datatype() != entry.datatype {
            return Err(ErrorCode::BadType);
        }
        let target = self.plan_target_span(&entry)?;
        self.validate_walk(table, address as usize, target)?;
        let prepared = self.prepare_backing(entry)?;
        self.commit_walk(table, address as usize, prepared, target)
    }

    /// Flips READ_WRITE/READ_ONLY on the existing leaf mapping that
    /// covers `address`. An unmapped address fails: protection changes
    /// never succeed silently.
    pub fn mprotect(&mut self, address: u64, writable: bool) -> Result<(), ErrorCode> {
        let mut current = self.domain.memory;
        let mut offset = address as usize;
        loop {
            let (slot_span, index, slot) = self.slot_at(current, offset)?;
            match slot.data {
                None => return Err(ErrorCode::BadArgument),
                Some(next) if slot.datatype == DataType::Table => {
                    current = next;
                    offset %= slot_span;
                }
                Some(_) => {
                    let mode = if writable {
                        EntryMode::ReadWrite
                    } else {
                        EntryMode::ReadOnly
                    };
                    match self.objects.get_mut(current)? {
                        Object::Table(table) => table.slots[index].mode = mode,
                        _ => return Err(ErrorCode::BadType),
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Reads `len` bytes of guest-visible memory starting at `address`,
    /// resolving through the current page table.
    pub fn read_memory(&self, address: u64, len: usize) -> Result<Vec<u8>, ErrorCode> {
        let mut out = Vec::with_capacity(len);
        let mut cursor = address;
        while out.len() < len {
            let (page, within, _mode) = self.resolve_leaf(cursor)?;
            let bytes = match self.objects.get(page)? {
                Object::Page(bytes) => bytes,
                _ => return Err(ErrorCode::BadArgument),
            };
            if within >= bytes.len() {
                return Err(ErrorCode::BadArgument);
            }
            let take = (len - out.len()).min(bytes.len() - within);
            out.extend_from_slice(&bytes[within..within + take]);
            cursor += take as u64;
        }
        Ok(out)
    }

    /// Writes bytes into guest-visible memory. Every touched leaf must
    /// be READ_WRITE; the mode check runs over the whole range before
    /// the first byte is written.
    pub fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), ErrorCode> {
        let mut cursor = address;
        let mut remaining = data.len();
        while remaining > 0 {
            let (page, within, mode) = self.resolve_leaf(cursor)?;
            if !mode.is_writable() {
                return Err(ErrorCode::BadArgument);
            }
            let page_len = match self.objects.get(page)? {
                Object::Page(bytes) => bytes.len(),
                _ => return Err(ErrorCode::BadArgument),
            };
            if within >= page_len {
                return Err(ErrorCode::BadArgument);
            }
            let take = remaining.min(page_len - within);
            cursor += take as u64;
            remaining -= take;
        }

        let mut cursor = address;
        let mut written = 0;
        while written < data.len() {
            let (page, within, _mode) = self.resolve_leaf(cursor)?;
            match self.objects.get_mut(page)? {
                Object::Page(bytes) => {
                    let take = (data.len() - written).min(bytes.len() - within);
                    bytes[within..within + take].copy_from_slice(&data[written..written + take]);
                    written += take;
                    cursor += take as u64;
                }
                _ => return Err(ErrorCode::BadArgument),
            }
        }
        Ok(())
    }

    /// Resolves `address` to its backing page, the offset within it,
    /// and the leaf entry's mode.
    fn resolve_leaf(&self, address: u64) -> Result<(Handle, usize, EntryMode), ErrorCode> {
        let mut current = self.domain.memory;
        let mut offset = address as usize;
        loop {
            let (slot_span, _index, slot) = self.slot_at(current, offset)?;
            match slot.data {
                None => return Err(ErrorCode::BadArgument),
                Some(next) if slot.datatype == DataType::Table => {
                    current = next;
                    offset %= slot_span;
                }
                Some(page) if slot.datatype == DataType::Page => {
                    return Ok((page, offset % slot_span, slot.mode));
                }
                Some(_) => return Err(ErrorCode::BadArgument),
            }
        }
    }

    /// Reads the slot covering `offset` in `table`: (slot span, index,
    /// entry copy). Fails on non-table handles and out-of-span offsets.
    fn slot_at(&self, table: Handle, offset: usize) -> Result<(usize, usize, Entry), ErrorCode> {
        match self.objects.get(table)? {
            Object::Table(table) => {
                if offset >= table.span {
                    return Err(ErrorCode::BadArgument);
                }
                let slot_span = table.slot_span();
                let index = offset / slot_span;
                Ok((slot_span, index, table.slots[index]))
            }
            _ => Err(ErrorCode::BadType),
        }
    }

    fn root_span(&self) -> Result<usize, ErrorCode> {
        match self.objects.get(self.domain.memory)? {
            Object::Table(table) => Ok(table.span),
            _ => Err(ErrorCode::BadType),
        }
    }

    /// Replaces the root with a 512x larger table whose slot 0 is the
    /// old root. An empty old root is released instead of wrapped, so
    /// growth never manufactures an occupant for a never-mapped slot.
    fn embiggen_root(&mut self) -> Result<(), ErrorCode> {
        let old_root = self.domain.memory;
        let (old_span, occupied) = match self.objects.get(old_root)? {
            Object::Table(table) => (
                table.span,
                table.slots.iter().any(|slot| !slot.is_none()),
            ),
            _ => return Err(ErrorCode::BadType),
        };
        let new_span = old_span
            .checked_mul(TABLE_SLOTS)
            .ok_or(ErrorCode::BadArgument)?;
        if new_span > MAX_SPAN {
            return Err(ErrorCode::BadArgument);
        }
        let mut table = Table::new(new_span);
        if occupied {
            table.slots[0] = Entry::mapped(EntryMode::ReadWrite, DataType::Table, old_root);
        }
        let new_root = self.objects.alloc(Object::Table(table))?;
        log::trace!("address space grown to {} bytes", new_span);
        self.domain.memory = new_root;
        if !occupied {
            self.objects.release(old_root)?;
        }
        Ok(())
    }

    /// Address-space span the entry will occupy once installed.
    fn plan_target_span(&self, entry: &Entry) -> Result<usize, ErrorCode> {
        let backing = entry.data.ok_or(ErrorCode::BadArgument)?;
        match self.objects.get(backing)? {
            Object::Page(bytes) => {
                let len = bytes.len();
                if len == PAGE_SIZE || len == PAGE_SIZE * TABLE_SLOTS
                    || len == PAGE_SIZE * TABLE_SLOTS * TABLE_SLOTS
                {
                    Ok(len)
                } else {
                    Err(ErrorCode::BadArgument)
                }
            }
            Object::Table(table) => Ok(table.span),
            Object::Word(_) => Ok(PAGE_SIZE),
            Object::Blob(bytes) | Object::Atom(bytes) => {
                let len = bytes.len();
                if pages_for(len) == 1 {
                    Ok(PAGE_SIZE)
                } else if len <= MAX_ATTACH_BYTES {
                    Ok(MAX_ATTACH_BYTES)
                } else {
                    Err(ErrorCode::BadArgument)
                }
            }
            _ => Err(ErrorCode::BadType),
        }
    }

    /// Up-sizes Word/Blob/Atom backings to whole zero-padded pages (a
    /// single page, or a table of pages), consuming the original
    /// reference. Page and Table backings pass through unchanged.
    fn prepare_backing(&mut self, entry: Entry) -> Result<Entry, ErrorCode> {
        let backing = entry.data.ok_or(ErrorCode::BadArgument)?;
        let content: Vec<u8> = match self.objects.get(backing)? {
            Object::Page(_) | Object::Table(_) => return Ok(entry),
            Object::Word(value) => value.to_le_bytes().to_vec(),
            Object::Blob(bytes) | Object::Atom(bytes) => bytes.to_vec(),
            _ => return Err(ErrorCode::BadType),
        };
        if content.len() > MAX_ATTACH_BYTES {
            return Err(ErrorCode::BadArgument);
        }
        let prepared = if pages_for(content.len()) == 1 {
            let mut page = vec![0u8; PAGE_SIZE];
            page[..content.len()].copy_from_slice(&content);
            let handle = self.objects.alloc(Object::Page(page.into()))?;
            Entry::mapped(entry.mode, DataType::Page, handle)
        } else {
            let mut table = Table::new(MAX_ATTACH_BYTES);
            for (index, chunk) in content.chunks(PAGE_SIZE).enumerate() {
                let mut page = vec![0u8; PAGE_SIZE];
                page[..chunk.len()].copy_from_slice(chunk);
                let handle = self.objects.alloc(Object::Page(page.into()))?;
                table.slots[index] = Entry::mapped(entry.mode, DataType::Page, handle);
            }
            let handle = self.objects.alloc(Object::Table(table))?;
            Entry::mapped(entry.mode, DataType::Table, handle)
        };
        self.objects.release(backing)?;
        Ok(prepared)
    }

    /// Read-only walk proving the install can succeed, so the commit
    /// never mutates a table and then fails.
    fn validate_walk(&self, root: Handle, address: usize, target: usize) -> Result<(), ErrorCode> {
        let mut current = root;
        let mut offset = address;
        loop {
            let (slot_span, _index, slot) = self.slot_at(current, offset)?;
            if target > slot_span {
                return Err(ErrorCode::BadArgument);
            }
            if target == slot_span {
                return Ok(());
            }
            match slot.data {
                // Missing intermediates are created during commit.
                None => return Ok(()),
                Some(next) if slot.datatype == DataType::Table => {
                    current = next;
                    offset %= slot_span;
                }
                // A coarser leaf blocks descent.
                Some(_) => return Err(ErrorCode::BadArgument),
            }
        }
    }

    /// Descends (creating intermediate tables) and swaps `entry` into
    /// the slot of matching granularity, returning the previous
    /// occupant.
    fn commit_walk(
        &mut self,
        root: Handle,
        address: usize,
        entry: Entry,
        target: usize,
    ) -> Result<Entry, ErrorCode> {
        let mut current = root;
        let mut offset = address;
        loop {
            let (slot_span, index, slot) = self.slot_at(current, offset)?;
            if target == slot_span {
                let previous = match self.objects.get_mut(current)? {
                    Object::Table(table) => std::mem::replace(&mut table.slots[index], entry),
                    _ => return Err(ErrorCode::BadType),
                };
                return Ok(previous);
            }
            match slot.data {
                Some(next) if slot.datatype == DataType::Table => {
                    current = next;
                    offset %= slot_span;
                }
                None => {
                    let mid = self.objects.alloc(Object::Table(Table::new(slot_span)))?;
                    match self.objects.get_mut(current)? {
                        Object::Table(table) => {
                            table.slots[index] =
                                Entry::mapped(EntryMode::ReadWrite, DataType::Table, mid);
                        }
                        _ => return Err(ErrorCode::BadType),
                    }
                    current = mid;
                    offset %= slot_span;
                }
                Some(_) => return Err(ErrorCode::BadArgument),
            }
        }
    }

    /// Unmaps the deepest mapping covering `address`, returning the
    /// removed entry. An already-unmapped address yields a NONE entry
    /// without structural changes.
    fn install_none(&mut self, root: Handle, address: u64) -> Result<Entry, ErrorCode> {
        let mut current = root;
        let mut offset = address as usize;
        loop {
            let (slot_span, index, slot) = self.slot_at(current, offset)?;
            match slot.data {
                None => return Ok(Entry::none()),
                Some(next) if slot.datatype == DataType::Table && slot_span > PAGE_SIZE => {
                    current = next;
                    offset %= slot_span;
                }
                Some(_) => {
                    let previous = match self.objects.get_mut(current)? {
                        Object::Table(table) => {
                            std::mem::replace(&mut table.slots[index], Entry::none())
                        }
                        _ => return Err(ErrorCode::BadType),
                    };
                    return Ok(previous);
                }
            }
        }
    }

    /// Duplicates a mapped object graph: tables and their backings are
    /// copied structurally, content objects byte-for-byte. Used by
    /// continuation capture to make snapshots independent of the
    /// running address space.
    pub(crate) fn deep_copy_memory(&mut self, handle: Handle) -> Result<Handle, ErrorCode> {
        let object = self.objects.get(handle)?.clone();
        match object {
            Object::Table(table) => {
                let mut copy = Table::new(table.span);
                for (index, slot) in table.slots.iter().enumerate() {
                    if let Some(backing) = slot.data {
                        let duplicate = self.deep_copy_memory(backing)?;
                        copy.slots[index] = Entry::mapped(slot.mode, slot.datatype, duplicate);
                    }
                }
                self.objects.alloc(Object::Table(copy))
            }
            Object::Page(bytes) => self.objects.alloc(Object::Page(bytes)),
            Object::Blob(bytes) => self.objects.alloc(Object::Blob(bytes)),
            Object::Atom(bytes) => self.objects.alloc(Object::Atom(bytes)),
            Object::Word(value) => self.objects.alloc(Object::Word(value)),
            Object::Null => self.objects.alloc(Object::Null),
            _ => Err(ErrorCode::BadType),
        }
    }

    /// Copies a tuple object, cloning each element reference.
    pub(crate) fn shallow_copy_tuple(&mut self, handle: Handle) -> Result<Handle, ErrorCode> {
        let slots = match self.objects.get(handle)? {
            Object::Tuple(slots) => slots.clone(),
            _ => return Err(ErrorCode::BadType),
        };
        for element in slots.iter().flatten() {
            self.objects.clone_handle(*element)?;
        }
        self.objects.alloc(Object::Tuple(slots))
    }
}
