//! # Simulated Object Kernel
//!
//! This crate provides an in-process implementation of the kernel API:
//! a capability-based object kernel whose entire syscall surface runs
//! under `cargo test`.
//!
//! ## Purpose
//!
//! The simulated kernel allows testing guest-visible behavior without
//! hardware:
//! - Runs under `cargo test`
//! - Deterministic (no real concurrency, no real memory mapping)
//! - Fast (address spaces are ordinary heap objects)
//! - Inspectable (handle refcounts, domain state, and an audit log are
//!   all accessible)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! Kernel object models are hard to test when they only exist behind a
//! privilege boundary. Here the handle table, the object store, the
//! page-table walker, and the continuation machinery are plain data
//! structures, so every invariant (no type confusion, no use after
//! drop, atomic install-and-return-previous mapping) can be asserted
//! directly.
//!
//! This is not a mock: it is a full implementation of the syscall
//! contract that happens to run in-process.

pub mod audit;
pub mod domain;
pub mod handle_table;
pub mod object;

mod control;
mod gate;
mod mapping;
mod store;

pub use domain::{
    Domain, DomainState, Registers, CONTINUED_SENTINEL, DESCRIPTOR_SLOTS, REGISTER_COUNT,
    REGISTER_FILE_BYTES, RET,
};
pub use gate::Outcome;
pub use handle_table::HandleTable;
pub use object::{Lambda, NativeId, Object, Table, Thunk};

use core_types::{ErrorCode, Handle, PAGE_SIZE, TABLE_SLOTS};

/// A native function callable through `APPLY`.
///
/// Natives own the argument reference: they must either release it or
/// transfer it into the result.
pub type NativeFn = fn(&mut HandleTable, Handle) -> Result<Handle, ErrorCode>;

/// One isolated execution domain: handle table, object store, active
/// context, and dispatcher state.
///
/// There is no cross-domain sharing; moving an object between kernels
/// means serializing its content and recreating it on the other side.
pub struct Kernel {
    pub(crate) objects: HandleTable,
    pub(crate) domain: Domain,
    pub(crate) natives: Vec<NativeFn>,
    pub(crate) audit: audit::DispatchAuditLog,
}

impl Kernel {
    /// Creates a kernel with an empty 2 MiB address space and an empty
    /// descriptor tuple.
    pub fn new() -> Self {
        let mut objects = HandleTable::new();
        let memory = objects.insert(Object::Table(Table::new(PAGE_SIZE * TABLE_SLOTS)));
        let descriptors = objects.insert(Object::Tuple(vec![None; DESCRIPTOR_SLOTS]));
        Self {
            objects,
            domain: Domain::new(memory, descriptors),
            natives: Vec::new(),
            audit: audit::DispatchAuditLog::new(),
        }
    }

    /// Caps the number of simultaneously live objects, making the
    /// `OutOfMemory` error path reachable.
    pub fn with_object_quota(mut self, quota: usize) -> Self {
        self.objects.set_quota(Some(quota));
        self
    }

    /// Registers a native function and returns a Lambda handle for it.
    pub fn register_native(&mut self, native: NativeFn) -> Result<Handle, ErrorCode> {
        let id = NativeId(self.natives.len());
        self.natives.push(native);
        self.objects.alloc(Object::Lambda(Lambda::Native(id)))
    }

    /// The live object store (test inspection).
    pub fn objects(&self) -> &HandleTable {
        &self.objects
    }

    /// The current execution domain (test inspection).
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The dispatch audit log (test inspection).
    pub fn audit_log(&self) -> &audit::DispatchAuditLog {
        &self.audit
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}
