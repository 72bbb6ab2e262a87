//! # Syscall Contract Tests
//!
//! This crate provides "golden" tests for the kernel's syscall
//! contract to ensure it doesn't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: The contract is written as code
//! - **Testability first**: Contract tests fail when behavior changes
//! - **Mechanism not policy**: Define what must be stable, not how to
//!   use it
//!
//! ## Structure
//!
//! Each subsystem has a module with contract tests that verify:
//! - Error codes for every rejection class
//! - Ownership transfer rules (consume, adopt, return-previous)
//! - The numeric ABI (opcodes, result encoding, register layout)
//! - End-to-end scenarios through the dispatcher

pub mod abi;
pub mod control;
pub mod lifecycle;
pub mod memory;
pub mod objects;

/// Common test helpers for unwrapping dispatch outcomes.
pub mod test_helpers {
    use core_types::{Entry, ErrorCode, Handle};
    use kernel_api::{Syscall, SyscallResult};
    use sim_kernel::{Kernel, Outcome};

    /// Dispatches and expects a handle-valued completion.
    pub fn dispatch_handle(kernel: &mut Kernel, syscall: Syscall) -> Handle {
        match kernel.dispatch(syscall) {
            Outcome::Completed(Ok(SyscallResult::Handle(handle))) => handle,
            other => panic!("expected handle completion, got {:?}", other),
        }
    }

    /// Dispatches and expects a byte-valued completion.
    pub fn dispatch_bytes(kernel: &mut Kernel, syscall: Syscall) -> Vec<u8> {
        match kernel.dispatch(syscall) {
            Outcome::Completed(Ok(SyscallResult::Bytes(bytes))) => bytes,
            other => panic!("expected bytes completion, got {:?}", other),
        }
    }

    /// Dispatches and expects an entry-valued completion.
    pub fn dispatch_entry(kernel: &mut Kernel, syscall: Syscall) -> Entry {
        match kernel.dispatch(syscall) {
            Outcome::Completed(Ok(SyscallResult::Entry(entry))) => entry,
            other => panic!("expected entry completion, got {:?}", other),
        }
    }

    /// Dispatches and expects a unit completion.
    pub fn dispatch_unit(kernel: &mut Kernel, syscall: Syscall) {
        match kernel.dispatch(syscall) {
            Outcome::Completed(Ok(SyscallResult::Unit)) => {}
            other => panic!("expected unit completion, got {:?}", other),
        }
    }

    /// Dispatches and expects a specific rejection.
    pub fn dispatch_err(kernel: &mut Kernel, syscall: Syscall, expected: ErrorCode) {
        match kernel.dispatch(syscall) {
            Outcome::Completed(Err(error)) => assert_eq!(
                error, expected,
                "rejection class changed: expected {:?}, got {:?}",
                expected, error
            ),
            other => panic!("expected {:?} rejection, got {:?}", expected, other),
        }
    }
}
