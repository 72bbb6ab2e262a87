//! # Kernel API
//!
//! The syscall surface of the Tessera object kernel.
//!
//! This crate is the ONLY interface between untrusted callers and the
//! kernel: a stable opcode numbering ([`Opcode`]), a typed request enum
//! ([`Syscall`]), a typed response enum ([`SyscallResult`]) and the
//! scalar signed-64-bit encoding used by register-level ABIs
//! ([`encode_result`]). All of it is plain serde-serializable data so a
//! transport shim can marshal requests without linking the kernel.

pub mod opcode;
pub mod syscall;

pub use opcode::Opcode;
pub use syscall::{encode_result, SlotValue, Syscall, SyscallResult};
