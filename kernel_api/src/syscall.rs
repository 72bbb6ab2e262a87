//! Typed syscall requests and responses.
//!
//! A register-level caller issues an opcode plus a variadic argument
//! vector; this module is the typed form of that contract. Buffers that
//! the C-style ABI passes as user-space pointers appear here as owned
//! byte vectors, and in/out entry pointers appear as an [`Entry`]
//! argument paired with an `Entry` result.

use core_types::{Entry, ErrorCode, Handle};
use serde::{Deserialize, Serialize};

use crate::Opcode;

/// The value stored into a container slot by `Put`/`Set`.
///
/// Tuples hold handles; tables hold entries. Using the wrong kind for
/// the container fails with `BadType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotValue {
    Handle(Handle),
    Entry(Entry),
}

/// A decoded syscall request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Syscall {
    // General operations
    Nop,
    Clone { handle: Handle },
    Drop { handle: Handle },
    Exit { handle: Handle },
    Type { handle: Handle },

    // Object creation
    CreateNull,
    CreateWord { value: u64 },
    CreateAtom { data: Vec<u8> },
    CreateException { handle: Handle },
    CreateBlob { data: Vec<u8> },
    CreateTuple { len: u64 },
    CreatePage { size: u64 },
    CreateTable { size: u64 },
    CreateLambda { thunk: Handle, index: u64 },
    CreateThunk { registers: Handle, memory: Handle, descriptors: Handle },

    // Object usage
    Read { handle: Handle, offset: u64, len: u64 },
    Write { handle: Handle, offset: u64, data: Vec<u8> },
    Equals { left: Handle, right: Handle },
    Length { handle: Handle },
    Get { container: Handle, index: u64 },
    Take { container: Handle, index: u64 },
    Put { container: Handle, index: u64, value: SlotValue },
    Set { container: Handle, index: u64, value: SlotValue },
    Apply { function: Handle, argument: Handle },
    TableMap { table: Handle, address: u64, entry: Entry },

    // Current address space
    Mmap { address: u64, entry: Entry },
    Mprotect { address: u64, writable: bool },

    // Continuations
    ReturnContinuationLambda,
    PerformEffect { value: Handle },
    Tailcall { thunk: Handle },
    CaptureContinuationThunk,
    CaptureContinuationLambda,

    // Diagnostics
    DebugLog { message: Vec<u8> },
    DebugLogInt { message: Vec<u8>, value: u64 },
    DebugShow { message: Vec<u8>, handle: Handle },
    ErrorReset,
    ErrorAppend { message: Vec<u8> },
    ErrorAppendInt { value: u64 },
    ErrorReturn,
}

impl Syscall {
    /// The opcode this request decodes from.
    pub fn opcode(&self) -> Opcode {
        match self {
            Syscall::Nop => Opcode::Nop,
            Syscall::Clone { .. } => Opcode::Clone,
            Syscall::Drop { .. } => Opcode::Drop,
            Syscall::Exit { .. } => Opcode::Exit,
            Syscall::Type { .. } => Opcode::Type,
            Syscall::CreateNull => Opcode::CreateNull,
            Syscall::CreateWord { .. } => Opcode::CreateWord,
            Syscall::CreateAtom { .. } => Opcode::CreateAtom,
            Syscall::CreateException { .. } => Opcode::CreateException,
            Syscall::CreateBlob { .. } => Opcode::CreateBlob,
            Syscall::CreateTuple { .. } => Opcode::CreateTuple,
            Syscall::CreatePage { .. } => Opcode::CreatePage,
            Syscall::CreateTable { .. } => Opcode::CreateTable,
            Syscall::CreateLambda { .. } => Opcode::CreateLambda,
            Syscall::CreateThunk { .. } => Opcode::CreateThunk,
            Syscall::Read { .. } => Opcode::Read,
            Syscall::Write { .. } => Opcode::Write,
            Syscall::Equals { .. } => Opcode::Equals,
            Syscall::Length { .. } => Opcode::Length,
            Syscall::Get { .. } => Opcode::Get,
            Syscall::Take { .. } => Opcode::Take,
            Syscall::Put { .. } => Opcode::Put,
            Syscall::Set { .. } => Opcode::Set,
            Syscall::Apply { .. } => Opcode::Apply,
            Syscall::TableMap { .. } => Opcode::TableMap,
            Syscall::Mmap { .. } => Opcode::Mmap,
            Syscall::Mprotect { .. } => Opcode::Mprotect,
            Syscall::ReturnContinuationLambda => Opcode::ReturnContinuationLambda,
            Syscall::PerformEffect { .. } => Opcode::PerformEffect,
            Syscall::Tailcall { .. } => Opcode::Tailcall,
            Syscall::CaptureContinuationThunk => Opcode::CaptureContinuationThunk,
            Syscall::CaptureContinuationLambda => Opcode::CaptureContinuationLambda,
            Syscall::DebugLog { .. } => Opcode::DebugLog,
            Syscall::DebugLogInt { .. } => Opcode::DebugLogInt,
            Syscall::DebugShow { .. } => Opcode::DebugShow,
            Syscall::ErrorReset => Opcode::ErrorReset,
            Syscall::ErrorAppend { .. } => Opcode::ErrorAppend,
            Syscall::ErrorAppendInt { .. } => Opcode::ErrorAppendInt,
            Syscall::ErrorReturn => Opcode::ErrorReturn,
        }
    }

    /// Stable name for audit logs.
    pub fn name(&self) -> &'static str {
        self.opcode().name()
    }
}

/// A successful syscall response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyscallResult {
    /// Status-only success.
    Unit,
    /// A (new or aliased) handle.
    Handle(Handle),
    /// A word value read out of a Word object.
    Word(u64),
    /// A datatype tag.
    DataType(core_types::DataType),
    /// A length or byte count.
    Size(u64),
    /// A boolean, e.g. from `Equals`.
    Bool(bool),
    /// Bytes read out of an Atom/Blob/Page.
    Bytes(Vec<u8>),
    /// The previous occupant of a mapped or swapped slot.
    Entry(Entry),
    /// A captured continuation plus the call/cc-style resumption flag.
    Continuation { handle: Handle, continued: bool },
}

/// Collapses a typed result into the scalar signed-64-bit ABI value.
///
/// Errors encode as their negative code. Out-of-band payloads follow
/// the C-style convention: `Bytes` encodes its length (the buffer
/// itself travels through a caller-supplied pointer), `Entry` encodes
/// status 0 (the entry is written back through its in/out pointer), and
/// `Continuation` encodes the handle (the flag goes through its out
/// pointer).
pub fn encode_result(result: &Result<SyscallResult, ErrorCode>) -> i64 {
    match result {
        Err(code) => code.code(),
        Ok(SyscallResult::Unit) => 0,
        Ok(SyscallResult::Handle(handle)) => handle.raw(),
        Ok(SyscallResult::Word(value)) => *value as i64,
        Ok(SyscallResult::DataType(datatype)) => datatype.as_raw() as i64,
        Ok(SyscallResult::Size(size)) => *size as i64,
        Ok(SyscallResult::Bool(flag)) => *flag as i64,
        Ok(SyscallResult::Bytes(bytes)) => bytes.len() as i64,
        Ok(SyscallResult::Entry(_)) => 0,
        Ok(SyscallResult::Continuation { handle, .. }) => handle.raw(),
    }
}
