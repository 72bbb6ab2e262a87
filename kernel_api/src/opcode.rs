//! Stable syscall opcode numbering.

use core_types::ErrorCode;
use serde::{Deserialize, Serialize};

/// Syscall opcodes.
///
/// The discriminants are the wire-level syscall numbers; they are
/// append-only and never renumbered. [`Opcode::from_raw`] is the single
/// place an unknown number turns into `BadSyscall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Opcode {
    // general operational syscalls
    Nop = 0,
    Clone = 1,
    Drop = 2,
    Exit = 3,
    Type = 4,

    // object creation
    CreateNull = 5,
    CreateWord = 6,
    CreateAtom = 7,
    CreateException = 8,
    CreateBlob = 9,
    CreateTuple = 10,
    CreatePage = 11,
    CreateTable = 12,
    CreateLambda = 13,
    CreateThunk = 14,

    // object usage
    Read = 15,
    Write = 16,
    Equals = 17,
    Length = 18,
    Get = 19,
    Take = 20,
    Put = 21,
    Set = 22,
    Apply = 23,
    TableMap = 24,

    // current address space
    Mmap = 25,
    Mprotect = 26,

    // continuations
    ReturnContinuationLambda = 27,
    PerformEffect = 28,
    Tailcall = 29,
    CaptureContinuationThunk = 30,
    CaptureContinuationLambda = 31,

    // diagnostics
    DebugLog = 32,
    DebugLogInt = 33,
    DebugShow = 34,
    ErrorReset = 35,
    ErrorAppend = 36,
    ErrorAppendInt = 37,
    ErrorReturn = 38,
}

impl Opcode {
    /// Decodes a raw syscall number.
    pub fn from_raw(raw: u64) -> Result<Self, ErrorCode> {
        use Opcode::*;
        Ok(match raw {
            0 => Nop,
            1 => Clone,
            2 => Drop,
            3 => Exit,
            4 => Type,
            5 => CreateNull,
            6 => CreateWord,
            7 => CreateAtom,
            8 => CreateException,
            9 => CreateBlob,
            10 => CreateTuple,
            11 => CreatePage,
            12 => CreateTable,
            13 => CreateLambda,
            14 => CreateThunk,
            15 => Read,
            16 => Write,
            17 => Equals,
            18 => Length,
            19 => Get,
            20 => Take,
            21 => Put,
            22 => Set,
            23 => Apply,
            24 => TableMap,
            25 => Mmap,
            26 => Mprotect,
            27 => ReturnContinuationLambda,
            28 => PerformEffect,
            29 => Tailcall,
            30 => CaptureContinuationThunk,
            31 => CaptureContinuationLambda,
            32 => DebugLog,
            33 => DebugLogInt,
            34 => DebugShow,
            35 => ErrorReset,
            36 => ErrorAppend,
            37 => ErrorAppendInt,
            38 => ErrorReturn,
            _ => return Err(ErrorCode::BadSyscall),
        })
    }

    /// Returns the raw syscall number.
    pub fn as_raw(self) -> u64 {
        self as u64
    }

    /// Stable name for audit logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Nop => "Nop",
            Opcode::Clone => "Clone",
            Opcode::Drop => "Drop",
            Opcode::Exit => "Exit",
            Opcode::Type => "Type",
            Opcode::CreateNull => "CreateNull",
            Opcode::CreateWord => "CreateWord",
            Opcode::CreateAtom => "CreateAtom",
            Opcode::CreateException => "CreateException",
            Opcode::CreateBlob => "CreateBlob",
            Opcode::CreateTuple => "CreateTuple",
            Opcode::CreatePage => "CreatePage",
            Opcode::CreateTable => "CreateTable",
            Opcode::CreateLambda => "CreateLambda",
            Opcode::CreateThunk => "CreateThunk",
            Opcode::Read => "Read",
            Opcode::Write => "Write",
            Opcode::Equals => "Equals",
            Opcode::Length => "Length",
            Opcode::Get => "Get",
            Opcode::Take => "Take",
            Opcode::Put => "Put",
            Opcode::Set => "Set",
            Opcode::Apply => "Apply",
            Opcode::TableMap => "TableMap",
            Opcode::Mmap => "Mmap",
            Opcode::Mprotect => "Mprotect",
            Opcode::ReturnContinuationLambda => "ReturnContinuationLambda",
            Opcode::PerformEffect => "PerformEffect",
            Opcode::Tailcall => "Tailcall",
            Opcode::CaptureContinuationThunk => "CaptureContinuationThunk",
            Opcode::CaptureContinuationLambda => "CaptureContinuationLambda",
            Opcode::DebugLog => "DebugLog",
            Opcode::DebugLogInt => "DebugLogInt",
            Opcode::DebugShow => "DebugShow",
            Opcode::ErrorReset => "ErrorReset",
            Opcode::ErrorAppend => "ErrorAppend",
            Opcode::ErrorAppendInt => "ErrorAppendInt",
            Opcode::ErrorReturn => "ErrorReturn",
        }
    }
}
