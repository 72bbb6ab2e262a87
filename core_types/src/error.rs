//! The stable syscall error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that a syscall can report.
///
/// The set is deliberately small and closed: every fallible operation
/// in the kernel maps onto exactly one of these kinds, and the scalar
/// ABI carries them as negative signed values (see [`ErrorCode::code`]).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Unknown syscall opcode.
    #[error("unknown syscall opcode")]
    BadSyscall,

    /// Unknown (or already dropped) handle, or out-of-bounds container index.
    #[error("unknown handle or out-of-bounds index")]
    BadIndex,

    /// Operation applied to an object of the wrong datatype.
    #[error("operation applied to wrong datatype")]
    BadType,

    /// Malformed payload, e.g. an offset + length that overflows the object.
    #[error("malformed argument")]
    BadArgument,

    /// Allocation could not be satisfied.
    #[error("out of memory")]
    OutOfMemory,

    /// The operation did not take effect; the caller may retry.
    #[error("operation interrupted")]
    Interrupted,
}

impl ErrorCode {
    /// The negative scalar ABI encoding of this error.
    pub fn code(self) -> i64 {
        -(match self {
            ErrorCode::BadSyscall => 1,
            ErrorCode::BadIndex => 2,
            ErrorCode::BadType => 3,
            ErrorCode::BadArgument => 4,
            ErrorCode::OutOfMemory => 5,
            ErrorCode::Interrupted => 6,
        })
    }

    /// Decodes a negative scalar ABI value back into an error kind.
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            -1 => ErrorCode::BadSyscall,
            -2 => ErrorCode::BadIndex,
            -3 => ErrorCode::BadType,
            -4 => ErrorCode::BadArgument,
            -5 => ErrorCode::OutOfMemory,
            -6 => ErrorCode::Interrupted,
            _ => return None,
        })
    }
}
