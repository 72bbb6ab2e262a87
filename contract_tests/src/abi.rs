//! Numeric ABI contract tests
//!
//! These tests pin the numbers guests see: opcode assignments, error
//! code values, the result-word encoding, and the register file
//! layout. Any change here is a breaking change for compiled guests.

#[cfg(test)]
mod tests {
    use core_types::{DataType, ErrorCode};
    use kernel_api::{encode_result, Opcode, SyscallResult};
    use sim_kernel::{Registers, CONTINUED_SENTINEL, REGISTER_FILE_BYTES, RET};

    #[test]
    fn test_opcode_assignments_are_stable() {
        let pinned = [
            (Opcode::Nop, 0),
            (Opcode::Clone, 1),
            (Opcode::Drop, 2),
            (Opcode::CreateNull, 5),
            (Opcode::CreateWord, 6),
            (Opcode::Read, 15),
            (Opcode::Write, 16),
            (Opcode::Apply, 23),
            (Opcode::Mmap, 25),
            (Opcode::Tailcall, 29),
            (Opcode::ErrorReturn, 38),
        ];
        for (opcode, raw) in pinned {
            assert_eq!(opcode.as_raw(), raw, "{} moved", opcode.name());
            assert_eq!(Opcode::from_raw(raw), Ok(opcode));
        }
        assert_eq!(Opcode::from_raw(39), Err(ErrorCode::BadSyscall));
    }

    #[test]
    fn test_error_code_values_are_stable() {
        assert_eq!(ErrorCode::BadSyscall.code(), -1);
        assert_eq!(ErrorCode::BadIndex.code(), -2);
        assert_eq!(ErrorCode::BadType.code(), -3);
        assert_eq!(ErrorCode::BadArgument.code(), -4);
        assert_eq!(ErrorCode::OutOfMemory.code(), -5);
        assert_eq!(ErrorCode::Interrupted.code(), -6);
    }

    #[test]
    fn test_errors_encode_negative_and_results_non_negative() {
        for error in [
            ErrorCode::BadSyscall,
            ErrorCode::BadIndex,
            ErrorCode::BadType,
            ErrorCode::BadArgument,
            ErrorCode::OutOfMemory,
            ErrorCode::Interrupted,
        ] {
            assert!(encode_result(&Err(error)) < 0);
        }
        assert_eq!(encode_result(&Ok(SyscallResult::Unit)), 0);
        assert_eq!(encode_result(&Ok(SyscallResult::Bool(true))), 1);
        assert_eq!(encode_result(&Ok(SyscallResult::Size(13))), 13);
        assert_eq!(
            encode_result(&Ok(SyscallResult::DataType(DataType::Word))),
            DataType::Word.as_raw() as i64
        );
    }

    #[test]
    fn test_syscall_wire_shape_is_stable() {
        use core_types::{Entry, EntryMode, Handle};
        use kernel_api::Syscall;

        let call = Syscall::Mmap {
            address: 4096,
            entry: Entry::mapped(EntryMode::ReadWrite, DataType::Page, Handle::from_raw(7)),
        };
        let value = serde_json::to_value(&call).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "Mmap": {
                    "address": 4096,
                    "entry": {
                        "mode": "ReadWrite",
                        "datatype": "Page",
                        "data": 7
                    }
                }
            })
        );
        let back: Syscall = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, call);
    }

    #[test]
    fn test_register_file_layout() {
        let mut registers = Registers::default();
        registers.set(RET, CONTINUED_SENTINEL);
        registers.set(15, u64::MAX);

        let bytes = registers.to_bytes();
        assert_eq!(bytes.len(), REGISTER_FILE_BYTES);
        // Slot 0 is the return register, little-endian.
        assert_eq!(&bytes[..8], &CONTINUED_SENTINEL.to_le_bytes());

        let decoded = Registers::from_bytes(&bytes).expect("round trip");
        assert_eq!(decoded.get(RET), CONTINUED_SENTINEL);
        assert_eq!(decoded.get(15), u64::MAX);

        // Anything but exactly 128 bytes is not a register file.
        assert!(Registers::from_bytes(&bytes[..127]).is_none());
    }
}
