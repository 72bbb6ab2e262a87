//! Object store contract tests
//!
//! These tests define the stable contract for typed object creation,
//! access, and container semantics.

#[cfg(test)]
mod tests {
    use crate::test_helpers::*;
    use core_types::{DataType, ErrorCode};
    use kernel_api::{SlotValue, Syscall, SyscallResult};
    use sim_kernel::{Kernel, Outcome};

    #[test]
    fn test_word_round_trip_at_extremes() {
        let mut kernel = Kernel::new();
        for value in [0, 1, u64::MAX] {
            let word = dispatch_handle(&mut kernel, Syscall::CreateWord { value });
            match kernel.dispatch(Syscall::Read {
                handle: word,
                offset: 0,
                len: 8,
            }) {
                Outcome::Completed(Ok(SyscallResult::Word(read))) => assert_eq!(read, value),
                other => panic!("expected word read, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_blob_write_then_read() {
        let mut kernel = Kernel::new();
        let blob = dispatch_handle(
            &mut kernel,
            Syscall::CreateBlob {
                data: vec![0u8; 16],
            },
        );
        dispatch_unit(
            &mut kernel,
            Syscall::Write {
                handle: blob,
                offset: 4,
                data: b"abcd".to_vec(),
            },
        );

        let bytes = dispatch_bytes(
            &mut kernel,
            Syscall::Read {
                handle: blob,
                offset: 3,
                len: 6,
            },
        );
        assert_eq!(bytes, b"\0abcd\0");
    }

    #[test]
    fn test_out_of_bounds_access_rejects_bad_argument() {
        let mut kernel = Kernel::new();
        let blob = dispatch_handle(&mut kernel, Syscall::CreateBlob { data: vec![0u8; 8] });

        dispatch_err(
            &mut kernel,
            Syscall::Write {
                handle: blob,
                offset: 5,
                data: vec![0u8; 4],
            },
            ErrorCode::BadArgument,
        );
        dispatch_err(
            &mut kernel,
            Syscall::Read {
                handle: blob,
                offset: u64::MAX,
                len: 1,
            },
            ErrorCode::BadArgument,
        );
    }

    #[test]
    fn test_atoms_are_immutable() {
        let mut kernel = Kernel::new();
        let atom = dispatch_handle(
            &mut kernel,
            Syscall::CreateAtom {
                data: b"symbol".to_vec(),
            },
        );
        dispatch_err(
            &mut kernel,
            Syscall::Write {
                handle: atom,
                offset: 0,
                data: b"x".to_vec(),
            },
            ErrorCode::BadType,
        );
        assert_eq!(
            dispatch_bytes(
                &mut kernel,
                Syscall::Read {
                    handle: atom,
                    offset: 0,
                    len: 6
                }
            ),
            b"symbol"
        );
    }

    #[test]
    fn test_type_reports_every_datatype() {
        let mut kernel = Kernel::new();
        let cases = [
            (Syscall::CreateNull, DataType::Null),
            (Syscall::CreateWord { value: 1 }, DataType::Word),
            (Syscall::CreateAtom { data: vec![1] }, DataType::Atom),
            (Syscall::CreateBlob { data: vec![1] }, DataType::Blob),
            (Syscall::CreateTuple { len: 1 }, DataType::Tuple),
            (Syscall::CreatePage { size: 1 }, DataType::Page),
            (Syscall::CreateTable { size: 4096 }, DataType::Table),
        ];
        for (create, expected) in cases {
            let handle = dispatch_handle(&mut kernel, create);
            match kernel.dispatch(Syscall::Type { handle }) {
                Outcome::Completed(Ok(SyscallResult::DataType(datatype))) => {
                    assert_eq!(datatype, expected)
                }
                other => panic!("expected datatype, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_tuple_set_then_get() {
        let mut kernel = Kernel::new();
        let tuple = dispatch_handle(&mut kernel, Syscall::CreateTuple { len: 3 });
        let word = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 7 });
        dispatch_unit(
            &mut kernel,
            Syscall::Set {
                container: tuple,
                index: 2,
                value: SlotValue::Handle(word),
            },
        );

        let got = dispatch_handle(
            &mut kernel,
            Syscall::Get {
                container: tuple,
                index: 2,
            },
        );
        assert_eq!(got, word);
        assert_eq!(kernel.objects().refs(word), Some(2));
    }

    #[test]
    fn test_get_after_take_yields_fresh_null() {
        let mut kernel = Kernel::new();
        let tuple = dispatch_handle(&mut kernel, Syscall::CreateTuple { len: 1 });
        let word = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 7 });
        dispatch_unit(
            &mut kernel,
            Syscall::Set {
                container: tuple,
                index: 0,
                value: SlotValue::Handle(word),
            },
        );

        let taken = dispatch_handle(
            &mut kernel,
            Syscall::Take {
                container: tuple,
                index: 0,
            },
        );
        assert_eq!(taken, word);

        let fresh = dispatch_handle(
            &mut kernel,
            Syscall::Get {
                container: tuple,
                index: 0,
            },
        );
        assert_ne!(fresh, word);
        match kernel.dispatch(Syscall::Type { handle: fresh }) {
            Outcome::Completed(Ok(SyscallResult::DataType(DataType::Null))) => {}
            other => panic!("expected null placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_put_returns_previous_occupant() {
        let mut kernel = Kernel::new();
        let tuple = dispatch_handle(&mut kernel, Syscall::CreateTuple { len: 1 });
        let first = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 1 });
        let second = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 2 });

        dispatch_unit(
            &mut kernel,
            Syscall::Set {
                container: tuple,
                index: 0,
                value: SlotValue::Handle(first),
            },
        );
        let previous = dispatch_handle(
            &mut kernel,
            Syscall::Put {
                container: tuple,
                index: 0,
                value: SlotValue::Handle(second),
            },
        );
        assert_eq!(previous, first);
        // The caller now owns the displaced occupant.
        assert!(matches!(
            kernel.dispatch(Syscall::Read {
                handle: previous,
                offset: 0,
                len: 8
            }),
            Outcome::Completed(Ok(SyscallResult::Word(1)))
        ));
    }

    #[test]
    fn test_tuple_index_out_of_range_rejects_bad_index() {
        let mut kernel = Kernel::new();
        let tuple = dispatch_handle(&mut kernel, Syscall::CreateTuple { len: 2 });
        dispatch_err(
            &mut kernel,
            Syscall::Get {
                container: tuple,
                index: 2,
            },
            ErrorCode::BadIndex,
        );
    }

    #[test]
    fn test_container_kind_mismatch_rejects_bad_type() {
        let mut kernel = Kernel::new();
        let word = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 1 });
        dispatch_err(
            &mut kernel,
            Syscall::Get {
                container: word,
                index: 0,
            },
            ErrorCode::BadType,
        );
    }

    #[test]
    fn test_equals_is_structural_for_scalars() {
        let mut kernel = Kernel::new();
        let a = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 5 });
        let b = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 5 });
        let c = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 6 });

        match kernel.dispatch(Syscall::Equals { left: a, right: b }) {
            Outcome::Completed(Ok(SyscallResult::Bool(true))) => {}
            other => panic!("expected equal words, got {:?}", other),
        }
        match kernel.dispatch(Syscall::Equals { left: a, right: c }) {
            Outcome::Completed(Ok(SyscallResult::Bool(false))) => {}
            other => panic!("expected unequal words, got {:?}", other),
        }
    }

    #[test]
    fn test_length_per_datatype() {
        let mut kernel = Kernel::new();
        let cases: [(Syscall, u64); 5] = [
            (Syscall::CreateNull, 0),
            (Syscall::CreateWord { value: 1 }, 8),
            (Syscall::CreateBlob { data: vec![0; 13] }, 13),
            (Syscall::CreateTuple { len: 4 }, 4),
            (Syscall::CreatePage { size: 5000 }, 8192),
        ];
        for (create, expected) in cases {
            let handle = dispatch_handle(&mut kernel, create);
            match kernel.dispatch(Syscall::Length { handle }) {
                Outcome::Completed(Ok(SyscallResult::Size(len))) => assert_eq!(len, expected),
                other => panic!("expected size, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_exception_wraps_and_reads_back_its_cause() {
        let mut kernel = Kernel::new();
        let cause = dispatch_handle(
            &mut kernel,
            Syscall::CreateAtom {
                data: b"overflow".to_vec(),
            },
        );
        let exception = dispatch_handle(&mut kernel, Syscall::CreateException { handle: cause });

        let unwrapped = dispatch_handle(
            &mut kernel,
            Syscall::Read {
                handle: exception,
                offset: 0,
                len: 0,
            },
        );
        assert_eq!(unwrapped, cause);
        assert_eq!(
            dispatch_bytes(
                &mut kernel,
                Syscall::Read {
                    handle: unwrapped,
                    offset: 0,
                    len: 8
                }
            ),
            b"overflow"
        );
    }
}
