//! Handle lifecycle contract tests
//!
//! These tests define the stable contract for handle allocation,
//! reference counting, and ownership transfer.

#[cfg(test)]
mod tests {
    use crate::test_helpers::*;
    use core_types::{ErrorCode, Handle};
    use kernel_api::{SlotValue, Syscall, SyscallResult};
    use sim_kernel::{Kernel, Outcome};

    #[test]
    fn test_clone_then_drop_is_neutral() {
        let mut kernel = Kernel::new();
        let word = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 42 });
        let live = kernel.objects().len();

        let clone = dispatch_handle(&mut kernel, Syscall::Clone { handle: word });
        assert_eq!(clone, word, "clone returns the same handle");
        dispatch_unit(&mut kernel, Syscall::Drop { handle: clone });

        assert_eq!(kernel.objects().len(), live);
        assert!(matches!(
            kernel.dispatch(Syscall::Read {
                handle: word,
                offset: 0,
                len: 8
            }),
            Outcome::Completed(Ok(SyscallResult::Word(42)))
        ));
    }

    #[test]
    fn test_dropped_handle_is_gone() {
        let mut kernel = Kernel::new();
        let word = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 1 });
        dispatch_unit(&mut kernel, Syscall::Drop { handle: word });

        dispatch_err(&mut kernel, Syscall::Drop { handle: word }, ErrorCode::BadIndex);
        dispatch_err(
            &mut kernel,
            Syscall::Type { handle: word },
            ErrorCode::BadIndex,
        );
    }

    #[test]
    fn test_handles_are_never_reused() {
        let mut kernel = Kernel::new();
        let first = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 1 });
        dispatch_unit(&mut kernel, Syscall::Drop { handle: first });

        let second = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 2 });
        assert_ne!(first, second);
        dispatch_err(
            &mut kernel,
            Syscall::Type { handle: first },
            ErrorCode::BadIndex,
        );
    }

    #[test]
    fn test_unknown_handle_rejects_with_bad_index() {
        let mut kernel = Kernel::new();
        let bogus = Handle::from_raw(0x7fff_0000);
        dispatch_err(&mut kernel, Syscall::Clone { handle: bogus }, ErrorCode::BadIndex);
        dispatch_err(&mut kernel, Syscall::Length { handle: bogus }, ErrorCode::BadIndex);
    }

    #[test]
    fn test_object_quota_surfaces_out_of_memory() {
        // The bootstrap table and descriptor tuple already occupy two
        // slots.
        let mut kernel = Kernel::new().with_object_quota(3);
        dispatch_handle(&mut kernel, Syscall::CreateWord { value: 1 });

        match kernel.dispatch(Syscall::CreateWord { value: 2 }) {
            Outcome::Completed(Err(ErrorCode::OutOfMemory)) => {}
            other => panic!("expected quota rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_dropping_a_tuple_releases_sole_elements() {
        let mut kernel = Kernel::new();
        let live = kernel.objects().len();

        let element = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 9 });
        let tuple = dispatch_handle(&mut kernel, Syscall::CreateTuple { len: 4 });
        dispatch_unit(
            &mut kernel,
            Syscall::Set {
                container: tuple,
                index: 0,
                value: SlotValue::Handle(element),
            },
        );

        dispatch_unit(&mut kernel, Syscall::Drop { handle: tuple });
        assert_eq!(kernel.objects().len(), live);
    }

    #[test]
    fn test_shared_element_survives_container_drop() {
        let mut kernel = Kernel::new();
        let element = dispatch_handle(&mut kernel, Syscall::CreateWord { value: 9 });
        dispatch_handle(&mut kernel, Syscall::Clone { handle: element });

        let tuple = dispatch_handle(&mut kernel, Syscall::CreateTuple { len: 1 });
        dispatch_unit(
            &mut kernel,
            Syscall::Set {
                container: tuple,
                index: 0,
                value: SlotValue::Handle(element),
            },
        );
        dispatch_unit(&mut kernel, Syscall::Drop { handle: tuple });

        assert!(matches!(
            kernel.dispatch(Syscall::Read {
                handle: element,
                offset: 0,
                len: 8
            }),
            Outcome::Completed(Ok(SyscallResult::Word(9)))
        ));
    }
}
