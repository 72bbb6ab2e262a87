//! The syscall dispatcher.
//!
//! The single entry point from callers into the kernel. Decodes a
//! typed request, gates it on the domain's lifecycle state, routes it
//! to the object store, the mapping engine, or the control subsystem,
//! and records every dispatch in the audit log.

use core_types::{ErrorCode, Handle};
use kernel_api::{Syscall, SyscallResult};

use crate::audit::DispatchEvent;
use crate::domain::DomainState;
use crate::Kernel;

/// The result of dispatching one syscall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An ordinary syscall finished and control returns to the caller.
    Completed(Result<SyscallResult, ErrorCode>),
    /// `TAILCALL` replaced the domain's control state; `continued`
    /// reports whether the restored context arrived via a captured
    /// continuation.
    Switched { continued: bool },
    /// `PERFORM_EFFECT` suspended the domain; the payload tuple holds
    /// the effect value and the resume lambda.
    Effect { payload: Handle },
    /// Terminal exit carrying a result handle.
    Exit(Handle),
    /// Terminal unwind carrying the accumulated diagnostic message.
    ErrorReturn(String),
}

/// Whether a request needs a live current context to act on.
///
/// While the domain is suspended these are rejected: there is no
/// running context to capture or exit. Object-model syscalls stay
/// available so the enclosing handler can inspect the effect payload,
/// and `TAILCALL`/`APPLY` resume.
fn needs_running_context(syscall: &Syscall) -> bool {
    matches!(
        syscall,
        Syscall::CaptureContinuationThunk
            | Syscall::CaptureContinuationLambda
            | Syscall::PerformEffect { .. }
            | Syscall::ReturnContinuationLambda
            | Syscall::Exit { .. }
            | Syscall::ErrorReturn
    )
}

impl Kernel {
    /// Dispatches one syscall against this kernel.
    pub fn dispatch(&mut self, syscall: Syscall) -> Outcome {
        let opcode = syscall.name();

        let rejected_by_state = match self.domain.state {
            DomainState::Terminated => true,
            DomainState::Suspended => needs_running_context(&syscall),
            DomainState::Fresh | DomainState::Running => false,
        };
        if rejected_by_state {
            self.audit.record(DispatchEvent::Rejected {
                opcode,
                error: ErrorCode::Interrupted,
            });
            return Outcome::Completed(Err(ErrorCode::Interrupted));
        }

        self.audit.record(DispatchEvent::Invoked { opcode });
        let outcome = self.dispatch_inner(syscall);

        match &outcome {
            Outcome::Completed(Err(error)) => self.audit.record(DispatchEvent::Rejected {
                opcode,
                error: *error,
            }),
            _ => {
                self.audit.record(DispatchEvent::Completed { opcode });
                if self.domain.state == DomainState::Fresh {
                    self.domain.state = DomainState::Running;
                }
            }
        }
        outcome
    }

    fn dispatch_inner(&mut self, syscall: Syscall) -> Outcome {
        use SyscallResult as R;

        let completed = match syscall {
            Syscall::Nop => Ok(R::Unit),
            Syscall::Clone { handle } => self.objects.clone_handle(handle).map(R::Handle),
            Syscall::Drop { handle } => self.objects.release(handle).map(|()| R::Unit),
            Syscall::Exit { handle } => {
                return match self.exit(handle) {
                    Ok(value) => Outcome::Exit(value),
                    Err(error) => Outcome::Completed(Err(error)),
                }
            }
            Syscall::Type { handle } => self.type_of(handle).map(R::DataType),

            Syscall::CreateNull => self.create_null().map(R::Handle),
            Syscall::CreateWord { value } => self.create_word(value).map(R::Handle),
            Syscall::CreateAtom { data } => self.create_atom(data).map(R::Handle),
            Syscall::CreateException { handle } => self.create_exception(handle).map(R::Handle),
            Syscall::CreateBlob { data } => self.create_blob(data).map(R::Handle),
            Syscall::CreateTuple { len } => self.create_tuple(len).map(R::Handle),
            Syscall::CreatePage { size } => self.create_page(size).map(R::Handle),
            Syscall::CreateTable { size } => self.create_table(size).map(R::Handle),
            Syscall::CreateLambda { thunk, index } => {
                self.create_lambda(thunk, index).map(R::Handle)
            }
            Syscall::CreateThunk {
                registers,
                memory,
                descriptors,
            } => self.create_thunk(registers, memory, descriptors).map(R::Handle),

            Syscall::Read { handle, offset, len } => self.read(handle, offset, len),
            Syscall::Write {
                handle,
                offset,
                data,
            } => self.write(handle, offset, &data).map(|()| R::Unit),
            Syscall::Equals { left, right } => self.equals(left, right).map(R::Bool),
            Syscall::Length { handle } => self.length(handle).map(R::Size),
            Syscall::Get { container, index } => self.get(container, index),
            Syscall::Take { container, index } => self.take(container, index),
            Syscall::Put {
                container,
                index,
                value,
            } => self.put(container, index, value),
            Syscall::Set {
                container,
                index,
                value,
            } => self.set(container, index, value).map(|()| R::Unit),
            Syscall::Apply { function, argument } => {
                self.apply(function, argument).map(R::Handle)
            }
            Syscall::TableMap {
                table,
                address,
                entry,
            } => self.table_map(table, address, entry).map(R::Entry),

            Syscall::Mmap { address, entry } => self.mmap(address, entry).map(R::Entry),
            Syscall::Mprotect { address, writable } => {
                self.mprotect(address, writable).map(|()| R::Unit)
            }

            Syscall::ReturnContinuationLambda => {
                return match self.return_continuation_lambda() {
                    Ok(lambda) => Outcome::Exit(lambda),
                    Err(error) => Outcome::Completed(Err(error)),
                }
            }
            Syscall::PerformEffect { value } => {
                return match self.perform_effect(value) {
                    Ok(payload) => Outcome::Effect { payload },
                    Err(error) => Outcome::Completed(Err(error)),
                }
            }
            Syscall::Tailcall { thunk } => {
                return match self.tailcall(thunk) {
                    Ok(continued) => Outcome::Switched { continued },
                    Err(error) => Outcome::Completed(Err(error)),
                }
            }
            Syscall::CaptureContinuationThunk => self
                .capture_continuation_thunk()
                .map(|(handle, continued)| R::Continuation { handle, continued }),
            Syscall::CaptureContinuationLambda => self
                .capture_continuation_lambda()
                .map(|(handle, continued)| R::Continuation { handle, continued }),

            Syscall::DebugLog { message } => {
                log::debug!("guest: {}", String::from_utf8_lossy(&message));
                Ok(R::Unit)
            }
            Syscall::DebugLogInt { message, value } => {
                log::debug!("guest: {} {}", String::from_utf8_lossy(&message), value);
                Ok(R::Unit)
            }
            Syscall::DebugShow { message, handle } => match self.describe(handle) {
                Ok(summary) => {
                    log::debug!(
                        "guest: {} {}",
                        String::from_utf8_lossy(&message),
                        summary
                    );
                    Ok(R::Unit)
                }
                Err(error) => Err(error),
            },
            Syscall::ErrorReset => {
                self.error_reset();
                Ok(R::Unit)
            }
            Syscall::ErrorAppend { message } => {
                self.error_append(&message);
                Ok(R::Unit)
            }
            Syscall::ErrorAppendInt { value } => {
                self.error_append_int(value);
                Ok(R::Unit)
            }
            Syscall::ErrorReturn => return Outcome::ErrorReturn(self.error_return()),
        };
        Outcome::Completed(completed)
    }

    /// One-line human-readable summary of an object, for `DEBUG_SHOW`.
    fn describe(&self, handle: Handle) -> Result<String, ErrorCode> {
        let object = self.objects.get(handle)?;
        let datatype = object.datatype();
        let detail = self.length(handle).map(|len| len.to_string());
        Ok(match detail {
            Ok(len) => format!("{} {} (len {})", handle, datatype, len),
            Err(_) => format!("{} {}", handle, datatype),
        })
    }
}
