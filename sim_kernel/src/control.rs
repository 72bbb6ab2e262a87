//! The continuation/control subsystem.
//!
//! Replaces a call stack with explicit, storable continuation objects:
//! the current domain can be snapshotted into a Thunk, resumed with
//! `TAILCALL`, parked by `PERFORM_EFFECT`, or exited terminally. A
//! snapshot is an independent deep copy of the address space plus the
//! serialized register file, with the return register preset so a
//! resumed context can tell it arrived via the continuation.

use core_types::{ErrorCode, Handle};

use crate::domain::{DomainState, Registers, CONTINUED_SENTINEL, RET};
use crate::object::{Lambda, Object, Thunk};
use crate::Kernel;

impl Kernel {
    /// Snapshots the current domain into a thunk whose resumption will
    /// observe `ret` in the return register.
    fn snapshot_thunk(&mut self, ret: u64) -> Result<Handle, ErrorCode> {
        let memory = self.deep_copy_memory(self.domain.memory)?;
        let descriptors = self.shallow_copy_tuple(self.domain.descriptors)?;
        let mut registers = self.domain.registers;
        registers.set(RET, ret);
        let registers = self
            .objects
            .alloc(Object::Blob(registers.to_bytes().to_vec().into()))?;
        self.objects.alloc(Object::Thunk(Thunk {
            registers,
            memory,
            descriptors,
        }))
    }

    /// call/cc-style capture: returns a thunk handle plus
    /// `continued = false`. Tailcalling the thunk re-enters this
    /// capture site with `continued = true`.
    pub fn capture_continuation_thunk(&mut self) -> Result<(Handle, bool), ErrorCode> {
        let thunk = self.snapshot_thunk(CONTINUED_SENTINEL)?;
        Ok((thunk, false))
    }

    /// Like [`Kernel::capture_continuation_thunk`] but wraps the
    /// snapshot in a lambda binding applied arguments at descriptor 0.
    pub fn capture_continuation_lambda(&mut self) -> Result<(Handle, bool), ErrorCode> {
        let thunk = self.snapshot_thunk(CONTINUED_SENTINEL)?;
        let lambda = self
            .objects
            .alloc(Object::Lambda(Lambda::Continuation { thunk, index: 0 }))?;
        Ok((lambda, false))
    }

    /// Replaces the domain's entire control state with the thunk's and
    /// consumes the thunk reference. Never returns a value to the
    /// calling context; the result is whether the restored context
    /// arrived via a captured continuation.
    ///
    /// Resumption is single-shot per reference: tailcalling the same
    /// handle twice fails with `BadIndex` because the first call
    /// consumed it. Multi-shot resumption is spelled `CLONE` +
    /// `TAILCALL`, once per clone.
    pub fn tailcall(&mut self, handle: Handle) -> Result<bool, ErrorCode> {
        let parts = match self.objects.get(handle)? {
            Object::Thunk(parts) => *parts,
            _ => return Err(ErrorCode::BadType),
        };
        let registers = match self.objects.get(parts.registers)? {
            Object::Blob(bytes) => Registers::from_bytes(bytes).ok_or(ErrorCode::BadArgument)?,
            _ => return Err(ErrorCode::BadType),
        };

        let (memory, descriptors) = if self.objects.refs(handle) == Some(1) {
            // Sole reference: adopt the components wholesale.
            let adopted = self.objects.take_sole(handle).ok_or(ErrorCode::BadIndex)?;
            let Object::Thunk(adopted) = adopted else {
                return Err(ErrorCode::BadType);
            };
            self.objects.release(adopted.registers)?;
            (adopted.memory, adopted.descriptors)
        } else {
            // Shared thunk: resume an independent copy so the other
            // references still see the captured state.
            let memory = self.deep_copy_memory(parts.memory)?;
            let descriptors = self.shallow_copy_tuple(parts.descriptors)?;
            self.objects.release(handle)?;
            (memory, descriptors)
        };

        let old_memory = std::mem::replace(&mut self.domain.memory, memory);
        let old_descriptors = std::mem::replace(&mut self.domain.descriptors, descriptors);
        self.objects.release(old_memory)?;
        self.objects.release(old_descriptors)?;
        self.domain.registers = registers;
        self.domain.state = DomainState::Running;
        Ok(registers.get(RET) == CONTINUED_SENTINEL)
    }

    /// Suspends the domain, packaging `Tuple[value, resume-lambda]` for
    /// the enclosing handler. The suspended state is owned by the
    /// resume lambda; dropping the tuple releases it without resuming.
    pub fn perform_effect(&mut self, value: Handle) -> Result<Handle, ErrorCode> {
        if !self.objects.contains(value) {
            return Err(ErrorCode::BadIndex);
        }
        let thunk = self.snapshot_thunk(0)?;
        let lambda = self
            .objects
            .alloc(Object::Lambda(Lambda::Continuation { thunk, index: 0 }))?;
        let payload = self
            .objects
            .alloc(Object::Tuple(vec![Some(value), Some(lambda)]))?;
        self.domain.state = DomainState::Suspended;
        Ok(payload)
    }

    /// Exits the domain yielding a lambda that resumes the current
    /// context (with a zero return register).
    pub fn return_continuation_lambda(&mut self) -> Result<Handle, ErrorCode> {
        let thunk = self.snapshot_thunk(0)?;
        let lambda = self
            .objects
            .alloc(Object::Lambda(Lambda::Continuation { thunk, index: 0 }))?;
        self.domain.state = DomainState::Terminated;
        Ok(lambda)
    }

    /// Terminal exit carrying a result handle to the host.
    pub fn exit(&mut self, value: Handle) -> Result<Handle, ErrorCode> {
        if !self.objects.contains(value) {
            return Err(ErrorCode::BadIndex);
        }
        self.domain.state = DomainState::Terminated;
        Ok(value)
    }

    pub fn error_reset(&mut self) {
        self.domain.error_buffer.clear();
    }

    pub fn error_append(&mut self, message: &[u8]) {
        self.domain
            .error_buffer
            .push_str(&String::from_utf8_lossy(message));
    }

    pub fn error_append_int(&mut self, value: u64) {
        self.domain.error_buffer.push_str(&value.to_string());
    }

    /// Terminal unwind carrying the accumulated diagnostic message.
    pub fn error_return(&mut self) -> String {
        self.domain.state = DomainState::Terminated;
        self.domain.error_buffer.clone()
    }
}
