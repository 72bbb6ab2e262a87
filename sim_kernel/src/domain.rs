//! Execution-domain state: register file, address space, descriptors.

use core_types::Handle;

/// Number of slots in the abstract register file.
pub const REGISTER_COUNT: usize = 16;

/// Serialized size of the register file in bytes.
pub const REGISTER_FILE_BYTES: usize = REGISTER_COUNT * 8;

/// Register slot that carries the syscall return value.
pub const RET: usize = 0;

/// Value preset into `RET` when a continuation is captured, so that a
/// resumed context observes that it arrived via the continuation.
pub const CONTINUED_SENTINEL: u64 = 1;

/// Number of descriptor slots a fresh domain starts with.
pub const DESCRIPTOR_SLOTS: usize = 16;

/// The abstract 16-slot register file of an execution domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers([u64; REGISTER_COUNT]);

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> u64 {
        self.0[slot]
    }

    pub fn set(&mut self, slot: usize, value: u64) {
        self.0[slot] = value;
    }

    /// Serializes the register file little-endian, slot 0 first.
    pub fn to_bytes(&self) -> [u8; REGISTER_FILE_BYTES] {
        let mut bytes = [0u8; REGISTER_FILE_BYTES];
        for (slot, value) in self.0.iter().enumerate() {
            bytes[slot * 8..slot * 8 + 8].copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Deserializes a register file; `None` unless `bytes` is exactly
    /// [`REGISTER_FILE_BYTES`] long.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != REGISTER_FILE_BYTES {
            return None;
        }
        let mut registers = [0u64; REGISTER_COUNT];
        for (slot, register) in registers.iter_mut().enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[slot * 8..slot * 8 + 8]);
            *register = u64::from_le_bytes(word);
        }
        Some(Self(registers))
    }
}

/// Lifecycle of an execution domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainState {
    /// Created, nothing dispatched yet.
    Fresh,
    /// Dispatching syscalls.
    Running,
    /// Parked by `PERFORM_EFFECT`; resumable through the packaged lambda.
    Suspended,
    /// Exited or error-returned; rejects all further dispatch.
    Terminated,
}

/// The current execution context of a kernel instance.
///
/// One domain per kernel; continuation capture snapshots this state
/// into Thunk objects and `TAILCALL` swaps it back in.
#[derive(Debug)]
pub struct Domain {
    pub(crate) registers: Registers,
    /// Root page table of the active address space.
    pub(crate) memory: Handle,
    /// Descriptor tuple; `APPLY` binds arguments into captured copies of it.
    pub(crate) descriptors: Handle,
    pub(crate) error_buffer: String,
    pub(crate) state: DomainState,
}

impl Domain {
    pub(crate) fn new(memory: Handle, descriptors: Handle) -> Self {
        Self {
            registers: Registers::new(),
            memory,
            descriptors,
            error_buffer: String::new(),
            state: DomainState::Fresh,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn register(&self, slot: usize) -> u64 {
        self.registers.get(slot)
    }

    /// Handle of the active address-space root table.
    pub fn memory_root(&self) -> Handle {
        self.memory
    }

    pub fn descriptors(&self) -> Handle {
        self.descriptors
    }

    pub fn state(&self) -> DomainState {
        self.state
    }

    /// The accumulated diagnostic message.
    pub fn error_buffer(&self) -> &str {
        &self.error_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_file_round_trip() {
        let mut registers = Registers::new();
        registers.set(0, u64::MAX);
        registers.set(7, 0xdead_beef);
        registers.set(15, 1);

        let bytes = registers.to_bytes();
        assert_eq!(bytes.len(), REGISTER_FILE_BYTES);
        assert_eq!(Registers::from_bytes(&bytes), Some(registers));
    }

    #[test]
    fn test_register_file_rejects_wrong_length() {
        assert!(Registers::from_bytes(&[0u8; 127]).is_none());
        assert!(Registers::from_bytes(&[0u8; 129]).is_none());
        assert!(Registers::from_bytes(&[]).is_none());
    }

    #[test]
    fn test_serialization_is_little_endian_slot_order() {
        let mut registers = Registers::new();
        registers.set(1, 0x0102_0304_0506_0708);
        let bytes = registers.to_bytes();
        assert_eq!(&bytes[8..16], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }
}
