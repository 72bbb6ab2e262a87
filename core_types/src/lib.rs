//! # Core Types
//!
//! This crate defines the fundamental ABI-level types of the Tessera
//! object model.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: every kernel object is reached through
//!   an opaque, unforgeable handle; there is no ambient authority.
//! - **Closed taxonomy**: the set of datatypes and the set of error
//!   kinds are small, enumerated, and stable.
//! - **Testable**: everything here is plain data that works under
//!   `cargo test` and round-trips through serde.
//!
//! ## Key Types
//!
//! - [`Handle`]: an opaque capability reference to a kernel object
//! - [`DataType`]: the tag of the kernel object tagged union
//! - [`Entry`]: a page-table slot (mode + backing handle)
//! - [`ErrorCode`]: the stable syscall error taxonomy

pub mod datatype;
pub mod entry;
pub mod error;
pub mod handle;
pub mod layout;

pub use datatype::DataType;
pub use entry::{Entry, EntryMode};
pub use error::ErrorCode;
pub use handle::Handle;
pub use layout::{pages_for, table_span_for, PAGE_SIZE, TABLE_SLOTS};
