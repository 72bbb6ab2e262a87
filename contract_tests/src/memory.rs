//! Memory mapping contract tests
//!
//! These tests define the stable contract for the Table-as-page-table
//! address space: atomic install-and-return-previous `MMAP`, strict
//! `TABLE_MAP`, protection flips, and direct guest loads and stores.
