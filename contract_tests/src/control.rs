//! Continuation and control contract tests
//!
//! These tests define the stable contract for capture, tailcall,
//! effects, and the terminal exits, exercised end to end through the
//! dispatcher.
