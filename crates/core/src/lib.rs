//! Domain types for the site generation orchestration core.
//!
//! This crate is pure logic: the job status state machine, generation
//! option validation, the error taxonomy, and webhook event kind
//! constants. It performs no I/O and holds no state.

pub mod error;
pub mod event_kinds;
pub mod options;
pub mod status;
pub mod types;
