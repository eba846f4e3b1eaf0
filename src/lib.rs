//! Rollcall — client identity validation workflow.
//!
//! Pick one or many customers, hold back the ones missing an identification
//! number until they are fixed, and compose the validation e-mail for the
//! rest.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod messaging;
pub mod roster;
pub mod selection;
pub mod workflow;

pub mod session;
