//! Cancels in-progress GitHub Actions runs of a branch that were superseded
//! by the commit currently being built.

pub mod application;
pub mod domain;
pub mod infrastructures;
