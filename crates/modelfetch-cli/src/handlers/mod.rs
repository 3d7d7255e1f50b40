//! Command handlers.

pub mod folders;
pub mod serve;
