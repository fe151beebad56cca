//! Shared constants and CAIP helpers

pub mod caip;
pub mod constants;
