//! Custom serde helpers.

pub mod duration;
