//! The parts of the LAS format the validator needs.

pub mod file;
pub mod header;
pub mod offsets;
pub mod point;
