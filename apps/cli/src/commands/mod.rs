//! Command implementations for the imgprep CLI.

pub mod inspect;
pub mod prep;
