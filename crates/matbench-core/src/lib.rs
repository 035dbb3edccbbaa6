//! matbench Core - matrices, the matrix file format, and reference checks
//!
//! This crate provides the pieces every other matbench crate builds on:
//! - [`Matrix`] and random operand generation
//! - [`codec`] for the headered / headerless text format
//! - [`verify`] for the reference product and the equality policy

pub mod codec;
pub mod error;
pub mod matrix;
pub mod verify;

#[cfg(test)]
mod codec_tests;
#[cfg(test)]
mod matrix_tests;
#[cfg(test)]
mod verify_tests;

pub use codec::{FileConvention, FileRole, HeaderConvention};
pub use error::{MatrixError, Result};
pub use matrix::{generate_operands, Matrix, ValueRange};
pub use verify::{first_mismatch, matrices_equal, reference_product, CompareMode, Mismatch};
