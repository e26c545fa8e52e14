//! Container identifiers and name validators

pub mod ids;
pub mod validate;
