//! Transaction module split into wire types, the container builder and validation

pub mod builder;
pub mod types;
pub mod validation;

pub use builder::{Handle, PtbBuilder};
pub use types::*;
