//! Database models.

pub mod product;

pub use product::*;
