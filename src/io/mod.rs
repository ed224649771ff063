//! Input/output helpers.
//!
//! - CSV ingest for curve tables and query points (`ingest`)
//! - classification result export (`export`)
//! - match table JSON read/write (`mapping`)

pub mod export;
pub mod ingest;
pub mod mapping;

pub use export::*;
pub use ingest::*;
pub use mapping::*;
