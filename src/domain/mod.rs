//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - curve storage (`Grid`, `CurveTable`, `CurveId`)
//! - selection and classification outputs (`MatchRecord`, `MatchTable`, `Classification`)
//! - run configuration (`MatchConfig`)

pub mod types;

pub use types::*;
