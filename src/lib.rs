//! Requirement dependency graphs and boolean truth-table test cases.
//!
//! Requirements carry nested boolean dependency expressions. [`compile`]
//! turns them into a plain node and edge list for an external layout engine.
//! [`generate_test_cases`] enumerates every input assignment of a boolean
//! target expression and evaluates a catalog of named expressions against
//! each one.

pub mod domain;
pub use domain::{
    Catalog, Config, Graph, Palette, Requirement, TestSuite, compile, generate_test_cases,
};

/// Loading requirement and catalog files.
pub mod storage;
pub use storage::LoadError;
