//! Domain models for requirement graphs and boolean test cases.
//!
//! This module contains the requirement records and their dependency
//! expressions, the graph compiler, the boolean statement grammar, the
//! test-case generator, and configuration.

/// Requirement records and dependency expressions.
pub mod requirement;
pub use requirement::{DependencyExpr, Element, Operator, Requirement, RequirementId};

mod palette;
pub use palette::{Palette, UnknownPalette};

/// Compilation of dependency expressions into a graph.
pub mod graph;
pub use graph::{Direction, Graph, GraphEdge, GraphNode, Issue, NodeKind, compile};

/// The boolean statement grammar.
pub mod expression;
pub use expression::{Catalog, CatalogEntry, CatalogExpr};

/// Truth-table test-case generation.
pub mod cases;
pub use cases::{Outcome, TestCase, TestSuite, generate_test_cases};

mod config;
pub use config::Config;
