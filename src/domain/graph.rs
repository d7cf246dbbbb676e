//! Compilation of requirement dependency expressions into a directed graph.
//!
//! Every requirement becomes a node. Every nested sub-expression becomes a
//! synthesised *intermediate* node (`I1`, `I2`, ...) standing for the operator
//! junction, so the whole graph can be handed to an external layout and
//! rendering component as plain nodes and edges. Edges point from a
//! dependency towards the node that depends on it.
//!
//! Operator tokens are positional: a token labels every later sibling in the
//! same list until another token supersedes it. Siblings that come before the
//! first token carry no label at all.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    str::FromStr,
};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::domain::{
    Palette,
    requirement::{DependencyExpr, Element, Operator, Requirement},
};

/// Whether a node stands for a requirement or a synthesised junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A node for an input requirement.
    Requirement,
    /// A node synthesised for a nested sub-expression.
    Intermediate,
}

/// A node in the compiled graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Unique across requirement and intermediate nodes.
    pub id: String,
    /// Requirement text, or the node's own id for intermediate nodes.
    pub label: String,
    /// What the node stands for.
    pub kind: NodeKind,
    /// The requirement priority. Always `None` for intermediate nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Background colour from the palette.
    ///
    /// `None` on a requirement node marks a priority with no palette entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl GraphNode {
    fn requirement(requirement: &Requirement, palette: Palette) -> Self {
        let priority = requirement.priority();
        Self {
            id: requirement.id().to_string(),
            label: requirement.text().to_string(),
            kind: NodeKind::Requirement,
            priority: Some(priority),
            background: palette.shade(priority).map(str::to_string),
        }
    }

    fn intermediate(id: String) -> Self {
        Self {
            label: id.clone(),
            id,
            kind: NodeKind::Intermediate,
            priority: None,
            background: None,
        }
    }
}

/// A directed edge from a dependency (`source`) to its dependent (`target`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// `"{source}-{target}"`. Not unique when a pair is linked twice.
    pub id: String,
    /// The dependency.
    pub source: String,
    /// The node that depends on `source`.
    pub target: String,
    /// The operator in effect when the edge was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Operator>,
}

impl GraphEdge {
    fn new(source: &str, target: &str, label: Option<Operator>) -> Self {
        Self {
            id: format!("{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
            label,
        }
    }
}

/// The compiled dependency graph.
///
/// Requirement nodes come first in input order, followed by intermediate
/// nodes in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Tracks the operator token in effect while walking one expression list.
#[derive(Debug, Default, Clone, Copy)]
struct OperatorScope {
    current: Option<Operator>,
}

impl OperatorScope {
    const fn supersede(&mut self, operator: Operator) {
        self.current = Some(operator);
    }

    const fn current(self) -> Option<Operator> {
        self.current
    }
}

/// Allocates intermediate node ids for a single compilation.
///
/// Ids count up from `I1` and are never handed out twice. Ids already taken by
/// a requirement are skipped.
#[derive(Debug)]
struct JunctionIds<'a> {
    next: usize,
    reserved: HashSet<&'a str>,
}

impl<'a> JunctionIds<'a> {
    const fn new(reserved: HashSet<&'a str>) -> Self {
        Self { next: 1, reserved }
    }

    fn allocate(&mut self) -> String {
        loop {
            let candidate = format!("I{}", self.next);
            self.next += 1;
            if !self.reserved.contains(candidate.as_str()) {
                return candidate;
            }
        }
    }
}

struct Compiler<'a> {
    ids: JunctionIds<'a>,
    junctions: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl Compiler<'_> {
    fn expand(&mut self, expr: &DependencyExpr, child: &str) {
        let mut scope = OperatorScope::default();

        for element in expr.elements() {
            match element {
                Element::Operator(operator) => scope.supersede(*operator),
                Element::Operand(id) => {
                    self.edges.push(GraphEdge::new(id, child, scope.current()));
                }
                Element::Nested(inner) => {
                    let junction = self.ids.allocate();
                    trace!(%junction, child, "synthesised intermediate node");
                    self.junctions.push(GraphNode::intermediate(junction.clone()));
                    self.edges
                        .push(GraphEdge::new(&junction, child, scope.current()));
                    self.expand(inner, &junction);
                }
            }
        }
    }
}

/// Compile requirements into a dependency graph.
///
/// Requirement priorities are mapped to node backgrounds through `palette`.
/// Malformed input is never rejected: operator-only expressions produce no
/// edges, cycles and dangling references are kept as they are, and repeated
/// edges are not merged. Use [`Graph::diagnose`] to inspect those conditions.
#[instrument(level = "debug", skip_all, fields(requirements = requirements.len()))]
#[must_use]
pub fn compile(requirements: &[Requirement], palette: Palette) -> Graph {
    let mut nodes: Vec<GraphNode> = requirements
        .iter()
        .map(|requirement| GraphNode::requirement(requirement, palette))
        .collect();

    let reserved = requirements
        .iter()
        .map(|requirement| requirement.id().as_str())
        .collect();

    let mut compiler = Compiler {
        ids: JunctionIds::new(reserved),
        junctions: Vec::new(),
        edges: Vec::new(),
    };

    for requirement in requirements {
        if !requirement.dependency().is_empty() {
            compiler.expand(requirement.dependency(), requirement.id());
        }
    }

    debug!(
        intermediates = compiler.junctions.len(),
        edges = compiler.edges.len(),
        "compiled dependency graph"
    );

    nodes.extend(compiler.junctions);
    Graph {
        nodes,
        edges: compiler.edges,
    }
}

/// A data-quality problem found in a compiled graph.
///
/// None of these stop compilation. They are reported so the caller can decide
/// whether to surface them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// A requirement's priority has no entry in the style table.
    #[error("requirement {id} has priority {priority}, which has no style entry")]
    PriorityOutOfRange {
        /// The requirement.
        id: String,
        /// Its priority.
        priority: u8,
    },

    /// An edge's source is not a node in the graph.
    #[error("edge {edge} depends on unknown requirement {operand}")]
    UnknownOperand {
        /// The edge id.
        edge: String,
        /// The referenced id.
        operand: String,
    },

    /// Two requirements share an id.
    #[error("requirement id {id} is used more than once")]
    DuplicateRequirement {
        /// The repeated id.
        id: String,
    },

    /// The same source/target pair is linked more than once, so the edge ids
    /// collide.
    #[error("edge {edge} appears more than once")]
    DuplicateEdge {
        /// The repeated edge id.
        edge: String,
    },

    /// A set of nodes that depend on each other.
    #[error("dependency cycle through {}", .members.join(", "))]
    Cycle {
        /// The nodes on the cycle, sorted.
        members: Vec<String>,
    },
}

impl Graph {
    /// All nodes, requirement nodes first.
    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// All edges in creation order.
    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// The synthesised intermediate nodes in creation order.
    pub fn intermediates(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Intermediate)
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Finds every strongly connected group of nodes.
    ///
    /// A single node is only reported when it links to itself.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut graph = DiGraphMap::<&str, ()>::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            graph.add_node(node.id.as_str());
        }
        for edge in &self.edges {
            graph.add_edge(edge.source.as_str(), edge.target.as_str(), ());
        }

        tarjan_scc(&graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| {
                let mut members: Vec<String> = component.into_iter().map(str::to_string).collect();
                members.sort_unstable();
                members
            })
            .collect()
    }

    /// Reports data-quality problems without changing the graph.
    #[must_use]
    pub fn diagnose(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                issues.push(Issue::DuplicateRequirement {
                    id: node.id.clone(),
                });
            }
            if let (Some(priority), None) = (node.priority, &node.background) {
                issues.push(Issue::PriorityOutOfRange {
                    id: node.id.clone(),
                    priority,
                });
            }
        }

        let mut edge_counts: HashMap<&str, usize> = HashMap::new();
        for edge in &self.edges {
            // targets are always compiled nodes
            if !node_ids.contains(edge.source.as_str()) {
                issues.push(Issue::UnknownOperand {
                    edge: edge.id.clone(),
                    operand: edge.source.clone(),
                });
            }
            let count = edge_counts.entry(edge.id.as_str()).or_default();
            *count += 1;
            if *count == 2 {
                issues.push(Issue::DuplicateEdge {
                    edge: edge.id.clone(),
                });
            }
        }

        issues.extend(
            self.cycles()
                .into_iter()
                .map(|members| Issue::Cycle { members }),
        );

        issues
    }

    /// Returns a Graphviz rendering of the graph, laid out in `direction`.
    #[must_use]
    pub const fn dot(&self, direction: Direction) -> Dot<'_> {
        Dot {
            graph: self,
            direction,
        }
    }
}

/// The rank direction handed to the layout engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Dependencies above their dependents.
    #[default]
    TopBottom,
    /// Dependencies to the left of their dependents.
    LeftRight,
}

impl Direction {
    const fn rankdir(self) -> &'static str {
        match self {
            Self::TopBottom => "TB",
            Self::LeftRight => "LR",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::TopBottom => "top-bottom",
            Self::LeftRight => "left-right",
        })
    }
}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tb" | "top-bottom" | "vertical" => Ok(Self::TopBottom),
            "lr" | "left-right" | "horizontal" => Ok(Self::LeftRight),
            _ => Err(UnknownDirection(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown layout direction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown direction '{0}': expected tb or lr")]
pub struct UnknownDirection(String);

/// A wrapper type that formats a [`Graph`] in the Graphviz dot language.
///
/// Returned by [`Graph::dot`].
#[derive(Debug, Clone, Copy)]
pub struct Dot<'a> {
    graph: &'a Graph,
    direction: Direction,
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "digraph requirements {{")?;
        writeln!(f, "  rankdir={};", self.direction.rankdir())?;

        for node in &self.graph.nodes {
            match (node.kind, node.background.as_deref()) {
                (NodeKind::Intermediate, _) => writeln!(
                    f,
                    "  {} [label={}, shape=circle];",
                    quoted(&node.id),
                    quoted(&node.label)
                )?,
                (NodeKind::Requirement, Some(background)) if !background.is_empty() => writeln!(
                    f,
                    "  {} [label={}, shape=box, style=filled, fillcolor={}];",
                    quoted(&node.id),
                    quoted(&node.label),
                    quoted(background)
                )?,
                (NodeKind::Requirement, _) => writeln!(
                    f,
                    "  {} [label={}, shape=box];",
                    quoted(&node.id),
                    quoted(&node.label)
                )?,
            }
        }

        for edge in &self.graph.edges {
            match edge.label {
                Some(operator) => writeln!(
                    f,
                    "  {} -> {} [label={}];",
                    quoted(&edge.source),
                    quoted(&edge.target),
                    quoted(operator.as_str())
                )?,
                None => writeln!(f, "  {} -> {};", quoted(&edge.source), quoted(&edge.target))?,
            }
        }

        writeln!(f, "}}")
    }
}
