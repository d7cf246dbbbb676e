//! The boolean statement grammar used by the test-case generator.
//!
//! A statement has the form `<variable> = <expression>`, with tokens separated
//! by whitespace. Two expression shapes are recognised:
//!
//! - `NOT <operand>`: any statement containing a `NOT` token negates the single
//!   operand following the last `NOT`. Anything before it is ignored.
//! - `<operand> (AND|OR <operand>)*`: folded strictly left to right. `AND` does
//!   not bind tighter than `OR`, so `A AND B OR C` means `(A AND B) OR C` and
//!   `A OR B AND C` means `(A OR B) AND C`.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    cases::{Missing, Outcome},
    requirement::Operator,
};

/// A mapping from variable name to value.
pub type Assignment = BTreeMap<String, bool>;

/// Errors raised when a statement does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The statement lacks a single `=`.
    #[error("expected `<variable> = <expression>`, got '{0}'")]
    NotAnAssignment(String),

    /// Nothing on the left of `=`.
    #[error("missing output variable in '{0}'")]
    MissingOutput(String),

    /// Nothing on the right of `=`.
    #[error("empty expression in '{0}'")]
    EmptyExpression(String),

    /// An operator with no operand on one side.
    #[error("{operator} is missing an operand in '{statement}'")]
    DanglingOperator {
        /// The operator.
        operator: Operator,
        /// The whole statement.
        statement: String,
    },

    /// Two operands with no operator between them.
    #[error("'{left}' and '{right}' are not joined by an operator in '{statement}'")]
    MissingOperator {
        /// The earlier operand.
        left: String,
        /// The later operand.
        right: String,
        /// The whole statement.
        statement: String,
    },

    /// The last `NOT` is not followed by exactly one operand.
    #[error("NOT must be followed by exactly one operand in '{0}'")]
    InvalidNegation(String),
}

/// Errors raised while evaluating a well-formed expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An operand has no value in the assignment.
    #[error("no value for operand '{0}'")]
    UnknownOperand(String),
}

/// A binary connective in a folded expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Connective {
    /// Applies the connective. Both sides are always evaluated.
    #[must_use]
    pub const fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left & right,
            Self::Or => left | right,
        }
    }
}

impl From<Connective> for Operator {
    fn from(connective: Connective) -> Self {
        match connective {
            Connective::And => Self::And,
            Connective::Or => Self::Or,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::And => "AND",
            Self::Or => "OR",
        })
    }
}

/// The right-hand side of a catalog statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rhs {
    /// Negation of a single operand.
    Not(String),
    /// A strict left fold: `first`, then each `(connective, operand)` in turn.
    Fold {
        /// The leftmost operand.
        first: String,
        /// The remaining operands with the connective preceding each.
        rest: Vec<(Connective, String)>,
    },
}

impl fmt::Display for Rhs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Not(operand) => write!(f, "NOT {operand}"),
            Self::Fold { first, rest } => {
                f.write_str(first)?;
                for (connective, operand) in rest {
                    write!(f, " {connective} {operand}")?;
                }
                Ok(())
            }
        }
    }
}

/// A named boolean expression from the catalog, e.g. `Y = A AND B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogExpr {
    output: String,
    rhs: Rhs,
}

impl CatalogExpr {
    /// The variable this expression defines.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The parsed right-hand side.
    #[must_use]
    pub const fn rhs(&self) -> &Rhs {
        &self.rhs
    }

    /// Evaluates the expression under an assignment.
    ///
    /// Every operand is looked up, even when the result is already decided.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownOperand`] for the first operand missing
    /// from the assignment.
    pub fn evaluate(&self, assignment: &Assignment) -> Result<bool, EvalError> {
        let lookup = |operand: &str| {
            assignment
                .get(operand)
                .copied()
                .ok_or_else(|| EvalError::UnknownOperand(operand.to_string()))
        };

        match &self.rhs {
            Rhs::Not(operand) => lookup(operand).map(|value| !value),
            Rhs::Fold { first, rest } => {
                rest.iter()
                    .try_fold(lookup(first)?, |accumulated, (connective, operand)| {
                        Ok(connective.apply(accumulated, lookup(operand)?))
                    })
            }
        }
    }
}

impl fmt::Display for CatalogExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.output, self.rhs)
    }
}

/// Splits a statement on its single `=`, trimming both sides.
fn split_statement(statement: &str) -> Result<(&str, &str), ParseError> {
    match statement.split_once('=') {
        Some((lhs, rhs)) if !rhs.contains('=') => Ok((lhs.trim(), rhs.trim())),
        _ => Err(ParseError::NotAnAssignment(statement.to_string())),
    }
}

fn is_operator(token: &str) -> bool {
    token.parse::<Operator>().is_ok()
}

fn parse_negation(tokens: &[&str], statement: &str) -> Result<Rhs, ParseError> {
    let last_not = tokens
        .iter()
        .rposition(|token| *token == Operator::Not.as_str())
        .ok_or_else(|| ParseError::InvalidNegation(statement.to_string()))?;

    match &tokens[last_not + 1..] {
        [operand] if !is_operator(operand) => Ok(Rhs::Not((*operand).to_string())),
        _ => Err(ParseError::InvalidNegation(statement.to_string())),
    }
}

fn parse_fold(tokens: &[&str], statement: &str) -> Result<Rhs, ParseError> {
    let mut first: Option<&str> = None;
    let mut previous: Option<&str> = None;
    let mut pending: Option<Connective> = None;
    let mut rest = Vec::new();

    for &token in tokens {
        match (token.parse::<Operator>(), pending) {
            (Ok(operator), None) if previous.is_some() => {
                pending = Some(match operator {
                    Operator::And => Connective::And,
                    Operator::Or => Connective::Or,
                    Operator::Not => return Err(ParseError::InvalidNegation(statement.to_string())),
                });
            }
            (Ok(operator), None) => {
                return Err(ParseError::DanglingOperator {
                    operator,
                    statement: statement.to_string(),
                });
            }
            (Ok(_), Some(connective)) => {
                return Err(ParseError::DanglingOperator {
                    operator: connective.into(),
                    statement: statement.to_string(),
                });
            }
            (Err(_), Some(connective)) => {
                rest.push((connective, token.to_string()));
                pending = None;
                previous = Some(token);
            }
            (Err(_), None) => match previous {
                None => {
                    first = Some(token);
                    previous = Some(token);
                }
                Some(left) => {
                    return Err(ParseError::MissingOperator {
                        left: left.to_string(),
                        right: token.to_string(),
                        statement: statement.to_string(),
                    });
                }
            },
        }
    }

    if let Some(connective) = pending {
        return Err(ParseError::DanglingOperator {
            operator: connective.into(),
            statement: statement.to_string(),
        });
    }

    let first = first.ok_or_else(|| ParseError::EmptyExpression(statement.to_string()))?;
    Ok(Rhs::Fold {
        first: first.to_string(),
        rest,
    })
}

impl FromStr for CatalogExpr {
    type Err = ParseError;

    fn from_str(statement: &str) -> Result<Self, Self::Err> {
        let (output, rhs) = split_statement(statement)?;

        if output.is_empty() {
            return Err(ParseError::MissingOutput(statement.to_string()));
        }

        let tokens: Vec<&str> = rhs.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(ParseError::EmptyExpression(statement.to_string()));
        }

        let rhs = if tokens.contains(&Operator::Not.as_str()) {
            parse_negation(&tokens, statement)?
        } else {
            parse_fold(&tokens, statement)?
        };

        Ok(Self {
            output: output.to_string(),
            rhs,
        })
    }
}

/// Extracts the free variables of a target statement.
///
/// The left-hand side is ignored. Every right-hand token that is not an
/// operator is a variable; variables are returned in order of first appearance
/// without repeats.
///
/// # Errors
///
/// Returns [`ParseError::NotAnAssignment`] if the statement lacks a single
/// `=`.
pub fn free_variables(target: &str) -> Result<Vec<String>, ParseError> {
    let (_, rhs) = split_statement(target)?;

    let mut variables: Vec<String> = Vec::new();
    for token in rhs.split_whitespace().filter(|token| !is_operator(token)) {
        if !variables.iter().any(|variable| variable == token) {
            variables.push(token.to_string());
        }
    }
    Ok(variables)
}

/// A catalog line as written, together with the result of parsing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    source: String,
    output: String,
    parsed: Result<CatalogExpr, ParseError>,
}

impl CatalogEntry {
    /// Parses a catalog line. Parse failures are kept on the entry.
    #[must_use]
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = source.parse::<CatalogExpr>();

        // Malformed lines still need a column name.
        let output = parsed.as_ref().map_or_else(
            |_| {
                split_statement(&source)
                    .ok()
                    .map(|(lhs, _)| lhs)
                    .filter(|lhs| !lhs.is_empty())
                    .unwrap_or_else(|| source.trim())
                    .to_string()
            },
            |expr| expr.output().to_string(),
        );

        Self {
            source,
            output,
            parsed,
        }
    }

    /// The line as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The output variable, or a best-effort name for a malformed line.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The parsed expression, or why it could not be parsed.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] recorded when the line was parsed.
    pub const fn expression(&self) -> Result<&CatalogExpr, &ParseError> {
        self.parsed.as_ref()
    }

    /// Evaluates the entry under an assignment.
    ///
    /// Malformed entries and unknown operands yield [`Outcome::Missing`].
    #[must_use]
    pub fn evaluate(&self, assignment: &Assignment) -> Outcome {
        self.expression()
            .map_err(|error| Missing::from(error.clone()))
            .and_then(|expr| expr.evaluate(assignment).map_err(Missing::from))
            .into()
    }
}

/// An ordered collection of named boolean expressions.
///
/// Deserialises from a list of statement strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// The entries in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries that failed to parse.
    pub fn malformed(&self) -> impl Iterator<Item = (&CatalogEntry, &ParseError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.expression().err().map(|error| (entry, error)))
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for Catalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(CatalogEntry::parse).collect(),
        }
    }
}

impl From<Vec<String>> for Catalog {
    fn from(lines: Vec<String>) -> Self {
        lines.into_iter().collect()
    }
}

impl From<Catalog> for Vec<String> {
    fn from(catalog: Catalog) -> Self {
        catalog
            .entries
            .into_iter()
            .map(|entry| entry.source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn assignment(values: &[(&str, bool)]) -> Assignment {
        values
            .iter()
            .map(|(name, value)| ((*name).to_string(), *value))
            .collect()
    }

    fn evaluate(statement: &str, values: &[(&str, bool)]) -> Result<bool, EvalError> {
        statement
            .parse::<CatalogExpr>()
            .unwrap()
            .evaluate(&assignment(values))
    }

    #[test]
    fn parses_fold() {
        let expr: CatalogExpr = "Y = A AND B OR C".parse().unwrap();

        assert_eq!(expr.output(), "Y");
        assert_eq!(
            expr.rhs(),
            &Rhs::Fold {
                first: "A".to_string(),
                rest: vec![
                    (Connective::And, "B".to_string()),
                    (Connective::Or, "C".to_string()),
                ],
            }
        );
        assert_eq!(expr.to_string(), "Y = A AND B OR C");
    }

    #[test]
    fn parses_negation() {
        let expr: CatalogExpr = "  Z=  NOT   A ".parse().unwrap();

        assert_eq!(expr.output(), "Z");
        assert_eq!(expr.rhs(), &Rhs::Not("A".to_string()));
    }

    #[test]
    fn negation_uses_trailing_operand_only() {
        let expr: CatalogExpr = "Z = A AND NOT B".parse().unwrap();
        assert_eq!(expr.rhs(), &Rhs::Not("B".to_string()));
    }

    #[test]
    fn single_operand_is_identity() {
        assert_eq!(evaluate("Y = A", &[("A", true)]), Ok(true));
        assert_eq!(evaluate("Y = A", &[("A", false)]), Ok(false));
    }

    #[test]
    fn not_negates() {
        assert_eq!(evaluate("Y = NOT A", &[("A", true)]), Ok(false));
        assert_eq!(evaluate("Y = NOT A", &[("A", false)]), Ok(true));
    }

    // Standard precedence would give `A OR (B AND C)` = true here.
    #[test]
    fn fold_ignores_precedence() {
        let values = [("A", true), ("B", false), ("C", false)];
        assert_eq!(evaluate("Y = A OR B AND C", &values), Ok(false));
    }

    #[test_case(false, false, true, true; "f f t")]
    #[test_case(true, true, false, true; "t t f")]
    #[test_case(true, false, false, false; "t f f")]
    #[test_case(false, true, true, true; "f t t")]
    fn fold_is_left_to_right(a: bool, b: bool, c: bool, expected: bool) {
        let values = [("A", a), ("B", b), ("C", c)];
        assert_eq!(evaluate("Y = A AND B OR C", &values), Ok(expected));
        assert_eq!(expected, (a && b) || c);
    }

    #[test]
    fn unknown_operand_is_reported_even_when_result_is_decided() {
        assert_eq!(
            evaluate("Y = A AND B", &[("A", false)]),
            Err(EvalError::UnknownOperand("B".to_string()))
        );
    }

    #[test_case("Y A AND B"; "no equals")]
    #[test_case("Y = A = B"; "two equals")]
    fn rejects_non_assignments(statement: &str) {
        assert_eq!(
            statement.parse::<CatalogExpr>(),
            Err(ParseError::NotAnAssignment(statement.to_string()))
        );
    }

    #[test]
    fn rejects_missing_output() {
        assert!(matches!(
            " = A AND B".parse::<CatalogExpr>(),
            Err(ParseError::MissingOutput(_))
        ));
    }

    #[test]
    fn rejects_empty_expression() {
        assert!(matches!(
            "Y =   ".parse::<CatalogExpr>(),
            Err(ParseError::EmptyExpression(_))
        ));
    }

    #[test_case("Y = AND A", Operator::And; "leading operator")]
    #[test_case("Y = A OR", Operator::Or; "trailing operator")]
    #[test_case("Y = A AND OR B", Operator::And; "adjacent operators")]
    fn rejects_dangling_operators(statement: &str, operator: Operator) {
        assert_eq!(
            statement.parse::<CatalogExpr>(),
            Err(ParseError::DanglingOperator {
                operator,
                statement: statement.to_string(),
            })
        );
    }

    #[test]
    fn rejects_adjacent_operands() {
        assert_eq!(
            "Y = A B".parse::<CatalogExpr>(),
            Err(ParseError::MissingOperator {
                left: "A".to_string(),
                right: "B".to_string(),
                statement: "Y = A B".to_string(),
            })
        );
    }

    #[test_case("Y = NOT"; "nothing after not")]
    #[test_case("Y = NOT A B"; "two operands after not")]
    #[test_case("Y = NOT A OR B"; "fold after not")]
    fn rejects_invalid_negation(statement: &str) {
        assert_eq!(
            statement.parse::<CatalogExpr>(),
            Err(ParseError::InvalidNegation(statement.to_string()))
        );
    }

    #[test_case("X = A AND B", &["A", "B"]; "two variables")]
    #[test_case("X = B OR A AND B", &["B", "A"]; "first appearance order without repeats")]
    #[test_case("X = NOT C", &["C"]; "negation")]
    #[test_case("= A", &["A"]; "lhs is ignored")]
    #[test_case("X = AND", &[]; "operators only")]
    fn extracts_free_variables(target: &str, expected: &[&str]) {
        assert_eq!(free_variables(target).unwrap(), expected);
    }

    #[test]
    fn free_variables_require_an_assignment() {
        assert!(free_variables("A AND B").is_err());
    }

    #[test]
    fn malformed_entries_keep_a_column_name() {
        let catalog: Catalog = ["Y = A AND", "no equals here", "Z = NOT B"]
            .into_iter()
            .collect();

        let outputs: Vec<&str> = catalog.iter().map(CatalogEntry::output).collect();
        assert_eq!(outputs, ["Y", "no equals here", "Z"]);
        assert_eq!(catalog.malformed().count(), 2);
    }

    #[test]
    fn entries_evaluate_to_outcomes() {
        let values = assignment(&[("A", true)]);

        assert_eq!(CatalogEntry::parse("Y = NOT A").evaluate(&values), Outcome::Value(false));
        assert_eq!(
            CatalogEntry::parse("Y = A OR B").evaluate(&values),
            Outcome::Missing {
                missing: Missing::UnknownOperand(EvalError::UnknownOperand("B".to_string()))
            }
        );
        assert!(matches!(
            CatalogEntry::parse("Y = A AND").evaluate(&values),
            Outcome::Missing {
                missing: Missing::Malformed(ParseError::DanglingOperator { .. })
            }
        ));
    }

    #[test]
    fn catalog_deserialises_from_strings() {
        let catalog: Catalog = serde_yaml::from_str("- Y = A AND B\n- Z = NOT A\n").unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.iter().all(|entry| entry.expression().is_ok()));
        assert_eq!(catalog.iter().next().unwrap().source(), "Y = A AND B");
    }
}
