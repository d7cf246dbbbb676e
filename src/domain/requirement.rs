use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// The identifier of a requirement.
///
/// Identifiers are opaque, non-empty strings. They name graph nodes directly
/// and are referenced from other requirements' dependency expressions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequirementId(NonEmptyString);

impl RequirementId {
    /// Creates a new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyIdError`] if the string is empty.
    pub fn new(id: String) -> Result<Self, EmptyIdError> {
        NonEmptyString::new(id).map(Self).map_err(|_| EmptyIdError)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for RequirementId {
    type Error = EmptyIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RequirementId {
    type Error = EmptyIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<RequirementId> for String {
    fn from(id: RequirementId) -> Self {
        id.as_str().to_owned()
    }
}

impl Deref for RequirementId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a requirement identifier is empty.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("requirement identifiers must not be empty")]
pub struct EmptyIdError;

/// A boolean operator token inside an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    /// Conjunction, written `AND`.
    And,
    /// Disjunction, written `OR`.
    Or,
    /// Negation, written `NOT`.
    Not,
}

impl Operator {
    /// The token as it appears in source text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = NotAnOperator;

    /// Tokens are matched case-sensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            "NOT" => Ok(Self::Not),
            _ => Err(NotAnOperator),
        }
    }
}

/// Error returned when a token is not one of `AND`, `OR` or `NOT`.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("not a boolean operator")]
pub struct NotAnOperator;

/// One element of a [`DependencyExpr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A reference to another requirement.
    Operand(RequirementId),
    /// An operator token. It governs every later sibling until the next
    /// operator token in the same list.
    Operator(Operator),
    /// A nested sub-expression.
    Nested(DependencyExpr),
}

/// A possibly nested dependency expression.
///
/// In data files this is a list whose members are strings or nested lists,
/// e.g. `["R2", "AND", ["R3", "OR", "R4"]]`. Strings equal to `AND`, `OR` or
/// `NOT` are operators, every other string is a requirement identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawElement>", into = "Vec<RawElement>")]
pub struct DependencyExpr(Vec<Element>);

impl DependencyExpr {
    /// Creates an expression from its elements.
    #[must_use]
    pub const fn new(elements: Vec<Element>) -> Self {
        Self(elements)
    }

    /// Returns `true` if the expression has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The elements in source order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.0
    }

    /// Counts the nested sub-expressions at every depth.
    #[must_use]
    pub fn nested_count(&self) -> usize {
        self.0
            .iter()
            .map(|element| match element {
                Element::Nested(inner) => 1 + inner.nested_count(),
                Element::Operand(_) | Element::Operator(_) => 0,
            })
            .sum()
    }

    /// Every requirement referenced by the expression, depth first.
    #[must_use]
    pub fn operands(&self) -> Vec<&RequirementId> {
        let mut operands = Vec::new();
        self.collect_operands(&mut operands);
        operands
    }

    fn collect_operands<'a>(&'a self, out: &mut Vec<&'a RequirementId>) {
        for element in &self.0 {
            match element {
                Element::Operand(id) => out.push(id),
                Element::Nested(inner) => inner.collect_operands(out),
                Element::Operator(_) => {}
            }
        }
    }
}

impl From<Vec<Element>> for DependencyExpr {
    fn from(elements: Vec<Element>) -> Self {
        Self(elements)
    }
}

/// The loose on-disk shape of a dependency expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawElement {
    Token(String),
    Nested(Vec<Self>),
}

impl TryFrom<Vec<RawElement>> for DependencyExpr {
    type Error = EmptyIdError;

    fn try_from(raw: Vec<RawElement>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|element| match element {
                RawElement::Token(token) => match token.parse::<Operator>() {
                    Ok(operator) => Ok(Element::Operator(operator)),
                    Err(NotAnOperator) => RequirementId::new(token).map(Element::Operand),
                },
                RawElement::Nested(inner) => Self::try_from(inner).map(Element::Nested),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<DependencyExpr> for Vec<RawElement> {
    fn from(expr: DependencyExpr) -> Self {
        expr.0
            .into_iter()
            .map(|element| match element {
                Element::Operand(id) => RawElement::Token(id.into()),
                Element::Operator(operator) => RawElement::Token(operator.as_str().to_string()),
                Element::Nested(inner) => RawElement::Nested(inner.into()),
            })
            .collect()
    }
}

/// A requirement record.
///
/// Field names follow the spreadsheet-style export the records usually come
/// from (`requirements Identifier`, `requirements text`, `Priority`, `dep`);
/// the short names `id`, `text`, `priority` and `dependency` are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(alias = "requirements Identifier")]
    id: RequirementId,

    #[serde(alias = "requirements text")]
    text: String,

    /// Index into the node style table. Valid priorities are `0..=4`.
    #[serde(alias = "Priority")]
    priority: u8,

    #[serde(default, alias = "dep", skip_serializing_if = "DependencyExpr::is_empty")]
    dependency: DependencyExpr,
}

impl Requirement {
    /// Construct a new [`Requirement`].
    #[must_use]
    pub const fn new(
        id: RequirementId,
        text: String,
        priority: u8,
        dependency: DependencyExpr,
    ) -> Self {
        Self {
            id,
            text,
            priority,
            dependency,
        }
    }

    /// The requirement's identifier.
    #[must_use]
    pub const fn id(&self) -> &RequirementId {
        &self.id
    }

    /// The display text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The priority.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.priority
    }

    /// What this requirement depends on.
    #[must_use]
    pub const fn dependency(&self) -> &DependencyExpr {
        &self.dependency
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn id(s: &str) -> RequirementId {
        RequirementId::try_from(s).unwrap()
    }

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(RequirementId::new(String::new()), Err(EmptyIdError));
    }

    #[test_case("AND", Some(Operator::And); "and")]
    #[test_case("OR", Some(Operator::Or); "or")]
    #[test_case("NOT", Some(Operator::Not); "not")]
    #[test_case("and", None; "lowercase is an operand")]
    #[test_case("R1", None; "identifier")]
    fn operator_tokens(token: &str, expected: Option<Operator>) {
        assert_eq!(token.parse::<Operator>().ok(), expected);
    }

    #[test]
    fn deserialises_nested_expression() {
        let expr: DependencyExpr =
            serde_json::from_str(r#"["R2", "AND", ["R3", "OR", "R4"]]"#).unwrap();

        let expected = DependencyExpr::new(vec![
            Element::Operand(id("R2")),
            Element::Operator(Operator::And),
            Element::Nested(DependencyExpr::new(vec![
                Element::Operand(id("R3")),
                Element::Operator(Operator::Or),
                Element::Operand(id("R4")),
            ])),
        ]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn empty_operand_fails_to_deserialise() {
        let result = serde_json::from_str::<DependencyExpr>(r#"["R2", "AND", ""]"#);
        assert!(result.is_err());
    }

    #[test]
    fn serialises_back_to_loose_shape() {
        let expr: DependencyExpr = serde_json::from_str(r#"["NOT", ["R3", "OR", "R4"]]"#).unwrap();
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, r#"["NOT",["R3","OR","R4"]]"#);
    }

    #[test]
    fn nested_count_is_structural() {
        let expr: DependencyExpr =
            serde_json::from_str(r#"[["A"], "OR", [["B", "AND", "C"], []], "AND"]"#).unwrap();
        assert_eq!(expr.nested_count(), 4);
    }

    #[test]
    fn operands_are_depth_first() {
        let expr: DependencyExpr =
            serde_json::from_str(r#"["A", ["B", ["C"]], "OR", "D"]"#).unwrap();
        let operands: Vec<&str> = expr.operands().into_iter().map(|id| id.as_str()).collect();
        assert_eq!(operands, ["A", "B", "C", "D"]);
    }

    #[test]
    fn requirement_accepts_export_field_names() {
        let yaml = "\
requirements Identifier: R1
requirements text: The pump shall stop on overpressure
Priority: 2
dep: [R2, AND, R3]
";
        let requirement: Requirement = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(requirement.id().as_str(), "R1");
        assert_eq!(requirement.text(), "The pump shall stop on overpressure");
        assert_eq!(requirement.priority(), 2);
        assert_eq!(requirement.dependency().operands().len(), 2);
    }

    #[test]
    fn missing_dependency_defaults_to_empty() {
        let requirement: Requirement =
            serde_json::from_str(r#"{"id": "R9", "text": "standalone", "priority": 1}"#).unwrap();
        assert!(requirement.dependency().is_empty());
    }
}
