//! Exhaustive truth-table test cases for a boolean target expression.

use std::{collections::BTreeMap, fmt};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::expression::{
    Assignment, Catalog, EvalError, ParseError, free_variables,
};

/// The default bound on the number of free variables in a target.
///
/// The number of test cases doubles with every variable.
pub const DEFAULT_VARIABLE_LIMIT: usize = 20;

/// Errors that prevent test cases from being generated at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The target expression is not an assignment.
    #[error("malformed target expression: {0}")]
    Malformed(#[from] ParseError),

    /// The target has more free variables than allowed.
    #[error("target has {count} variables, more than the limit of {limit}")]
    TooManyVariables {
        /// The number of free variables in the target.
        count: usize,
        /// The configured limit.
        limit: usize,
    },
}

/// Why a catalog expression produced no value for a test case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Missing {
    /// The catalog line itself is malformed.
    #[error(transparent)]
    Malformed(#[from] ParseError),
    /// The expression names a variable the target does not have.
    #[error(transparent)]
    UnknownOperand(#[from] EvalError),
}

impl Serialize for Missing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The value of one catalog expression in one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// The expression evaluated to this value.
    Value(bool),
    /// The expression could not be evaluated.
    Missing {
        /// The reason.
        missing: Missing,
    },
}

impl Outcome {
    /// The value, if there is one.
    #[must_use]
    pub const fn value(&self) -> Option<bool> {
        match self {
            Self::Value(value) => Some(*value),
            Self::Missing { .. } => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Value(true) => f.write_str("1"),
            Self::Value(false) => f.write_str("0"),
            Self::Missing { .. } => f.write_str("?"),
        }
    }
}

impl From<Result<bool, Missing>> for Outcome {
    fn from(result: Result<bool, Missing>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(missing) => Self::Missing { missing },
        }
    }
}

/// One row of the truth table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// The value of every free variable.
    pub input_values: Assignment,
    /// The outcome of every catalog expression, keyed by output variable.
    pub case_output: BTreeMap<String, Outcome>,
}

/// The generated test cases together with their column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSuite {
    /// Free variables in order of first appearance in the target.
    pub variables: Vec<String>,
    /// Output variables in order of first appearance in the catalog, without
    /// repeats.
    pub outputs: Vec<String>,
    /// One case per assignment, in enumeration order.
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    /// Returns `true` if any case has a missing output.
    #[must_use]
    pub fn has_missing(&self) -> bool {
        self.cases
            .iter()
            .flat_map(|case| case.case_output.values())
            .any(|outcome| outcome.value().is_none())
    }
}

/// Builds the assignment with index `index`: variable `j` takes bit `j`.
fn assignment(variables: &[String], index: usize) -> Assignment {
    variables
        .iter()
        .enumerate()
        .map(|(bit, variable)| (variable.clone(), (index >> bit) & 1 == 1))
        .collect()
}

/// Generates one test case for every assignment of the target's free
/// variables.
///
/// Case `i` assigns variable `j` the value of bit `j` of `i`, with bit 0 the
/// least significant and the first variable of the target. Each case holds
/// the outcome of every catalog expression. Catalog entries that cannot be
/// evaluated degrade to [`Outcome::Missing`] in every case instead of failing
/// the whole run. When several entries define the same output variable, the
/// last one in the catalog provides its value.
///
/// # Errors
///
/// Returns [`GenerateError::Malformed`] if `target` is not an assignment and
/// [`GenerateError::TooManyVariables`] if it has more than `limit` free
/// variables.
#[instrument(level = "debug", skip(catalog), fields(entries = catalog.len()))]
pub fn generate_test_cases(
    target: &str,
    catalog: &Catalog,
    limit: usize,
) -> Result<TestSuite, GenerateError> {
    let variables = free_variables(target)?;

    let too_many = || GenerateError::TooManyVariables {
        count: variables.len(),
        limit,
    };
    if variables.len() > limit {
        return Err(too_many());
    }
    let rows = u32::try_from(variables.len())
        .ok()
        .and_then(|bits| 1_usize.checked_shl(bits))
        .ok_or_else(too_many)?;

    debug!(?variables, rows, "enumerating assignments");

    let cases = (0..rows)
        .map(|index| {
            let input_values = assignment(&variables, index);
            let case_output = catalog
                .iter()
                .map(|entry| (entry.output().to_string(), entry.evaluate(&input_values)))
                .collect();
            TestCase {
                input_values,
                case_output,
            }
        })
        .collect();

    let mut outputs: Vec<String> = Vec::with_capacity(catalog.len());
    for entry in catalog {
        if !outputs.iter().any(|output| output == entry.output()) {
            outputs.push(entry.output().to_string());
        }
    }

    Ok(TestSuite {
        variables,
        outputs,
        cases,
    })
}
