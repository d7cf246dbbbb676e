use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const RED: [&str; 5] = ["", "#FF5733", "#FF6F61", "#FF9999", "#FFCCCC"];
const BLUE: [&str; 5] = ["", "#1a53ff", "#3366FF", "#99CCFF", "#E6F7FF"];
const PASTEL: [&str; 5] = ["", "#FF8080", "#FFD080", "#A8E9FF", "#ECFEEC"];

/// Background colour tables for requirement nodes, indexed by priority.
///
/// Every table has exactly five entries. Priority `0` maps to the empty shade,
/// which renders as no background at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// Red shades, darkest for priority 1.
    #[default]
    Red,
    /// Blue shades, darkest for priority 1.
    Blue,
    /// One distinct pastel colour per priority.
    Pastel,
}

impl Palette {
    /// The highest priority with a shade in every table.
    pub const MAX_PRIORITY: u8 = 4;

    const fn table(self) -> &'static [&'static str; 5] {
        match self {
            Self::Red => &RED,
            Self::Blue => &BLUE,
            Self::Pastel => &PASTEL,
        }
    }

    /// Look up the shade for a priority.
    ///
    /// Returns `None` when the priority has no entry in the table.
    #[must_use]
    pub fn shade(self, priority: u8) -> Option<&'static str> {
        self.table().get(usize::from(priority)).copied()
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Pastel => "pastel",
        })
    }
}

impl FromStr for Palette {
    type Err = UnknownPalette;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "blue" => Ok(Self::Blue),
            "pastel" => Ok(Self::Pastel),
            _ => Err(UnknownPalette(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown palette name.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown palette '{0}': expected one of red, blue, pastel")]
pub struct UnknownPalette(String);
