//! Paper geometry for PDF capture.
//!
//! The capture call takes fixed paper dimensions and margins; Chrome's
//! print-to-PDF API expects inches, while margins are configured in
//! millimetres, so the conversion lives here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::{PagePressError, Result};

const MM_PER_INCH: f64 = 25.4;

/// Converts a millimetre length to the inches expected by the print API.
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Fixed paper formats supported for capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperFormat {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PaperFormat {
    pub fn width_inches(self) -> f64 {
        match self {
            PaperFormat::A4 => 8.27,
            PaperFormat::Letter | PaperFormat::Legal => 8.5,
        }
    }

    pub fn height_inches(self) -> f64 {
        match self {
            PaperFormat::A4 => 11.69,
            PaperFormat::Letter => 11.0,
            PaperFormat::Legal => 14.0,
        }
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaperFormat::A4 => "a4",
            PaperFormat::Letter => "letter",
            PaperFormat::Legal => "legal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PaperFormatParseError {
    #[error("Unknown paper format '{0}'; expected a4, letter, or legal")]
    Unknown(String),
}

impl FromStr for PaperFormat {
    type Err = PaperFormatParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperFormat::A4),
            "letter" => Ok(PaperFormat::Letter),
            "legal" => Ok(PaperFormat::Legal),
            other => Err(PaperFormatParseError::Unknown(other.to_string())),
        }
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMargins {
    pub top_mm: f64,
    pub bottom_mm: f64,
    pub left_mm: f64,
    pub right_mm: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top_mm: 25.5,
            bottom_mm: 25.5,
            left_mm: 19.0,
            right_mm: 19.0,
        }
    }
}

impl PageMargins {
    pub fn uniform(mm: f64) -> Self {
        Self {
            top_mm: mm,
            bottom_mm: mm,
            left_mm: mm,
            right_mm: mm,
        }
    }
}

/// Paper format plus margins, as handed to `capture_pdf`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub paper: PaperFormat,
    pub margins: PageMargins,
}

impl PageGeometry {
    /// Rejects negative margins and margins that leave no printable area.
    pub fn validate(&self) -> Result<()> {
        let m = &self.margins;
        for (name, value) in [
            ("top", m.top_mm),
            ("bottom", m.bottom_mm),
            ("left", m.left_mm),
            ("right", m.right_mm),
        ] {
            if value < 0.0 {
                return Err(PagePressError::Config(format!(
                    "{} margin must not be negative (got {}mm)",
                    name, value
                )));
            }
        }
        let horizontal = mm_to_inches(m.left_mm + m.right_mm);
        let vertical = mm_to_inches(m.top_mm + m.bottom_mm);
        if horizontal >= self.paper.width_inches() || vertical >= self.paper.height_inches() {
            return Err(PagePressError::Config(format!(
                "margins leave no printable area on {} paper",
                self.paper
            )));
        }
        Ok(())
    }
}
