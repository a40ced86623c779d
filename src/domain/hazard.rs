//! Hazard and product version types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A natural hazard modeled inside a package region
///
/// Variants are declared in the order hazard flags appear in the archive
/// comment, which is also the order hazards are processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    Earthquake,
    Flood,
    Hurricane,
    Tsunami,
}

impl Hazard {
    /// All hazards in archive flag order
    pub const ALL: [Hazard; 4] = [
        Hazard::Earthquake,
        Hazard::Flood,
        Hazard::Hurricane,
        Hazard::Tsunami,
    ];

    /// Lowercase name used in output paths and catalog rows
    pub fn as_str(&self) -> &'static str {
        match self {
            Hazard::Earthquake => "earthquake",
            Hazard::Flood => "flood",
            Hazard::Hurricane => "hurricane",
            Hazard::Tsunami => "tsunami",
        }
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hazard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "earthquake" | "eq" => Ok(Hazard::Earthquake),
            "flood" | "fl" => Ok(Hazard::Flood),
            "hurricane" | "hu" => Ok(Hazard::Hurricane),
            "tsunami" | "ts" => Ok(Hazard::Tsunami),
            other => Err(format!(
                "Unknown hazard '{other}'. Must be one of: earthquake, flood, hurricane, tsunami"
            )),
        }
    }
}

/// Product codes written by each Hazus release
const PRODUCT_VERSIONS: [(&str, &str); 16] = [
    ("060606", "Hazus MR1"),
    ("070707", "Hazus MR2"),
    ("080808", "Hazus MR3"),
    ("090909", "Hazus MR4"),
    ("101010", "Hazus MR5"),
    ("111111", "Hazus 2.0"),
    ("121212", "Hazus 2.1"),
    ("131313", "Hazus 3.0"),
    ("141414", "Hazus 3.1"),
    ("151515", "Hazus 4.0"),
    ("161616", "Hazus 4.1"),
    ("171717", "Hazus 4.2"),
    ("181818", "Hazus 4.2.1"),
    ("191919", "Hazus 4.2.2"),
    ("202020", "Hazus 4.2.3"),
    ("212121", "Hazus 5.0"),
];

/// The software release that produced an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProductVersion {
    /// A code found in the release table
    Known { code: String, name: &'static str },
    /// A code the release table does not list
    Unrecognized(String),
}

impl ProductVersion {
    /// Maps a product code to a release name
    ///
    /// # Examples
    ///
    /// ```
    /// use lossport::domain::hazard::ProductVersion;
    ///
    /// assert_eq!(ProductVersion::lookup("202020").label(), "Hazus 4.2.3");
    /// assert!(!ProductVersion::lookup("999999").is_known());
    /// ```
    pub fn lookup(code: &str) -> Self {
        let code = code.trim();
        PRODUCT_VERSIONS
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(c, name)| ProductVersion::Known {
                code: (*c).to_string(),
                name,
            })
            .unwrap_or_else(|| ProductVersion::Unrecognized(code.to_string()))
    }

    /// The raw product code
    pub fn code(&self) -> &str {
        match self {
            ProductVersion::Known { code, .. } => code,
            ProductVersion::Unrecognized(code) => code,
        }
    }

    /// Release name, or the raw code when unrecognized
    pub fn label(&self) -> &str {
        match self {
            ProductVersion::Known { name, .. } => name,
            ProductVersion::Unrecognized(code) => code,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ProductVersion::Known { .. })
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
