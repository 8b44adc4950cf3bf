//! Article identifiers.
//!
//! Two shapes are accepted: new-style `YYMM.NNNNN` ids (four-digit numbers
//! before 2015) and old-style `archive/YYMMNNN` ids, optionally carrying a
//! subject class (`math.AG/0101001`). Either may be followed by `vN`.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::taxonomy;

/// Archive name used for new-style identifiers.
pub const NEW_STYLE_ARCHIVE: &str = "arxiv";

static NEW_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})(\d{2})\.(\d{4,5})(?:v(\d+))?$").expect("new-style id regex")
});

static OLD_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z][a-z\-]*)(?:\.([A-Z]{2}))?/(\d{2})(\d{2})(\d{3})(?:v(\d+))?$")
        .expect("old-style id regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("empty identifier")]
    Empty,
    #[error("invalid arXiv identifier {0}")]
    Malformed(String),
    #[error("unknown archive {archive} in identifier {raw}")]
    UnknownArchive { archive: String, raw: String },
    #[error("identifier {raw} has an impossible date {yymm}")]
    BadDate { yymm: String, raw: String },
    #[error("identifier {raw} has an invalid paper number")]
    BadNumber { raw: String },
    #[error("identifier {raw} has an invalid version")]
    BadVersion { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    id: String,
    archive: String,
    filename: String,
    yymm: String,
    version: Option<u32>,
    old_style: bool,
}

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if let Some(caps) = NEW_STYLE.captures(raw) {
            let (yy, mm, number) = (&caps[1], &caps[2], &caps[3]);
            let yymm = format!("{yy}{mm}");
            let year: u32 = yy.parse().unwrap_or_default();
            let month: u32 = mm.parse().unwrap_or_default();

            if !(1..=12).contains(&month) || (year, month) < (7, 4) {
                return Err(IdentifierError::BadDate {
                    yymm,
                    raw: raw.to_string(),
                });
            }
            let expected_len = if year >= 15 { 5 } else { 4 };
            if number.len() != expected_len || number.bytes().all(|b| b == b'0') {
                return Err(IdentifierError::BadNumber {
                    raw: raw.to_string(),
                });
            }

            let version = parse_version(caps.get(4).map(|m| m.as_str()), raw)?;
            let id = format!("{yymm}.{number}");
            return Ok(Self {
                filename: id.clone(),
                id,
                archive: NEW_STYLE_ARCHIVE.to_string(),
                yymm,
                version,
                old_style: false,
            });
        }

        if let Some(caps) = OLD_STYLE.captures(raw) {
            let archive = &caps[1];
            if !taxonomy::is_legacy_archive(archive) {
                return Err(IdentifierError::UnknownArchive {
                    archive: archive.to_string(),
                    raw: raw.to_string(),
                });
            }

            let (yy, mm, number) = (&caps[3], &caps[4], &caps[5]);
            let yymm = format!("{yy}{mm}");
            let year: u32 = yy.parse().unwrap_or_default();
            let month: u32 = mm.parse().unwrap_or_default();
            let full_year = if year >= 91 { 1900 + year } else { 2000 + year };

            let in_window = (1991, 7) <= (full_year, month) && (full_year, month) <= (2007, 3);
            if !(1..=12).contains(&month) || !in_window {
                return Err(IdentifierError::BadDate {
                    yymm,
                    raw: raw.to_string(),
                });
            }
            if number == "000" {
                return Err(IdentifierError::BadNumber {
                    raw: raw.to_string(),
                });
            }

            let version = parse_version(caps.get(6).map(|m| m.as_str()), raw)?;
            let filename = format!("{yymm}{number}");
            return Ok(Self {
                id: format!("{archive}/{filename}"),
                archive: archive.to_string(),
                filename,
                yymm,
                version,
                old_style: true,
            });
        }

        Err(IdentifierError::Malformed(raw.to_string()))
    }

    /// Identifier without version, e.g. `2101.00001` or `hep-th/9901001`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier with its version when one was given.
    pub fn idv(&self) -> String {
        match self.version {
            Some(version) => format!("{}v{}", self.id, version),
            None => self.id.clone(),
        }
    }

    pub fn archive(&self) -> &str {
        &self.archive
    }

    /// Numeric part used to name files in storage.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn yymm(&self) -> &str {
        &self.yymm
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }

    pub fn is_old_style(&self) -> bool {
        self.old_style
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.idv())
    }
}

fn parse_version(raw_version: Option<&str>, raw: &str) -> Result<Option<u32>, IdentifierError> {
    match raw_version {
        None => Ok(None),
        Some(value) => match value.parse::<u32>() {
            Ok(version) if version >= 1 => Ok(Some(version)),
            _ => Err(IdentifierError::BadVersion {
                raw: raw.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_style_with_version() {
        let id = Identifier::parse("2101.00001v3").unwrap();
        assert_eq!(id.id(), "2101.00001");
        assert_eq!(id.idv(), "2101.00001v3");
        assert_eq!(id.archive(), NEW_STYLE_ARCHIVE);
        assert_eq!(id.yymm(), "2101");
        assert_eq!(id.filename(), "2101.00001");
        assert_eq!(id.version(), Some(3));
        assert!(!id.is_old_style());
    }

    #[test]
    fn new_style_four_digit_era() {
        let id = Identifier::parse("0704.0001").unwrap();
        assert!(!id.has_version());
        assert_eq!(id.idv(), "0704.0001");

        assert!(matches!(
            Identifier::parse("1412.00001"),
            Err(IdentifierError::BadNumber { .. })
        ));
        assert!(matches!(
            Identifier::parse("1501.0001"),
            Err(IdentifierError::BadNumber { .. })
        ));
    }

    #[test]
    fn new_style_rejects_dates_before_scheme() {
        assert!(matches!(
            Identifier::parse("0703.0001"),
            Err(IdentifierError::BadDate { .. })
        ));
        assert!(matches!(
            Identifier::parse("2113.00001"),
            Err(IdentifierError::BadDate { .. })
        ));
    }

    #[test]
    fn old_style_with_subject_class() {
        let id = Identifier::parse("math.AG/0101001v2").unwrap();
        assert_eq!(id.id(), "math/0101001");
        assert_eq!(id.archive(), "math");
        assert_eq!(id.filename(), "0101001");
        assert_eq!(id.yymm(), "0101");
        assert_eq!(id.version(), Some(2));
        assert!(id.is_old_style());
    }

    #[test]
    fn old_style_unknown_archive() {
        let err = Identifier::parse("bogus-ph/9901001").unwrap_err();
        assert!(err.to_string().contains("bogus-ph"));
    }

    #[test]
    fn old_style_date_window() {
        assert!(Identifier::parse("hep-th/9107001").is_ok());
        assert!(Identifier::parse("hep-th/0703001").is_ok());
        assert!(Identifier::parse("hep-th/9106001").is_err());
        assert!(Identifier::parse("hep-th/0704001").is_err());
    }

    #[test]
    fn version_zero_is_rejected() {
        assert!(matches!(
            Identifier::parse("2101.00001v0"),
            Err(IdentifierError::BadVersion { .. })
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = Identifier::parse("not-an-id").unwrap_err();
        assert_eq!(err, IdentifierError::Malformed("not-an-id".to_string()));
        assert!(err.to_string().contains("not-an-id"));
        assert_eq!(Identifier::parse("  ").unwrap_err(), IdentifierError::Empty);
    }
}
