/*!
 * Compat number negotiation.
 *
 * A compat number is `(major, minor[, build])`. The major part is a hard
 * contract boundary between two independently versioned components; the minor
 * part is soft and only fatal when the caller asks for strict matching (e.g.
 * FPGA images that must be feature-complete). The build part is never compared.
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::Logger;

/// A `(major, minor[, build])` compat number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompatNumber {
    /// Major compat number
    pub major: u32,
    /// Minor compat number
    pub minor: u32,
    /// Informational build number
    pub build: Option<u32>,
}

impl CompatNumber {
    /// Create a compat number without a build part
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
        }
    }

    /// Create a compat number with a build part
    pub const fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build: Some(build),
        }
    }

    /// Build a compat number from a slice of 2 or 3 components
    pub fn from_slice(parts: &[u32]) -> Result<Self> {
        match *parts {
            [major, minor] => Ok(Self::new(major, minor)),
            [major, minor, build] => Ok(Self::with_build(major, minor, build)),
            _ => Err(Error::format(format!(
                "Version {:?} has invalid format. Valid formats are \
                 (major, minor) or (major, minor, build)",
                parts
            ))),
        }
    }

    /// `major.minor`, the part of the number that takes part in comparisons
    fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for CompatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.build {
            Some(build) => write!(f, "{}.{}.{}", self.major, self.minor, build),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

impl FromStr for CompatNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .trim()
            .split('.')
            .map(|p| {
                p.parse::<u32>()
                    .map_err(|_| Error::format(format!("Invalid compat number '{}'", s)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_slice(&parts)
    }
}

impl TryFrom<&[u32]> for CompatNumber {
    type Error = Error;

    fn try_from(parts: &[u32]) -> Result<Self> {
        Self::from_slice(parts)
    }
}

impl From<(u32, u32)> for CompatNumber {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::new(major, minor)
    }
}

impl From<(u32, u32, u32)> for CompatNumber {
    fn from((major, minor, build): (u32, u32, u32)) -> Self {
        Self::with_build(major, minor, build)
    }
}

/// Outcome of a successful compat check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    /// Major and minor match
    Exact,
    /// The actual minor is newer than required
    MinorAhead,
    /// The actual minor is older than required, tolerated
    MinorBehind,
}

/// A configurable compat check against an expected compat number
pub struct CompatCheck<'a> {
    expected: CompatNumber,
    component: Option<&'a str>,
    fail_on_old_minor: bool,
    log: Option<&'a dyn Logger>,
}

impl<'a> CompatCheck<'a> {
    /// Create a check against `expected`
    pub fn new(expected: CompatNumber) -> Self {
        Self {
            expected,
            component: None,
            fail_on_old_minor: false,
            log: None,
        }
    }

    /// Name of the component being checked (e.g. "FPGA"), used in messages
    pub fn component(mut self, component: &'a str) -> Self {
        self.component = Some(component);
        self
    }

    /// Also fail when the actual minor is behind the expected minor
    pub fn fail_on_old_minor(mut self, fail: bool) -> Self {
        self.fail_on_old_minor = fail;
        self
    }

    /// Report intermediate steps and non-fatal mismatches to `log`
    pub fn logger(mut self, log: &'a dyn Logger) -> Self {
        self.log = Some(log);
        self
    }

    /// Check `actual` against the expected compat number
    pub fn check(&self, actual: CompatNumber) -> Result<Compatibility> {
        let expected = self.expected;
        let expected_actual = format!("Expected: {} Actual: {}", expected.short(), actual.short());
        let component = match self.component {
            Some(c) => format!(" for component '{}'", c),
            None => String::new(),
        };

        if actual.major != expected.major {
            let msg = format!("Major compat number mismatch{}: {}", component, expected_actual);
            if let Some(log) = self.log {
                log.error(&msg);
            }
            return Err(Error::version_mismatch(msg));
        }

        if actual.minor > expected.minor {
            if let Some(log) = self.log {
                log.debug(&format!(
                    "Minor compat ahead of expected compat{}. {}",
                    component, expected_actual
                ));
            }
            return Ok(Compatibility::MinorAhead);
        }

        if actual.minor < expected.minor {
            let msg = format!("Minor compat number mismatch{}: {}", component, expected_actual);
            if self.fail_on_old_minor {
                if let Some(log) = self.log {
                    log.error(&msg);
                }
                return Err(Error::version_mismatch(msg));
            }
            if let Some(log) = self.log {
                log.warning(&msg);
            }
            return Ok(Compatibility::MinorBehind);
        }

        Ok(Compatibility::Exact)
    }
}

/// Check whether `actual` is acceptable when `expected` is required.
///
/// Both slices must hold `(major, minor)` or `(major, minor, build)`, otherwise
/// a format error is returned before anything is logged. A differing major is
/// always a [`Error::VersionMismatch`]; an older minor is one only when
/// `fail_on_old_minor` is set and is logged as a warning otherwise.
pub fn check_compat(
    expected: &[u32],
    actual: &[u32],
    component: Option<&str>,
    fail_on_old_minor: bool,
    log: Option<&dyn Logger>,
) -> Result<Compatibility> {
    let expected = CompatNumber::from_slice(expected)?;
    let actual = CompatNumber::from_slice(actual)?;

    let mut check = CompatCheck::new(expected).fail_on_old_minor(fail_on_old_minor);
    if let Some(component) = component {
        check = check.component(component);
    }
    if let Some(log) = log {
        check = check.logger(log);
    }
    check.check(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::{Level, RecordingLogger};

    #[test]
    fn test_minor_ahead_logs_debug() {
        let log = RecordingLogger::default();
        let result = check_compat(&[4, 2], &[4, 3], None, false, Some(&log)).unwrap();
        assert_eq!(result, Compatibility::MinorAhead);

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, Level::Debug);
        assert!(records[0].1.contains("ahead"));
    }

    #[test]
    fn test_major_mismatch_always_fails() {
        for strict in [false, true] {
            let log = RecordingLogger::default();
            let err = check_compat(&[4, 2], &[5, 0], Some("FPGA"), strict, Some(&log)).unwrap_err();
            assert!(matches!(err, Error::VersionMismatch(_)));
            assert_eq!(
                err.to_string(),
                "Version mismatch: Major compat number mismatch for component 'FPGA': \
                 Expected: 4.2 Actual: 5.0"
            );
            assert_eq!(log.count(Level::Error), 1);
        }

        let err = check_compat(&[4, 2], &[3, 9, 1], None, false, None).unwrap_err();
        assert!(matches!(err, Error::VersionMismatch(_)));
    }

    #[test]
    fn test_old_minor_strict_fails() {
        let log = RecordingLogger::default();
        let err = check_compat(&[4, 2], &[4, 1], None, true, Some(&log)).unwrap_err();
        assert!(matches!(err, Error::VersionMismatch(_)));
        assert!(err.to_string().contains("Minor compat number mismatch: Expected: 4.2 Actual: 4.1"));
        assert_eq!(log.count(Level::Error), 1);
        assert_eq!(log.count(Level::Warning), 0);
    }

    #[test]
    fn test_old_minor_lenient_warns_once() {
        let log = RecordingLogger::default();
        let result = check_compat(&[4, 2], &[4, 1], Some("MB CPLD"), false, Some(&log)).unwrap();
        assert_eq!(result, Compatibility::MinorBehind);
        assert_eq!(log.count(Level::Warning), 1);
        assert_eq!(log.records().len(), 1);
    }

    #[test]
    fn test_equal_or_newer_minor_never_fails() {
        for major in 0..4 {
            for expected_minor in 0..5 {
                for actual_minor in expected_minor..expected_minor + 3 {
                    let result = check_compat(
                        &[major, expected_minor],
                        &[major, actual_minor, 99],
                        None,
                        true,
                        None,
                    );
                    assert!(result.is_ok());
                }
            }
        }
    }

    #[test]
    fn test_build_is_ignored() {
        let result = check_compat(&[1, 0, 5], &[1, 0, 700], None, true, None).unwrap();
        assert_eq!(result, Compatibility::Exact);
    }

    #[test]
    fn test_invalid_length_is_format_error() {
        let log = RecordingLogger::default();
        let err = check_compat(&[4], &[4, 2], None, false, Some(&log)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let err = check_compat(&[4, 2], &[4, 2, 0, 1], None, false, Some(&log)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_no_logger_is_silent() {
        assert!(check_compat(&[2, 3], &[2, 1], None, false, None).is_ok());
    }

    #[test]
    fn test_compat_check_builder() {
        let check = CompatCheck::new(CompatNumber::new(7, 4))
            .component("DB")
            .fail_on_old_minor(true);
        assert_eq!(check.check((7, 4, 12).into()).unwrap(), Compatibility::Exact);
        assert!(check.check((7, 3).into()).is_err());
    }

    #[test]
    fn test_parse_and_display() {
        let c: CompatNumber = "6.1".parse().unwrap();
        assert_eq!(c, CompatNumber::new(6, 1));
        assert_eq!(c.to_string(), "6.1");

        let c: CompatNumber = "6.1.42".parse().unwrap();
        assert_eq!(c.build, Some(42));
        assert_eq!(c.to_string(), "6.1.42");

        assert!(matches!("6".parse::<CompatNumber>(), Err(Error::Format(_))));
        assert!(matches!("6.x".parse::<CompatNumber>(), Err(Error::Format(_))));
    }
}
