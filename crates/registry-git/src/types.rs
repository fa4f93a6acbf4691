//! Value types shared between the [`GitRepo`](crate::GitRepo) trait and its
//! callers. No gix types leak through here.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// GitOid
// ---------------------------------------------------------------------------

/// A git object identifier (SHA-1, 20 bytes).
///
/// Displays as 40 lowercase hex characters, which is the form written into
/// the `git-tree` field of version files.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GitOid([u8; 20]);

impl GitOid {
    /// Create a `GitOid` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitOid({self})")
    }
}

impl FromStr for GitOid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 {
            return Err(OidParseError {
                value: s.to_owned(),
                reason: format!("expected 40 hex characters, got {}", s.len()),
            });
        }
        let mut bytes = [0u8; 20];
        for (slot, chunk) in bytes.iter_mut().zip(s.as_bytes().chunks(2)) {
            let hi = hex_digit(chunk[0]);
            let lo = hex_digit(chunk[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => *slot = (hi << 4) | lo,
                _ => {
                    return Err(OidParseError {
                        value: s.to_owned(),
                        reason: "contains a non-hex character".to_owned(),
                    });
                }
            }
        }
        Ok(Self(bytes))
    }
}

/// Error from parsing a hex string into a [`GitOid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OidParseError {
    /// The raw value that failed.
    pub value: String,
    /// Why it failed.
    pub reason: String,
}

impl fmt::Display for OidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OID {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for OidParseError {}

const fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ExecutionMode
// ---------------------------------------------------------------------------

/// Whether commit-creating git commands actually run.
///
/// `DryRun` suppresses only `commit` and `amend`; staging, file writes and
/// tree-hash reads behave exactly as in `Live`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Run every git command.
    #[default]
    Live,
    /// Log commit commands instead of running them.
    DryRun,
}

impl ExecutionMode {
    /// Build from the `--dry-run` flag.
    #[must_use]
    pub const fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Live }
    }

    /// Returns `true` for [`ExecutionMode::DryRun`].
    #[must_use]
    pub const fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::DryRun => write!(f, "dry-run"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_parse_and_display() {
        let hex = "0123456789abcdef0123456789abcdef01234567";
        let oid: GitOid = hex.parse().unwrap();
        assert_eq!(oid.to_string(), hex);
        assert_eq!(oid.to_hex(), hex);
    }

    #[test]
    fn oid_parse_uppercase_normalizes() {
        let oid: GitOid = "ABCDEF0123456789ABCDEF0123456789ABCDEF01".parse().unwrap();
        assert_eq!(oid.to_string(), "abcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn oid_parse_rejects_bad_input() {
        assert!("abc".parse::<GitOid>().is_err());
        let err = "g".repeat(40).parse::<GitOid>().unwrap_err();
        assert!(err.reason.contains("non-hex"));
    }

    #[test]
    fn execution_mode_from_flag() {
        assert_eq!(ExecutionMode::from_dry_run(true), ExecutionMode::DryRun);
        assert_eq!(ExecutionMode::from_dry_run(false), ExecutionMode::Live);
        assert!(ExecutionMode::DryRun.is_dry_run());
        assert!(!ExecutionMode::default().is_dry_run());
        assert_eq!(ExecutionMode::DryRun.to_string(), "dry-run");
    }
}
