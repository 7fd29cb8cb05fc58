use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a catalog entry.
///
/// The catalog hands out decimal strings (`"1"`, `"2"`, ...) but any
/// non-blank string is a valid id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HanjaId(String);

impl HanjaId {
    /// Creates a new `HanjaId`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the value is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "HanjaId".to_string(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Builds the id for a numeric catalog position.
    #[must_use]
    pub fn from_number(n: u64) -> Self {
        Self(n.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, when it is a decimal string.
    #[must_use]
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Ordering key that sorts numeric ids numerically and everything else after them.
    #[must_use]
    pub fn sort_key(&self) -> (u64, &str) {
        (self.numeric().unwrap_or(u64::MAX), self.0.as_str())
    }
}

/// Display name used verbatim as the progress owner.
///
/// There is no account model; a blank name falls back to `"default"`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub const DEFAULT: &'static str = "default";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Self::default()
        } else {
            Self(name)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Debug for HanjaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HanjaId({})", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for HanjaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for parsing an id from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl TryFrom<String> for HanjaId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HanjaId> for String {
    fn from(id: HanjaId) -> Self {
        id.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl FromStr for HanjaId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for UserId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hanja_id_trims_and_rejects_blank() {
        assert_eq!(HanjaId::new("  7 ").unwrap().as_str(), "7");
        assert!(HanjaId::new("   ").is_err());
    }

    #[test]
    fn numeric_ids_sort_numerically() {
        let mut ids = vec![
            HanjaId::from_number(10),
            HanjaId::new("x").unwrap(),
            HanjaId::from_number(2),
        ];
        ids.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let raw: Vec<_> = ids.iter().map(HanjaId::as_str).collect();
        assert_eq!(raw, vec!["2", "10", "x"]);
    }

    #[test]
    fn blank_user_falls_back_to_default() {
        assert_eq!(UserId::new("").as_str(), "default");
        assert_eq!(UserId::new("  ").as_str(), "default");
        assert_eq!(UserId::new("민지").as_str(), "민지");
        let parsed: UserId = "".parse().unwrap();
        assert_eq!(parsed, UserId::default());
    }

    #[test]
    fn id_roundtrip() {
        let original = HanjaId::from_number(42);
        let deserialized: HanjaId = original.to_string().parse().unwrap();
        assert_eq!(original, deserialized);
    }
}
