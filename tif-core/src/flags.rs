use std::collections::BTreeSet;
use std::fmt;

/// Marks an entry the ledger generated on its own (vacation grants, penalty debits).
pub const AUTO: char = 'a';

/// The provenance tags carried by a ledger entry, e.g. `a` for automatically generated.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Flags(BTreeSet<char>);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flags of an automatically generated entry.
    pub fn auto() -> Self {
        Flags::from(AUTO)
    }

    pub fn is_auto(&self) -> bool {
        self.contains(AUTO)
    }

    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<char> for Flags {
    fn from(c: char) -> Self {
        Flags(std::iter::once(c).collect())
    }
}

impl From<&str> for Flags {
    fn from(s: &str) -> Self {
        Flags(s.chars().collect())
    }
}

impl From<String> for Flags {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_from_str() {
        let flags = Flags::from("ba");
        assert!(flags.is_auto());
        assert!(flags.contains('b'));
        assert_eq!(flags.to_string(), "ab");
        assert!(Flags::from("").is_empty());
    }
}
