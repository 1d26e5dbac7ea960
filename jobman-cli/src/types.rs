//! Common types used across CLI modules

use uuid::Uuid;

/// Identifier that can be either a full UUID or an unambiguous prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrPrefix {
    /// Full UUID
    Full(Uuid),
    /// Prefix that should uniquely identify a job
    Prefix(String),
}

impl IdOrPrefix {
    /// Parse a string into an IdOrPrefix
    ///
    /// Attempts to parse as a full UUID first, otherwise treats as a prefix
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Ok(uuid) = Uuid::parse_str(input) {
            IdOrPrefix::Full(uuid)
        } else {
            IdOrPrefix::Prefix(input.to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_uuid() {
        let id = IdOrPrefix::parse("0D7C2A5E-6A0E-4C55-9F55-3F8A0B3A1A11");
        assert!(matches!(id, IdOrPrefix::Full(_)));
    }

    #[test]
    fn test_parse_prefix() {
        let id = IdOrPrefix::parse(" 0D7C ");
        assert_eq!(id, IdOrPrefix::Prefix("0d7c".to_string()));
    }
}
