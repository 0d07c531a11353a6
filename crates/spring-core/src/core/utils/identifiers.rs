use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SEPARATOR_INDEX: usize = 4;
const MIN_IDENTIFIER_LEN: usize = 6;
const ENTRY_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid template identifier '{0}': expected the `PDB_CHAIN` form")]
pub struct InvalidIdentifier(pub String);

/// A template chain identifier of the form `PDB_CHAIN`, e.g. `1abc_A`.
///
/// The first four characters name the deposited structure, the character after the
/// underscore names the chain within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn parse(identifier: &str) -> Result<Self, InvalidIdentifier> {
        let identifier = identifier.trim();
        let valid = identifier.is_ascii()
            && identifier.len() >= MIN_IDENTIFIER_LEN
            && identifier.as_bytes()[SEPARATOR_INDEX] == b'_';
        if valid {
            Ok(Self(identifier.to_string()))
        } else {
            Err(InvalidIdentifier(identifier.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lower-cased four-letter structure code.
    pub fn code(&self) -> String {
        structure_code(&self.0)
    }

    /// The chain label, the single character after the underscore.
    pub fn chain(&self) -> String {
        self.0[SEPARATOR_INDEX + 1..SEPARATOR_INDEX + 2].to_string()
    }
}

impl FromStr for TemplateId {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the lower-cased four-letter code, skipping a leading `pdb` prefix.
pub fn structure_code(identifier: &str) -> String {
    let stripped = identifier.strip_prefix("pdb").unwrap_or(identifier);
    stripped.chars().take(4).collect::<String>().to_lowercase()
}

/// Builds the content-store entry name for a structure code.
///
/// `pattern` contains a `{}` placeholder for the code, and a configured compression
/// suffix is appended after a dot.
pub fn entry_name(pattern: &str, code: &str, compression: Option<&str>) -> String {
    let base = pattern.replacen(ENTRY_PLACEHOLDER, code, 1);
    match compression {
        Some(suffix) => format!("{}.{}", base, suffix),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_identifiers() {
        let id = TemplateId::parse("1ABC_B").unwrap();
        assert_eq!(id.as_str(), "1ABC_B");
        assert_eq!(id.code(), "1abc");
        assert_eq!(id.chain(), "B");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id: TemplateId = "  2xyz_C \n".parse().unwrap();
        assert_eq!(id.to_string(), "2xyz_C");
    }

    #[test]
    fn longer_identifiers_keep_only_first_chain_character() {
        let id = TemplateId::parse("3def_AB").unwrap();
        assert_eq!(id.chain(), "A");
    }

    #[test]
    fn rejects_short_or_unseparated_identifiers() {
        assert!(TemplateId::parse("1abc_").is_err());
        assert!(TemplateId::parse("1abcdA").is_err());
        assert!(TemplateId::parse("").is_err());
        assert_eq!(
            TemplateId::parse("1abc-A").unwrap_err(),
            InvalidIdentifier("1abc-A".to_string())
        );
    }

    #[test]
    fn structure_code_strips_pdb_prefix() {
        assert_eq!(structure_code("pdb1ABC.ent"), "1abc");
        assert_eq!(structure_code("7XYZ_A"), "7xyz");
        assert_eq!(structure_code("ab"), "ab");
    }

    #[test]
    fn entry_name_substitutes_code_and_appends_compression() {
        assert_eq!(entry_name("pdb{}.ent", "1abc", None), "pdb1abc.ent");
        assert_eq!(entry_name("pdb{}.ent", "1abc", Some("gz")), "pdb1abc.ent.gz");
        assert_eq!(entry_name("{}.pdb", "9zzz", None), "9zzz.pdb");
    }
}
