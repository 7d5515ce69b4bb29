use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Management channel that currently owns a rule's definition
///
/// Stored as `""`, `"api"` or `"file"`. A rule starts unmanaged (`None`) or
/// is claimed at creation time; once claimed by `Api` or `File` it stays with
/// that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provenance {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "api")]
    Api,
    #[serde(rename = "file")]
    File,
}

impl Provenance {
    /// Every provenance value, in lattice order
    pub const ALL: [Provenance; 3] = [Provenance::None, Provenance::Api, Provenance::File];

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::None => "",
            Provenance::Api => "api",
            Provenance::File => "file",
        }
    }

    /// Parse the storage representation
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "" => Some(Provenance::None),
            "api" => Some(Provenance::Api),
            "file" => Some(Provenance::File),
            _ => None,
        }
    }

    /// Whether a rule owned by `self` may be rewritten under `target`
    ///
    /// Unmanaged rules may be claimed by any channel; managed rules only
    /// accept writes from their own channel.
    pub fn can_transition_to(self, target: Provenance) -> bool {
        self == target || self == Provenance::None
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::None => write!(f, "none"),
            Provenance::Api => write!(f, "api"),
            Provenance::File => write!(f, "file"),
        }
    }
}

impl FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Provenance::None),
            "api" => Ok(Provenance::Api),
            "file" => Ok(Provenance::File),
            other => Err(format!(
                "unknown provenance '{}', expected one of: none, api, file",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_representation_round_trips() {
        for p in Provenance::ALL {
            assert_eq!(Provenance::from_stored(p.as_str()), Some(p));
        }
        assert_eq!(Provenance::from_stored("API"), None);
    }

    #[test]
    fn test_parse_accepts_human_names() {
        assert_eq!("none".parse::<Provenance>(), Ok(Provenance::None));
        assert_eq!("".parse::<Provenance>(), Ok(Provenance::None));
        assert_eq!("API".parse::<Provenance>(), Ok(Provenance::Api));
        assert_eq!(" file ".parse::<Provenance>(), Ok(Provenance::File));
        assert!("gitops".parse::<Provenance>().is_err());
    }

    #[test]
    fn test_serde_uses_stored_representation() {
        assert_eq!(serde_json::to_string(&Provenance::None).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&Provenance::Api).unwrap(), "\"api\"");
        let parsed: Provenance = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(parsed, Provenance::File);
    }
}
