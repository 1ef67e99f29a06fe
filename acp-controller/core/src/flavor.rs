use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Selects the matching engine the backend applies to a resource's fields.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Exact,
    Glob,
    Regex,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid flavor {0:?}; expected one of exact, glob, regex")]
pub struct InvalidFlavor(String);

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Glob => "glob",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = InvalidFlavor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "glob" => Ok(Self::Glob),
            "regex" => Ok(Self::Regex),
            s => Err(InvalidFlavor(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        for flavor in [Flavor::Exact, Flavor::Glob, Flavor::Regex] {
            assert_eq!(flavor.to_string().parse::<Flavor>().unwrap(), flavor);
        }
        assert!("fuzzy".parse::<Flavor>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Flavor::Regex).unwrap(), r#""regex""#);
    }
}
