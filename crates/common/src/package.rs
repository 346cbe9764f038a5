use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maven-style coordinates identifying one module or dependency artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl PackageId {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid package coordinates `{0}`, expected `group:artifact:version`")]
pub struct PackageIdError(pub String);

impl FromStr for PackageId {
    type Err = PackageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), Some(version), None)
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(group, artifact, version))
            }
            _ => Err(PackageIdError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let id: PackageId = "com.acme:acme-core:1.2.0".parse().unwrap();
        assert_eq!(id.group, "com.acme");
        assert_eq!(id.artifact, "acme-core");
        assert_eq!(id.version, "1.2.0");
        assert_eq!(id.to_string(), "com.acme:acme-core:1.2.0");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("com.acme:acme-core".parse::<PackageId>().is_err());
        assert!("a:b:c:d".parse::<PackageId>().is_err());
        assert!("::1.0".parse::<PackageId>().is_err());
    }
}
