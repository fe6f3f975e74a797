//! Package info schema.
//!
//! `package.json` inside an archive and every manifest entry carry a
//! `package_info` object. Required fields are checked at parse time; unknown
//! fields are preserved. The derived `is_*` flags are never stored.

use super::version::PackageVersion;
use crate::{PackageError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys computed at query time; stripped from anything we parse.
const DERIVED_KEYS: &[&str] = &["is_installed", "is_active", "is_bundled"];

/// Validated package metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPackageInfo")]
pub struct PackageInfo {
    pub package_id: String,
    pub package_version: String,
    pub package_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Everything else the author put in `package.json`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Unvalidated form used only for deserialization.
#[derive(Deserialize)]
struct RawPackageInfo {
    package_id: Option<String>,
    package_version: Option<Value>,
    package_type: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn missing(field: &str) -> PackageError {
    PackageError::InvalidPackageInfo {
        field: field.to_string(),
        message: "missing or empty".to_string(),
    }
}

impl TryFrom<RawPackageInfo> for PackageInfo {
    type Error = PackageError;

    fn try_from(raw: RawPackageInfo) -> Result<Self> {
        let package_id = raw
            .package_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| missing("package_id"))?;
        validate_package_id(&package_id)?;

        // Some authors write numeric versions (`"package_version": 1.0`).
        let package_version = match raw.package_version {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(_) | None => return Err(missing("package_version")),
        };
        PackageVersion::parse(&package_version).map_err(|_| PackageError::InvalidPackageInfo {
            field: "package_version".to_string(),
            message: format!("unparseable version {:?}", package_version),
        })?;

        let package_type = raw
            .package_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| missing("package_type"))?;

        let mut extra = raw.extra;
        for key in DERIVED_KEYS {
            extra.remove(*key);
        }

        Ok(Self {
            package_id,
            package_version,
            package_type,
            display_name: raw.display_name,
            description: raw.description,
            website: raw.website,
            extra,
        })
    }
}

/// Ids become directory names, so they must be a single path component.
fn validate_package_id(id: &str) -> Result<()> {
    let bad = id == "."
        || id == ".."
        || id.contains('/')
        || id.contains('\\')
        || id.contains('\0');
    if bad {
        return Err(PackageError::InvalidPackageInfo {
            field: "package_id".to_string(),
            message: format!("{:?} is not a valid directory name", id),
        });
    }
    Ok(())
}

impl PackageInfo {
    /// Parse and validate from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawPackageInfo = serde_json::from_slice(bytes).map_err(|e| PackageError::Json {
            message: format!("Failed to parse package info: {}", e),
            source: Some(e),
        })?;
        Self::try_from(raw)
    }

    pub fn version(&self) -> Result<PackageVersion> {
        PackageVersion::parse(&self.package_version)
    }

    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.package_id)
    }
}

/// Package info annotated with live status, as returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstalledPackageInfo {
    #[serde(flatten)]
    pub info: PackageInfo,
    pub is_installed: bool,
    pub is_active: bool,
    pub is_bundled: bool,
}

impl InstalledPackageInfo {
    pub fn package_id(&self) -> &str {
        &self.info.package_id
    }

    pub fn package_type(&self) -> &str {
        &self.info.package_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let info = PackageInfo::from_slice(
            br#"{"package_id": "Toolbox", "package_version": "1.0", "package_type": "plugin"}"#,
        )
        .unwrap();
        assert_eq!(info.package_id, "Toolbox");
        assert_eq!(info.name(), "Toolbox");
        assert!(info.extra.is_empty());
    }

    #[test]
    fn test_extra_fields_preserved_and_flags_stripped() {
        let info = PackageInfo::from_slice(
            br#"{"package_id": "A", "package_version": "2.1.0", "package_type": "material",
                "display_name": "Alpha", "author": {"author_id": "x"}, "is_installed": true,
                "is_bundled": false}"#,
        )
        .unwrap();
        assert_eq!(info.name(), "Alpha");
        assert!(info.extra.contains_key("author"));
        assert!(!info.extra.contains_key("is_installed"));
        assert!(!info.extra.contains_key("is_bundled"));

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["author"]["author_id"], "x");
        assert!(json.get("is_installed").is_none());
    }

    #[test]
    fn test_numeric_version_accepted() {
        let info = PackageInfo::from_slice(
            br#"{"package_id": "A", "package_version": 3, "package_type": "plugin"}"#,
        )
        .unwrap();
        assert_eq!(info.package_version, "3");
    }

    #[test]
    fn test_missing_required_field_is_typed_error() {
        let err = PackageInfo::from_slice(br#"{"package_id": "A", "package_version": "1.0"}"#)
            .unwrap_err();
        match err {
            PackageError::InvalidPackageInfo { field, message } => {
                assert_eq!(field, "package_type");
                assert_eq!(message, "missing or empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let cases: [&[u8]; 3] = [b"{ not json", b"42", br#"{"package_id": 5}"#];
        for bad in cases {
            assert!(
                matches!(PackageInfo::from_slice(bad), Err(PackageError::Json { .. })),
                "{:?} should be a JSON error",
                String::from_utf8_lossy(bad)
            );
        }
    }

    #[test]
    fn test_bad_id_rejected() {
        let err = PackageInfo::from_slice(
            br#"{"package_id": "../evil", "package_version": "1.0", "package_type": "plugin"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PackageError::InvalidPackageInfo { ref field, .. } if field == "package_id"));
    }

    #[test]
    fn test_bad_version_rejected() {
        let err = PackageInfo::from_slice(
            br#"{"package_id": "A", "package_version": "soon", "package_type": "plugin"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PackageError::InvalidPackageInfo { ref field, .. } if field == "package_version"));
    }
}
