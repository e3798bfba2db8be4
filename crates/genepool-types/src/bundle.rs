use serde::{Deserialize, Serialize};

use crate::asset::{Capsule, EvolutionEvent, Gene};
use crate::plan::ValidationPlan;

/// Archive format of a submitted bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleFormat {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl std::fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleFormat::Zip => write!(f, "zip"),
            BundleFormat::TarGz => write!(f, "tar.gz"),
        }
    }
}

/// A submitted bundle after decoding: the gene it contributes, optionally a
/// capsule and a provenance event, plus loose supporting artifacts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedBundle {
    pub gene: Gene,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule: Option<Capsule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EvolutionEvent>,
    #[serde(default)]
    pub artifacts: BundleArtifacts,
}

/// Supporting artifacts carried alongside the structured assets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_plan: Option<ValidationPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_report: Option<Vec<u8>>,
    #[serde(default)]
    pub logs: Vec<Vec<u8>>,
}

/// Output of the hash-verify stage: every declared content id re-derived
/// from canonical bytes and confirmed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifiedAssets {
    pub gene_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub hash_verified: bool,
    pub canonical_hashes: CanonicalHashes,
}

/// The re-derived `sha256:` ids, kept for audit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalHashes {
    pub gene: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_format_wire_values() {
        assert_eq!(serde_json::to_string(&BundleFormat::Zip).unwrap(), "\"zip\"");
        assert_eq!(
            serde_json::to_string(&BundleFormat::TarGz).unwrap(),
            "\"tar.gz\""
        );
        let parsed: BundleFormat = serde_json::from_str("\"tar.gz\"").unwrap();
        assert_eq!(parsed, BundleFormat::TarGz);
    }

    #[test]
    fn empty_artifacts_serialize_compactly() {
        let artifacts = BundleArtifacts::default();
        let json = serde_json::to_string(&artifacts).unwrap();
        assert_eq!(json, "{\"logs\":[]}");
    }
}
