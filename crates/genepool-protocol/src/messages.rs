use genepool_types::{BundleFormat, Decision, RiskLevel, SubmitMode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `hello`: node registration and heartbeat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Operations the node intends to use, e.g. `publish`, `fetch`, `report`.
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_fingerprint: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HelloResponse {
    pub node_id: String,
    /// `registered` for a first contact, `updated` for a refresh.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_code: Option<String>,
}

/// `publish`: submit a bundle for admission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishPayload {
    pub bundle_format: BundleFormat,
    pub bundle_bytes_base64: String,
    /// `sha256:`-prefixed hash of the archive bytes.
    pub bundle_hash: String,
    pub project: String,
    pub namespace: String,
    pub submit_mode: SubmitMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    /// `accepted` or `rejected`.
    pub status: String,
    pub candidate_asset_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_pipeline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PollHint>,
}

/// Where the submitter should poll for the gate outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollHint {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl PollHint {
    pub fn poll(url: impl Into<String>) -> Self {
        Self {
            kind: "poll".into(),
            url: url.into(),
        }
    }
}

/// `fetch`: query promoted assets for reuse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchPayload {
    pub project: String,
    pub namespace: String,
    pub query: FetchQuery,
    pub limit: u32,
    #[serde(default)]
    pub include_candidate: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_fingerprint: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level_max: Option<RiskLevel>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub assets: Vec<CapsuleSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapsuleSummary {
    pub asset_id: String,
    pub gene_id: String,
    pub summary: String,
    pub confidence: f64,
    pub success_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_fingerprint: Option<Map<String, Value>>,
}

/// `report`: a consumer reports the outcome of reusing a capsule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub target_capsule_id: String,
    pub consumer_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_fingerprint: Option<Map<String, Value>>,
    /// `success` or `failure`.
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub status: String,
}

/// `decision`: a reviewer resolves a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub asset_id: String,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub reviewer_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub status: String,
    pub asset_status: Decision,
}

/// `revoke`: pull a previously promoted asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevokePayload {
    pub asset_id: String,
    pub reason: String,
    pub revoker_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub status: String,
    pub broadcast: bool,
}
