use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loosely typed attribute map as the API stores labels and metadata.
pub type AttributeMap = HashMap<String, Value>;

// ── Servers ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub power_status: Option<String>,
    #[serde(default)]
    pub labels: Option<AttributeMap>,
    #[serde(default)]
    pub metadata: Option<AttributeMap>,
    #[serde(default)]
    pub nics: Option<Vec<ServerNic>>,
}

/// NIC summary embedded in a server response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerNic {
    pub nic_id: String,
    pub network_id: String,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServerPayload {
    pub name: String,
    pub machine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networking: Option<ServerNetworking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<String>>,
    /// Base64-encoded cloud-init user data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_volume: Option<BootVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keypair_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_mails: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<ServerAgent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<AttributeMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AttributeMap>,
}

/// Network attachment for a new server: either a network to create a NIC in,
/// or a list of pre-created NICs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerNetworking {
    #[serde(rename_all = "camelCase")]
    Network { network_id: String },
    #[serde(rename_all = "camelCase")]
    Nics { nic_ids: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootVolume {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_on_termination: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<BootVolumeSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootVolumeSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAgent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerListResponse {
    #[serde(default)]
    pub items: Vec<Server>,
}

// ── NICs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nic {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub allowed_addresses: Option<Vec<String>>,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub labels: Option<AttributeMap>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNicPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_addresses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NicListResponse {
    #[serde(default)]
    pub items: Vec<Nic>,
}
