use std::collections::HashMap;

/// Provider-neutral labels, used for selection and bookkeeping.
pub type Labels = HashMap<String, String>;

/// Free-form metadata. Passed to the backend unexamined.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Point-in-time snapshot of a provisioned server.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    pub id: String,
    pub name: String,
    /// Backend lifecycle state, e.g. `CREATING` or `ACTIVE`.
    pub status: String,
    pub labels: Option<Labels>,
}

/// A network interface attached to a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nic {
    pub id: String,
    pub network_id: String,
    /// Extra source addresses the NIC may send from.
    pub allowed_addresses: Vec<String>,
}

/// Parameters for creating a server.
///
/// Everything except `name` is passed through to the backend. `None` leaves
/// the field unset on the wire, which is not the same as an empty value.
#[derive(Debug, Clone, Default)]
pub struct CreateServerRequest {
    pub name: String,
    pub machine_type: String,
    pub image_id: Option<String>,
    pub networking: Option<ServerNetworking>,
    pub security_groups: Option<Vec<String>>,
    /// Plain cloud-init user data; encoded for the wire by the client.
    pub user_data: Option<String>,
    pub boot_volume: Option<BootVolumeRequest>,
    pub volumes: Option<Vec<String>>,
    pub keypair_name: Option<String>,
    pub availability_zone: Option<String>,
    pub affinity_group: Option<String>,
    pub service_account_mails: Option<Vec<String>>,
    pub agent_provisioned: Option<bool>,
    pub labels: Option<Labels>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerNetworking {
    /// Let the backend create a NIC in this network.
    Network(String),
    /// Attach existing NICs.
    Nics(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct BootVolumeRequest {
    pub size_gb: Option<i64>,
    pub performance_class: Option<String>,
    pub delete_on_termination: Option<bool>,
    /// Image to boot from. Falls back to the request's `image_id`.
    pub source_image_id: Option<String>,
}
