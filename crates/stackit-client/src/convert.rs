//! Conversion between the provider-neutral model and the IaaS wire model.
//!
//! The wire model distinguishes an unset field from an empty one, and the
//! backend treats the two differently (no filter versus an empty filter).
//! Every helper here maps `None` to `None` and never collapses an empty
//! container into an unset one.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use stackit_iaas as iaas;

use crate::types::{CreateServerRequest, Labels, Metadata, Nic, Server, ServerNetworking};
use crate::{Error, Result};

/// Wrap a copy of `value` as an explicitly set optional field.
pub fn present<T: Clone>(value: &T) -> Option<T> {
    Some(value.clone())
}

/// Labels to the wire's loosely typed map. Every value becomes a JSON string.
pub fn labels_to_wire(labels: Option<&Labels>) -> Option<iaas::AttributeMap> {
    labels.map(|labels| {
        labels
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    })
}

/// Labels from the wire. Entries whose value is not a string (numbers,
/// booleans, nested values, nulls) are dropped.
pub fn labels_from_wire(wire: Option<&iaas::AttributeMap>) -> Option<Labels> {
    wire.map(|wire| {
        wire.iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k.clone(), s.clone())),
                _ => None,
            })
            .collect()
    })
}

/// An empty sequence stays present.
pub fn string_sequence_to_wire(seq: Option<&[String]>) -> Option<Vec<String>> {
    seq.map(<[String]>::to_vec)
}

/// Metadata is moved into the payload as is.
pub fn metadata_to_wire(metadata: Option<Metadata>) -> Option<iaas::AttributeMap> {
    metadata
}

/// Render labels as the API's `key=value,...` selector. Keys are sorted so
/// the query string is stable. No labels means no selector.
///
/// The selector syntax has no escaping, so a key or value containing `,` or
/// `=`, or an empty key, is rejected instead of turning into another filter.
pub fn label_selector(labels: Option<&Labels>) -> Result<Option<String>> {
    let Some(labels) = labels.filter(|l| !l.is_empty()) else {
        return Ok(None);
    };

    let mut pairs = Vec::with_capacity(labels.len());
    for (k, v) in labels {
        if k.is_empty() || k.contains([',', '=']) || v.contains([',', '=']) {
            return Err(Error::InvalidRequest(format!(
                "label {k:?}={v:?} cannot be used in a label selector"
            )));
        }
        pairs.push(format!("{k}={v}"));
    }
    pairs.sort();
    Ok(Some(pairs.join(",")))
}

pub(crate) fn create_request_to_wire(req: &CreateServerRequest) -> iaas::CreateServerPayload {
    let networking = req.networking.as_ref().map(|n| match n {
        ServerNetworking::Network(id) => iaas::ServerNetworking::Network {
            network_id: id.clone(),
        },
        ServerNetworking::Nics(ids) => iaas::ServerNetworking::Nics {
            nic_ids: ids.clone(),
        },
    });

    let boot_volume = req.boot_volume.as_ref().map(|bv| iaas::BootVolume {
        size: bv.size_gb,
        performance_class: bv.performance_class.clone(),
        delete_on_termination: bv.delete_on_termination,
        source: bv
            .source_image_id
            .as_ref()
            .or(req.image_id.as_ref())
            .map(|id| iaas::BootVolumeSource {
                kind: "image".into(),
                id: id.clone(),
            }),
    });

    // The API rejects imageId next to an image-sourced boot volume.
    let image_id = match &boot_volume {
        Some(bv) if bv.source.is_some() => None,
        _ => req.image_id.clone(),
    };

    iaas::CreateServerPayload {
        name: req.name.clone(),
        machine_type: req.machine_type.clone(),
        image_id,
        networking,
        security_groups: string_sequence_to_wire(req.security_groups.as_deref()),
        user_data: req.user_data.as_ref().map(|data| STANDARD.encode(data)),
        boot_volume,
        volumes: string_sequence_to_wire(req.volumes.as_deref()),
        keypair_name: req.keypair_name.clone(),
        availability_zone: req.availability_zone.clone(),
        affinity_group: req.affinity_group.clone(),
        service_account_mails: string_sequence_to_wire(req.service_account_mails.as_deref()),
        agent: req.agent_provisioned.map(|provisioned| iaas::ServerAgent {
            provisioned: Some(provisioned),
        }),
        labels: labels_to_wire(req.labels.as_ref()),
        metadata: metadata_to_wire(req.metadata.clone()),
    }
}

pub(crate) fn server_from_wire(server: iaas::Server) -> Server {
    Server {
        labels: labels_from_wire(server.labels.as_ref()),
        id: server.id.unwrap_or_default(),
        name: server.name,
        status: server.status.unwrap_or_default(),
    }
}

pub(crate) fn nic_from_wire(nic: iaas::Nic) -> Nic {
    Nic {
        id: nic.id.unwrap_or_default(),
        network_id: nic.network_id.unwrap_or_default(),
        allowed_addresses: nic.allowed_addresses.unwrap_or_default(),
    }
}
