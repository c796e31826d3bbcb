use async_trait::async_trait;
use stackit_iaas::{Configuration, IaasClient, UpdateNicPayload};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::convert::{
    create_request_to_wire, label_selector, nic_from_wire, server_from_wire,
    string_sequence_to_wire,
};
use crate::types::{CreateServerRequest, Labels, Nic, Server};
use crate::{Error, Result, StackitClient};

/// [`StackitClient`] backed by the STACKIT IaaS API.
///
/// Holds one [`IaasClient`] for its whole lifetime; all operations share it.
#[derive(Clone)]
pub struct SdkStackitClient {
    iaas: IaasClient,
}

/// Build a client for one service-account key.
///
/// With `config.no_auth` set the key is ignored, whatever it contains.
/// Otherwise it must be a complete service-account key; anything else fails
/// with [`Error::ClientCreation`]. Each call builds an independent client.
pub fn new_stackit_client(
    service_account_key: &str,
    config: &ClientConfig,
) -> Result<SdkStackitClient> {
    let iaas_config = if config.no_auth {
        warn!("stackit: authentication disabled, ignoring service account key");
        Configuration::without_authentication()
    } else {
        Configuration::with_service_account_key(service_account_key)
            .map_err(Error::ClientCreation)?
    };

    let iaas_config = match &config.iaas_endpoint {
        Some(endpoint) => {
            warn!(endpoint = %endpoint, "stackit: overriding default IaaS endpoint");
            iaas_config.endpoint(endpoint)
        }
        None => iaas_config,
    };

    let iaas_config = match &config.token_endpoint {
        Some(endpoint) => iaas_config.token_endpoint(endpoint),
        None => iaas_config,
    };

    let iaas = IaasClient::new(iaas_config).map_err(Error::ClientCreation)?;
    debug!(base_url = iaas.base_url(), "stackit: client ready");

    Ok(SdkStackitClient { iaas })
}

impl SdkStackitClient {
    pub fn iaas(&self) -> &IaasClient {
        &self.iaas
    }
}

#[async_trait]
impl StackitClient for SdkStackitClient {
    async fn create_server(
        &self,
        project_id: &str,
        region: &str,
        req: &CreateServerRequest,
    ) -> Result<Server> {
        if req.name.is_empty() {
            return Err(Error::InvalidRequest("server name must not be empty".into()));
        }

        let payload = create_request_to_wire(req);
        let server = self.iaas.create_server(project_id, region, &payload).await?;
        let server = server_from_wire(server);

        info!(
            project_id,
            region,
            server_id = %server.id,
            status = %server.status,
            "stackit: server created"
        );

        Ok(server)
    }

    async fn get_server(&self, project_id: &str, region: &str, server_id: &str) -> Result<Server> {
        let server = self.iaas.get_server(project_id, region, server_id).await?;
        debug!(project_id, region, server_id, "stackit: server fetched");
        Ok(server_from_wire(server))
    }

    async fn delete_server(&self, project_id: &str, region: &str, server_id: &str) -> Result<()> {
        self.iaas.delete_server(project_id, region, server_id).await?;
        info!(project_id, region, server_id, "stackit: server deleted");
        Ok(())
    }

    async fn list_servers(
        &self,
        project_id: &str,
        region: &str,
        selector: Option<&Labels>,
    ) -> Result<Vec<Server>> {
        let selector = label_selector(selector)?;
        let resp = self
            .iaas
            .list_servers(project_id, region, selector.as_deref())
            .await?;

        debug!(
            project_id,
            region,
            selector = selector.as_deref().unwrap_or(""),
            count = resp.items.len(),
            "stackit: servers listed"
        );

        Ok(resp.items.into_iter().map(server_from_wire).collect())
    }

    async fn get_nics_for_server(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<Vec<Nic>> {
        let resp = self
            .iaas
            .list_server_nics(project_id, region, server_id)
            .await?;

        debug!(
            project_id,
            region,
            server_id,
            count = resp.items.len(),
            "stackit: server nics listed"
        );

        Ok(resp.items.into_iter().map(nic_from_wire).collect())
    }

    async fn update_nic(
        &self,
        project_id: &str,
        region: &str,
        network_id: &str,
        nic_id: &str,
        allowed_addresses: &[String],
    ) -> Result<Nic> {
        let payload = UpdateNicPayload {
            allowed_addresses: string_sequence_to_wire(Some(allowed_addresses)),
        };

        let nic = self
            .iaas
            .update_nic(project_id, region, network_id, nic_id, &payload)
            .await?;

        info!(
            project_id,
            region,
            network_id,
            nic_id,
            allowed = allowed_addresses.len(),
            "stackit: nic allowed addresses updated"
        );

        Ok(nic_from_wire(nic))
    }
}
