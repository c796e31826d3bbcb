//! In-process stand-in for [`StackitClient`].
//!
//! Each operation can be overridden with a closure. Without an override the
//! mock returns fixed values, so tests only stub what they care about.

use async_trait::async_trait;

use crate::convert::label_selector;
use crate::types::{CreateServerRequest, Labels, Nic, Server};
use crate::{Error, Result, StackitClient};

/// Id returned by the default `create_server`.
pub const MOCK_SERVER_ID: &str = "550e8400-e29b-41d4-a716-446655440000";
/// Name returned by the default `get_server`.
pub const MOCK_SERVER_NAME: &str = "test-machine";

pub type CreateServerFn =
    Box<dyn Fn(&str, &str, &CreateServerRequest) -> Result<Server> + Send + Sync>;
pub type ServerFn = Box<dyn Fn(&str, &str, &str) -> Result<Server> + Send + Sync>;
pub type DeleteServerFn = Box<dyn Fn(&str, &str, &str) -> Result<()> + Send + Sync>;
pub type ListServersFn =
    Box<dyn Fn(&str, &str, Option<&Labels>) -> Result<Vec<Server>> + Send + Sync>;
pub type NicsFn = Box<dyn Fn(&str, &str, &str) -> Result<Vec<Nic>> + Send + Sync>;
pub type UpdateNicFn =
    Box<dyn Fn(&str, &str, &str, &str, &[String]) -> Result<Nic> + Send + Sync>;

#[derive(Default)]
pub struct MockStackitClient {
    pub create_server: Option<CreateServerFn>,
    pub get_server: Option<ServerFn>,
    pub delete_server: Option<DeleteServerFn>,
    pub list_servers: Option<ListServersFn>,
    pub get_nics_for_server: Option<NicsFn>,
    pub update_nic: Option<UpdateNicFn>,
}

#[async_trait]
impl StackitClient for MockStackitClient {
    async fn create_server(
        &self,
        project_id: &str,
        region: &str,
        req: &CreateServerRequest,
    ) -> Result<Server> {
        if req.name.is_empty() {
            return Err(Error::InvalidRequest("server name must not be empty".into()));
        }
        if let Some(f) = &self.create_server {
            return f(project_id, region, req);
        }
        Ok(Server {
            id: MOCK_SERVER_ID.into(),
            name: req.name.clone(),
            status: "CREATING".into(),
            labels: req.labels.clone(),
        })
    }

    async fn get_server(&self, project_id: &str, region: &str, server_id: &str) -> Result<Server> {
        if let Some(f) = &self.get_server {
            return f(project_id, region, server_id);
        }
        Ok(Server {
            id: server_id.into(),
            name: MOCK_SERVER_NAME.into(),
            status: "ACTIVE".into(),
            labels: None,
        })
    }

    async fn delete_server(&self, project_id: &str, region: &str, server_id: &str) -> Result<()> {
        match &self.delete_server {
            Some(f) => f(project_id, region, server_id),
            None => Ok(()),
        }
    }

    async fn list_servers(
        &self,
        project_id: &str,
        region: &str,
        selector: Option<&Labels>,
    ) -> Result<Vec<Server>> {
        label_selector(selector)?;
        match &self.list_servers {
            Some(f) => f(project_id, region, selector),
            None => Ok(Vec::new()),
        }
    }

    async fn get_nics_for_server(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<Vec<Nic>> {
        match &self.get_nics_for_server {
            Some(f) => f(project_id, region, server_id),
            None => Ok(Vec::new()),
        }
    }

    async fn update_nic(
        &self,
        project_id: &str,
        region: &str,
        network_id: &str,
        nic_id: &str,
        allowed_addresses: &[String],
    ) -> Result<Nic> {
        if let Some(f) = &self.update_nic {
            return f(project_id, region, network_id, nic_id, allowed_addresses);
        }
        Ok(Nic {
            id: nic_id.into(),
            network_id: network_id.into(),
            allowed_addresses: allowed_addresses.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::is_not_found;

    fn not_found() -> Error {
        Error::Api(stackit_iaas::Error::Api {
            endpoint: "get server",
            status: stackit_iaas::StatusCode::NOT_FOUND,
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn defaults_are_canned() {
        let mock = MockStackitClient::default();

        let created = mock
            .create_server(
                "p1",
                "eu01",
                &CreateServerRequest {
                    name: "worker-1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, MOCK_SERVER_ID);
        assert_eq!(created.name, "worker-1");
        assert_eq!(created.status, "CREATING");

        let fetched = mock.get_server("p1", "eu01", "srv-9").await.unwrap();
        assert_eq!(fetched.id, "srv-9");
        assert_eq!(fetched.status, "ACTIVE");

        mock.delete_server("p1", "eu01", "srv-9").await.unwrap();
        assert!(mock.list_servers("p1", "eu01", None).await.unwrap().is_empty());
        assert!(mock
            .get_nics_for_server("p1", "eu01", "srv-9")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn empty_name_is_rejected_even_with_override() {
        let mock = MockStackitClient {
            create_server: Some(Box::new(
                |_: &str, _: &str, _: &CreateServerRequest| -> Result<Server> {
                    panic!("override must not run")
                },
            )),
            ..Default::default()
        };
        let err = mock
            .create_server("p1", "eu01", &CreateServerRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unusable_selector_is_rejected_like_the_real_client() {
        let mock = MockStackitClient::default();
        let selector: Labels = [("a".to_string(), "x,b=y".to_string())].into_iter().collect();
        let err = mock
            .list_servers("p1", "eu01", Some(&selector))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn update_nic_echoes_and_clears() {
        let mock = MockStackitClient::default();
        let nic = mock
            .update_nic("p1", "eu01", "net-1", "nic-1", &["10.0.0.0/24".to_string()])
            .await
            .unwrap();
        assert_eq!(nic.allowed_addresses, vec!["10.0.0.0/24".to_string()]);

        let cleared = mock
            .update_nic("p1", "eu01", "net-1", "nic-1", &[])
            .await
            .unwrap();
        assert_eq!(cleared.id, "nic-1");
        assert_eq!(cleared.network_id, "net-1");
        assert!(cleared.allowed_addresses.is_empty());
    }

    #[tokio::test]
    async fn overrides_take_effect_and_errors_classify() {
        let mock = MockStackitClient {
            get_server: Some(Box::new(|_: &str, _: &str, _: &str| -> Result<Server> {
                Err(not_found())
            })),
            list_servers: Some(Box::new(
                |_: &str, _: &str, selector: Option<&Labels>| -> Result<Vec<Server>> {
                    let role = selector.and_then(|s| s.get("role")).cloned();
                    Ok(vec![Server {
                        id: "srv-1".into(),
                        name: "a".into(),
                        status: "ACTIVE".into(),
                        labels: role.map(|r| [("role".to_string(), r)].into_iter().collect()),
                    }])
                },
            )),
            ..Default::default()
        };

        let err = mock.get_server("p1", "eu01", "gone").await.unwrap_err();
        assert!(is_not_found(Some(&err)));

        let selector: Labels = [("role".to_string(), "node".to_string())].into_iter().collect();
        let servers = mock.list_servers("p1", "eu01", Some(&selector)).await.unwrap();
        assert_eq!(servers[0].labels.as_ref().unwrap()["role"], "node");
    }

    #[tokio::test]
    async fn usable_behind_trait_object_across_tasks() {
        let client: Arc<dyn StackitClient> = Arc::new(MockStackitClient::default());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move {
                    client.get_server("p1", "eu01", &format!("srv-{i}")).await
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let server = handle.await.unwrap().unwrap();
            assert_eq!(server.id, format!("srv-{i}"));
        }
    }
}
