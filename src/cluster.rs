use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ClientError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    #[serde(default)]
    pub usage: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodMetricsItem {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub containers: Vec<ContainerMetrics>,
}

#[derive(Debug, Deserialize)]
pub struct PodMetricsList {
    #[serde(default)]
    pub items: Vec<PodMetricsItem>,
}

/// Read-only view of the target cluster. Timeouts are the implementation's concern.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Network plugin in use, e.g. `OpenShiftSDN` or `OVNKubernetes`.
    async fn network_type(&self) -> Result<String, ClientError>;

    async fn list_pod_metrics(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodMetricsItem>, ClientError>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError>;
}

/// Scoped lifecycle of the client used for one investigation run.
#[async_trait]
pub trait ClusterClientFactory: Send + Sync {
    async fn connect(&self, cluster_id: &str, name: &str) -> Result<Arc<dyn ClusterApi>, ClientError>;

    async fn cleanup(&self, cluster_id: &str, name: &str) -> Result<(), ClientError>;
}

pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn network_type(&self) -> Result<String, ClientError> {
        // oc get network.config.openshift.io cluster
        let gvk = GroupVersionKind::gvk("config.openshift.io", "v1", "Network");
        let resource = ApiResource::from_gvk(&gvk);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
        let network = api.get("cluster").await?;
        network_type_from_config(&network.data).ok_or_else(|| {
            ClientError::Unavailable("cluster network config has no networkType".to_string())
        })
    }

    async fn list_pod_metrics(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodMetricsItem>, ClientError> {
        let path = pod_metrics_path(namespace, label_selector);
        debug!("GET {}", path);
        let req = http::Request::builder()
            .method("GET")
            .uri(path)
            .body(Vec::new())?;
        let list: PodMetricsList = self.client.request(req).await?;
        Ok(list.items)
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError> {
        let pod_api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = pod_api.list(&ListParams::default()).await?;
        Ok(pods.items)
    }
}

/// Builds clients from the ambient kubeconfig and tracks one per `(cluster_id, name)`.
///
/// `cluster_id` only keys the registry: every client talks to whatever cluster the kubeconfig
/// points at, so one factory serves one cluster. Runs sharing a `(cluster_id, name)` must not
/// overlap, since the second `connect` replaces the first registration.
#[derive(Default)]
pub struct KubeClientFactory {
    clients: Mutex<HashMap<(String, String), Client>>,
}

impl KubeClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_clients(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Track `client` under `(cluster_id, name)`, returning the registration it replaced.
    pub async fn register(&self, cluster_id: &str, name: &str, client: Client) -> Option<Client> {
        let replaced = self
            .clients
            .lock()
            .await
            .insert((cluster_id.to_string(), name.to_string()), client);
        if replaced.is_some() {
            warn!("cluster client for {} ({}) was still registered, replacing it", cluster_id, name);
        }
        replaced
    }
}

#[async_trait]
impl ClusterClientFactory for KubeClientFactory {
    async fn connect(&self, cluster_id: &str, name: &str) -> Result<Arc<dyn ClusterApi>, ClientError> {
        let client = Client::try_default().await?;
        self.register(cluster_id, name, client.clone()).await;
        info!("cluster client ready for {} ({})", cluster_id, name);
        Ok(Arc::new(KubeClusterApi::new(client)))
    }

    async fn cleanup(&self, cluster_id: &str, name: &str) -> Result<(), ClientError> {
        let removed = self
            .clients
            .lock()
            .await
            .remove(&(cluster_id.to_string(), name.to_string()));
        match removed {
            Some(_) => {
                info!("cluster client released for {} ({})", cluster_id, name);
                Ok(())
            }
            None => Err(ClientError::NotRegistered {
                cluster_id: cluster_id.to_string(),
                name: name.to_string(),
            }),
        }
    }
}

pub fn pod_metrics_path(namespace: &str, label_selector: &str) -> String {
    let mut path = format!("/apis/metrics.k8s.io/v1beta1/namespaces/{}/pods", namespace);
    if !label_selector.is_empty() {
        path.push_str("?labelSelector=");
        path.push_str(&urlencoding::encode(label_selector));
    }
    path
}

fn network_type_from_config(data: &serde_json::Value) -> Option<String> {
    ["spec", "status"]
        .iter()
        .filter_map(|section| data.get(section))
        .filter_map(|section| section.get("networkType"))
        .filter_map(|v| v.as_str())
        .find(|v| !v.is_empty())
        .map(|v| v.to_string())
}
