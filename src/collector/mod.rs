use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

use crate::cluster::{ClusterApi, PodMetricsItem};
use crate::error::{CollectionError, Signal};
use crate::parsing::{render_state_text, sum_cpu_millicores};
use crate::types::*;

/// Reads the cluster signals the rules need. Each call is a single best-effort read.
pub struct SignalCollector<'a> {
    api: &'a dyn ClusterApi,
    config: &'a RuleConfig,
}

impl<'a> SignalCollector<'a> {
    pub fn new(api: &'a dyn ClusterApi, config: &'a RuleConfig) -> Self {
        Self { api, config }
    }

    pub async fn collect_network_type(&self) -> Result<NetworkType, CollectionError> {
        let network = self
            .api
            .network_type()
            .await
            .map_err(|source| CollectionError {
                signal: Signal::NetworkType,
                source,
            })?;
        debug!("cluster network type: {}", network);
        Ok(NetworkType::new(network))
    }

    pub async fn collect_pod_metrics(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<PodMetricsSnapshot, CollectionError> {
        let items = self
            .api
            .list_pod_metrics(namespace, label_selector)
            .await
            .map_err(|source| CollectionError {
                signal: Signal::PodMetrics {
                    namespace: namespace.to_string(),
                    label_selector: label_selector.to_string(),
                },
                source,
            })?;
        Ok(PodMetricsSnapshot {
            namespace: namespace.to_string(),
            label_selector: label_selector.to_string(),
            pods: pod_metrics_from_items(items),
        })
    }

    pub async fn collect_pod_statuses(&self, namespace: &str) -> Result<PodListSnapshot, CollectionError> {
        let pods = self
            .api
            .list_pods(namespace)
            .await
            .map_err(|source| CollectionError {
                signal: Signal::PodStatuses {
                    namespace: namespace.to_string(),
                },
                source,
            })?;
        Ok(PodListSnapshot {
            namespace: namespace.to_string(),
            pods: pods.iter().filter_map(pod_status_from_pod).collect(),
        })
    }

    /// Collect every signal. The network type and pod statuses are read
    /// concurrently; pod metrics are only read on SDN clusters.
    pub async fn collect_all(&self) -> ClusterSignals {
        let cfg = self.config;
        let network_and_metrics = async {
            let network = self.collect_network_type().await;
            let metrics = match &network {
                Ok(n) if n.is(&cfg.sdn_network_type) => Some(
                    self.collect_pod_metrics(&cfg.monitoring_namespace, &cfg.node_exporter_selector)
                        .await,
                ),
                _ => None,
            };
            (network, metrics)
        };
        let statuses = self.collect_pod_statuses(&cfg.pruning_namespace);

        let ((network_type, pod_metrics), pod_statuses) = tokio::join!(network_and_metrics, statuses);

        ClusterSignals {
            network_type,
            pod_metrics,
            pod_statuses,
        }
    }
}

/// Outcome of one collection pass. Every signal keeps its own result slot.
#[derive(Debug)]
pub struct ClusterSignals {
    pub network_type: Result<NetworkType, CollectionError>,
    /// `None` when the network plugin makes the metrics irrelevant or unknown
    pub pod_metrics: Option<Result<PodMetricsSnapshot, CollectionError>>,
    pub pod_statuses: Result<PodListSnapshot, CollectionError>,
}

impl ClusterSignals {
    /// Collection failures in fixed order: network type, pod metrics, pod statuses.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Err(e) = &self.network_type {
            warnings.push(e.to_string());
        }
        if let Some(Err(e)) = &self.pod_metrics {
            warnings.push(e.to_string());
        }
        if let Err(e) = &self.pod_statuses {
            warnings.push(e.to_string());
        }
        warnings
    }
}

fn pod_metrics_from_items(items: Vec<PodMetricsItem>) -> Vec<PodMetric> {
    items
        .into_iter()
        .filter_map(|item| {
            let pod_name = item.metadata.name.filter(|n| !n.is_empty())?;
            let cpu_millicores = sum_cpu_millicores(item.containers.iter().map(|c| &c.usage));
            Some(PodMetric {
                pod_name,
                cpu_millicores,
            })
        })
        .collect()
}

fn pod_status_from_pod(pod: &Pod) -> Option<PodStatusSnapshot> {
    let pod_name = pod.metadata.name.clone()?;
    let containers = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|cs| ContainerStatusSnapshot {
                    container_name: cs.name.clone(),
                    ready: cs.ready,
                    restart_count: cs.restart_count,
                    image: cs.image.clone(),
                    state_text: render_state_text(cs.state.as_ref(), cs.last_state.as_ref()),
                })
                .collect()
        })
        .unwrap_or_default();
    Some(PodStatusSnapshot { pod_name, containers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ContainerMetrics;
    use crate::error::ClientError;
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::{ContainerState, ContainerStateWaiting, ContainerStatus, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticCluster {
        network: Result<&'static str, &'static str>,
        metrics: Result<Vec<PodMetricsItem>, &'static str>,
        pods: Result<Vec<Pod>, &'static str>,
        metrics_calls: AtomicUsize,
    }

    #[async_trait]
    impl ClusterApi for StaticCluster {
        async fn network_type(&self) -> Result<String, ClientError> {
            self.network
                .map(|n| n.to_string())
                .map_err(|e| ClientError::Unavailable(e.to_string()))
        }

        async fn list_pod_metrics(&self, _: &str, _: &str) -> Result<Vec<PodMetricsItem>, ClientError> {
            self.metrics_calls.fetch_add(1, Ordering::SeqCst);
            self.metrics
                .clone()
                .map_err(|e| ClientError::Unavailable(e.to_string()))
        }

        async fn list_pods(&self, _: &str) -> Result<Vec<Pod>, ClientError> {
            self.pods
                .clone()
                .map_err(|e| ClientError::Unavailable(e.to_string()))
        }
    }

    fn metrics_item(name: &str, cpu: &str) -> PodMetricsItem {
        PodMetricsItem {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            containers: vec![ContainerMetrics {
                name: "node-exporter".to_string(),
                usage: [("cpu".to_string(), cpu.to_string())].into(),
            }],
        }
    }

    fn pruner_pod(name: &str, message: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                container_statuses: Some(vec![ContainerStatus {
                    name: "pruner".to_string(),
                    image: "quay.io/openshift/pruner".to_string(),
                    restart_count: 4,
                    state: Some(ContainerState {
                        waiting: Some(ContainerStateWaiting {
                            reason: Some("CreateContainerError".to_string()),
                            message: Some(message.to_string()),
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_collect_all_on_sdn_cluster() {
        let cluster = StaticCluster {
            network: Ok("OpenShiftSDN"),
            metrics: Ok(vec![metrics_item("node-exporter-a", "150m"), metrics_item("node-exporter-b", "15m")]),
            pods: Ok(vec![pruner_pod("builds-pruner-1", "seccomp filter: errno 524")]),
            metrics_calls: AtomicUsize::new(0),
        };
        let cfg = RuleConfig::default();
        let signals = SignalCollector::new(&cluster, &cfg).collect_all().await;

        assert!(signals.warnings().is_empty());
        let metrics = signals.pod_metrics.unwrap().unwrap();
        assert_eq!(metrics.namespace, "openshift-monitoring");
        assert_eq!(
            metrics.pods,
            vec![
                PodMetric { pod_name: "node-exporter-a".to_string(), cpu_millicores: 150 },
                PodMetric { pod_name: "node-exporter-b".to_string(), cpu_millicores: 15 },
            ]
        );
        let pods = signals.pod_statuses.unwrap();
        assert_eq!(pods.pods[0].pod_name, "builds-pruner-1");
        assert_eq!(pods.pods[0].containers[0].restart_count, 4);
        assert!(pods.pods[0].containers[0].state_text.contains("errno 524"));
    }

    #[tokio::test]
    async fn test_metrics_skipped_off_sdn() {
        let cluster = StaticCluster {
            network: Ok("OVNKubernetes"),
            metrics: Err("should not be called"),
            pods: Ok(vec![]),
            metrics_calls: AtomicUsize::new(0),
        };
        let cfg = RuleConfig::default();
        let signals = SignalCollector::new(&cluster, &cfg).collect_all().await;

        assert!(signals.pod_metrics.is_none());
        assert!(signals.warnings().is_empty());
        assert_eq!(cluster.metrics_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_become_ordered_warnings() {
        let cluster = StaticCluster {
            network: Err("network config forbidden"),
            metrics: Ok(vec![]),
            pods: Err("pods forbidden"),
            metrics_calls: AtomicUsize::new(0),
        };
        let cfg = RuleConfig::default();
        let signals = SignalCollector::new(&cluster, &cfg).collect_all().await;

        assert_eq!(
            signals.warnings(),
            vec![
                "Error fetching cluster network type: network config forbidden".to_string(),
                "Error listing pods in openshift-sre-pruning namespace: pods forbidden".to_string(),
            ]
        );
        assert!(signals.pod_metrics.is_none());
    }

    #[test]
    fn test_unnamed_objects_are_skipped() {
        let mut nameless = metrics_item("", "500m");
        nameless.metadata.name = None;
        assert!(pod_metrics_from_items(vec![nameless, metrics_item("", "1")]).is_empty());
        assert!(pod_status_from_pod(&Pod::default()).is_none());

        let bare = Pod {
            metadata: ObjectMeta {
                name: Some("pending-pruner".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(pod_status_from_pod(&bare).unwrap().containers.is_empty());
    }
}
