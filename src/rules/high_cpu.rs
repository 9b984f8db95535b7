use crate::types::{Finding, NetworkType, PodMetricsSnapshot, RecommendedAction, RuleConfig};

/// Usage a healthy node-exporter stays below.
pub const NOMINAL_CPU_MILLICORES: i64 = 20;

/// Flag node-exporter pods burning CPU on SDN clusters. The fix is rebooting
/// or replacing the node, so findings target node investigation.
pub fn evaluate_high_cpu(
    network: &NetworkType,
    metrics: &PodMetricsSnapshot,
    cfg: &RuleConfig,
) -> Vec<Finding> {
    if !network.is(&cfg.sdn_network_type) {
        return Vec::new();
    }
    // Only a snapshot taken for the node-exporter workload is meaningful here
    if metrics.label_selector != cfg.node_exporter_selector {
        return Vec::new();
    }

    metrics
        .pods
        .iter()
        .filter(|pod| pod.cpu_millicores > cfg.cpu_threshold_millicores)
        .map(|pod| {
            Finding::new(
                pod.pod_name.clone(),
                RecommendedAction::InvestigateNode,
                format!(
                    "pod in {} is using {}m CPU (threshold {}m, usually below {}m); reboot or replace the node running it",
                    metrics.namespace, pod.cpu_millicores, cfg.cpu_threshold_millicores, NOMINAL_CPU_MILLICORES
                ),
            )
        })
        .collect()
}
