// Detection rules applied to collected cluster signals
pub mod high_cpu;
pub mod sandbox;

pub use high_cpu::evaluate_high_cpu;
pub use sandbox::evaluate_sandbox_errno;

use tracing::debug;

use crate::collector::ClusterSignals;
use crate::types::{Finding, RuleConfig};

/// Runs every rule whose signals were collected. A missing signal only
/// disables the rules that depend on it.
pub struct ConditionEvaluator<'a> {
    config: &'a RuleConfig,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(config: &'a RuleConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, signals: &ClusterSignals) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let (Ok(network), Some(Ok(metrics))) = (&signals.network_type, &signals.pod_metrics) {
            let high_cpu = evaluate_high_cpu(network, metrics, self.config);
            debug!("high cpu rule: {} finding(s)", high_cpu.len());
            findings.extend(high_cpu);
        }

        if let Ok(pods) = &signals.pod_statuses {
            let sandbox = evaluate_sandbox_errno(pods, self.config);
            debug!("sandbox errno rule: {} finding(s)", sandbox.len());
            findings.extend(sandbox);
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, CollectionError, Signal};
    use crate::types::*;

    fn sandbox_pods() -> PodListSnapshot {
        PodListSnapshot {
            namespace: "openshift-sre-pruning".to_string(),
            pods: vec![PodStatusSnapshot {
                pod_name: "builds-pruner-1".to_string(),
                containers: vec![ContainerStatusSnapshot {
                    container_name: "pruner".to_string(),
                    ready: false,
                    restart_count: 1,
                    image: "pruner".to_string(),
                    state_text: "Waiting: seccomp filter: errno 524".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn test_metrics_failure_keeps_sandbox_rule() {
        let cfg = RuleConfig::default();
        let signals = ClusterSignals {
            network_type: Ok(NetworkType::new("OpenShiftSDN")),
            pod_metrics: Some(Err(CollectionError {
                signal: Signal::PodMetrics {
                    namespace: cfg.monitoring_namespace.clone(),
                    label_selector: cfg.node_exporter_selector.clone(),
                },
                source: ClientError::Unavailable("metrics API unavailable".to_string()),
            })),
            pod_statuses: Ok(sandbox_pods()),
        };
        let findings = ConditionEvaluator::new(&cfg).evaluate(&signals);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].action, RecommendedAction::RetryPruningCronjob);
    }

    #[test]
    fn test_both_rules_fire() {
        let cfg = RuleConfig::default();
        let signals = ClusterSignals {
            network_type: Ok(NetworkType::new("OpenShiftSDN")),
            pod_metrics: Some(Ok(PodMetricsSnapshot {
                namespace: cfg.monitoring_namespace.clone(),
                label_selector: cfg.node_exporter_selector.clone(),
                pods: vec![PodMetric {
                    pod_name: "node-exporter-x".to_string(),
                    cpu_millicores: 250,
                }],
            })),
            pod_statuses: Ok(sandbox_pods()),
        };
        let actions: Vec<RecommendedAction> = ConditionEvaluator::new(&cfg)
            .evaluate(&signals)
            .iter()
            .map(|f| f.action)
            .collect();
        assert_eq!(
            actions,
            vec![RecommendedAction::InvestigateNode, RecommendedAction::RetryPruningCronjob]
        );
    }
}
