use crate::types::{Finding, PodListSnapshot, RecommendedAction, RuleConfig};

/// Flag pruner containers whose sandbox was rejected by the runtime
/// (`seccomp filter: errno 524`). Retrying the cronjob clears it.
pub fn evaluate_sandbox_errno(pods: &PodListSnapshot, cfg: &RuleConfig) -> Vec<Finding> {
    let pattern = cfg.sandbox_error_pattern.as_str();
    if pattern.is_empty() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    for pod in &pods.pods {
        for container in &pod.containers {
            if !container.status_text().contains(pattern) {
                continue;
            }
            findings.push(Finding::new(
                format!("{}/{}", pod.pod_name, container.container_name),
                RecommendedAction::RetryPruningCronjob,
                format!(
                    "container hit '{}' (ready: {}, restarts: {})",
                    pattern, container.ready, container.restart_count
                ),
            ));
        }
    }
    findings
}
