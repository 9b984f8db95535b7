use serde::Serialize;
use std::fmt;

/// Rule settings shared by the collector and the condition evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    pub monitoring_namespace: String,
    pub node_exporter_selector: String,
    pub pruning_namespace: String,
    pub cpu_threshold_millicores: i64,
    pub sdn_network_type: String,
    pub sandbox_error_pattern: String,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            monitoring_namespace: "openshift-monitoring".to_string(),
            node_exporter_selector: "app.kubernetes.io/name=node-exporter".to_string(),
            pruning_namespace: "openshift-sre-pruning".to_string(),
            cpu_threshold_millicores: 100,
            sdn_network_type: "OpenShiftSDN".to_string(),
            sandbox_error_pattern: "seccomp filter: errno 524".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cluster_id: String,
    pub alert_name: String,
    pub upstream_error: Option<String>,
    pub rules: RuleConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCause {
    CustomerCaused,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorClassification {
    pub matched: bool,
    pub cause: ErrorCause,
}

impl ErrorClassification {
    pub fn unmatched() -> Self {
        Self {
            matched: false,
            cause: ErrorCause::Unknown,
        }
    }

    pub fn is_customer_caused(&self) -> bool {
        self.cause == ErrorCause::CustomerCaused
    }
}

/// Network plugin identifier as reported by the cluster network config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkType(pub String);

impl NetworkType {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Plugin names are compared case-insensitively; clusters report both
    /// `OpenShiftSDN` and `OpenshiftSDN`.
    pub fn is(&self, expected: &str) -> bool {
        self.0.trim().eq_ignore_ascii_case(expected.trim())
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodMetric {
    pub pod_name: String,
    pub cpu_millicores: i64,
}

/// Pod metrics for one namespace/label selector, in the order the API returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodMetricsSnapshot {
    pub namespace: String,
    pub label_selector: String,
    pub pods: Vec<PodMetric>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatusSnapshot {
    pub container_name: String,
    pub ready: bool,
    pub restart_count: i32,
    pub image: String,
    pub state_text: String,
}

impl ContainerStatusSnapshot {
    /// Composite text the sandbox rule searches for known runtime error codes.
    pub fn status_text(&self) -> String {
        format!(
            "Container Name: {}, Ready: {}, Restart Count: {}, Image: {}, State: {}",
            self.container_name, self.ready, self.restart_count, self.image, self.state_text
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodStatusSnapshot {
    pub pod_name: String,
    pub containers: Vec<ContainerStatusSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodListSnapshot {
    pub namespace: String,
    pub pods: Vec<PodStatusSnapshot>,
}

/// Remediation action. Declaration order is the render order of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RecommendedAction {
    RetryPruningCronjob,
    InvestigateNode,
    InvestigateMachine,
    QuotaServiceLog,
}

impl RecommendedAction {
    pub const ALL: [RecommendedAction; 4] = [
        RecommendedAction::RetryPruningCronjob,
        RecommendedAction::InvestigateNode,
        RecommendedAction::InvestigateMachine,
        RecommendedAction::QuotaServiceLog,
    ];

    /// Section header used when rendering operator notes.
    pub fn header(&self) -> &'static str {
        match self {
            RecommendedAction::RetryPruningCronjob => "retry the pruning cronjob",
            RecommendedAction::InvestigateNode => "investigate the following nodes",
            RecommendedAction::InvestigateMachine => "investigate the following machines",
            RecommendedAction::QuotaServiceLog => {
                "send a service log regarding quota issues for the following machines"
            }
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Name of the pod, node or machine the finding is about
    pub object: String,
    pub action: RecommendedAction,
    pub notes: String,
}

impl Finding {
    pub fn new<O, N>(object: O, action: RecommendedAction, notes: N) -> Self
    where
        O: Into<String>,
        N: Into<String>,
    {
        Self {
            object: object.into(),
            action,
            notes: notes.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.object, self.notes)
    }
}
