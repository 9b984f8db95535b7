// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod parsing;
pub mod signatures;
pub mod cluster;
pub mod collector;
pub mod rules;
pub mod notes;
pub mod report;
pub mod investigation;

// Re-export commonly used items
pub use types::*;
pub use error::{BoxError, ClientError, CollectionError, InvestigationError, Signal, SignatureError, UpstreamError};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use parsing::parse_cpu_to_millicores;
pub use signatures::{FaultSignature, SignatureCatalog, SignatureMatcher};
pub use cluster::{ClusterApi, ClusterClientFactory, KubeClientFactory, KubeClusterApi, PodMetricsItem, ContainerMetrics};
pub use collector::{ClusterSignals, SignalCollector};
pub use rules::ConditionEvaluator;
pub use notes::{NoteWriter, Notes};
pub use report::{InvestigationResult, RecommendationSection, RecommendationTable, ReportBuilder};
pub use investigation::{Investigation, PruningCronjobInvestigation, Resources, ALERT_NAME};
