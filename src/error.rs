use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error text handed over by the upstream access-check step.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UpstreamError(pub String);

/// Failures of the cluster API collaborator.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("no cluster client registered for cluster {cluster_id} ({name})")]
    NotRegistered { cluster_id: String, name: String },

    #[error("{0}")]
    Unavailable(String),
}

/// The cluster signal a collection call was reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    NetworkType,
    PodMetrics { namespace: String, label_selector: String },
    PodStatuses { namespace: String },
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::NetworkType => f.write_str("Error fetching cluster network type"),
            Signal::PodMetrics {
                namespace,
                label_selector,
            } => write!(
                f,
                "Error fetching pod metrics for {} in {} namespace",
                label_selector, namespace
            ),
            Signal::PodStatuses { namespace } => {
                write!(f, "Error listing pods in {} namespace", namespace)
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("{signal}: {source}")]
pub struct CollectionError {
    pub signal: Signal,
    #[source]
    pub source: ClientError,
}

#[derive(Debug, Error)]
#[error("invalid fault signature #{index} {pattern:?}: {source}")]
pub struct SignatureError {
    pub index: usize,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Error)]
pub enum InvestigationError {
    #[error("missing required upstream error for the investigation")]
    MissingUpstreamError,

    /// The upstream error is not a customer-caused access failure; out of scope here.
    #[error("credentials are there, error is different: {source}")]
    UnrelatedUpstreamError {
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Signatures(#[from] SignatureError),

    #[error("unable to initialize cluster client: {0}")]
    ClientInit(#[source] ClientError),

    #[error(
        "failed to clean up cluster client: {source}{}",
        .run_error.as_ref().map(|e| format!(" (run error: {})", e)).unwrap_or_default()
    )]
    CleanupFailed {
        #[source]
        source: ClientError,
        run_error: Option<Box<InvestigationError>>,
    },
}
