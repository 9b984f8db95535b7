use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cluster::{ClusterApi, ClusterClientFactory};
use crate::collector::SignalCollector;
use crate::error::{BoxError, InvestigationError};
use crate::report::{InvestigationResult, RecommendationTable, ReportBuilder};
use crate::rules::ConditionEvaluator;
use crate::signatures::{SignatureCatalog, SignatureMatcher};
use crate::types::{ErrorCause, ErrorClassification, RuleConfig};

/// Alert name fragment this investigation handles.
pub const ALERT_NAME: &str = "PruningCronjobErrorSRE";

/// Everything the framework hands to one investigation run.
pub struct Resources<'a> {
    pub cluster_id: String,
    /// Alert-scoped name the cluster client is registered under
    pub name: String,
    pub factory: &'a dyn ClusterClientFactory,
    /// Error from the upstream access-check step, if any
    pub upstream_error: Option<BoxError>,
}

#[async_trait]
pub trait Investigation: Send + Sync {
    async fn run(&self, resources: Resources<'_>) -> Result<InvestigationResult, InvestigationError>;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn should_investigate_alert(&self, alert_name: &str) -> bool;

    fn is_experimental(&self) -> bool;
}

pub struct PruningCronjobInvestigation {
    matcher: SignatureMatcher,
    rules: RuleConfig,
}

impl PruningCronjobInvestigation {
    pub fn new(catalog: Arc<SignatureCatalog>, rules: RuleConfig) -> Self {
        Self {
            matcher: SignatureMatcher::new(catalog),
            rules,
        }
    }

    /// Build an investigation over a caller-supplied signature list instead of the built-in one.
    pub fn with_patterns(
        entries: &[(&str, ErrorCause)],
        rules: RuleConfig,
    ) -> Result<Self, InvestigationError> {
        let catalog = SignatureCatalog::from_patterns(entries)?;
        Ok(Self::new(Arc::new(catalog), rules))
    }

    async fn investigate(
        &self,
        cluster_id: &str,
        api: &dyn ClusterApi,
        classification: ErrorClassification,
        upstream_error: BoxError,
    ) -> Result<InvestigationResult, InvestigationError> {
        if !classification.is_customer_caused() {
            // Not a removed support/installer role; most likely a backplane failure
            warn!("upstream error is not customer-caused, stopping: {}", upstream_error);
            return Err(InvestigationError::UnrelatedUpstreamError {
                source: upstream_error,
            });
        }
        info!("upstream error classified as customer-caused, collecting cluster signals");

        let signals = SignalCollector::new(api, &self.rules).collect_all().await;
        let findings = ConditionEvaluator::new(&self.rules).evaluate(&signals);

        let mut table = RecommendationTable::new();
        table.extend(findings);
        info!("{} finding(s) across {} action(s)", table.len(), table.render().len());

        Ok(ReportBuilder::new(self.name(), cluster_id, classification)
            .warnings(signals.warnings())
            .recommendations(table)
            .build())
    }
}

impl Default for PruningCronjobInvestigation {
    fn default() -> Self {
        Self::new(SignatureCatalog::builtin(), RuleConfig::default())
    }
}

#[async_trait]
impl Investigation for PruningCronjobInvestigation {
    async fn run(&self, resources: Resources<'_>) -> Result<InvestigationResult, InvestigationError> {
        let Resources {
            cluster_id,
            name,
            factory,
            upstream_error,
        } = resources;
        let upstream_error = upstream_error.ok_or(InvestigationError::MissingUpstreamError)?;
        info!("investigating {} on cluster {}", ALERT_NAME, cluster_id);

        let classification = self.matcher.classify(&upstream_error.to_string());

        let api = match factory.connect(&cluster_id, &name).await {
            Ok(api) => api,
            // An unrecognised upstream error outranks the client failure it probably caused
            Err(e) if !classification.is_customer_caused() => {
                warn!("cluster client unavailable for {}: {}", cluster_id, e);
                return Err(InvestigationError::UnrelatedUpstreamError {
                    source: upstream_error,
                });
            }
            Err(e) => return Err(InvestigationError::ClientInit(e)),
        };

        let run = self.investigate(&cluster_id, api.as_ref(), classification, upstream_error);
        let outcome = AssertUnwindSafe(run).catch_unwind().await;
        drop(api);

        // Released exactly once, whatever the run did
        let cleanup = factory.cleanup(&cluster_id, &name).await;
        if let Err(e) = &cleanup {
            error!("failed to clean up cluster client for {}: {}", cluster_id, e);
        }

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        match cleanup {
            Ok(()) => outcome,
            Err(source) => Err(InvestigationError::CleanupFailed {
                source,
                run_error: outcome.err().map(Box::new),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "PruningCronjobError"
    }

    fn description(&self) -> &'static str {
        "Steps through the PruningCronjobError SOP"
    }

    fn should_investigate_alert(&self, alert_name: &str) -> bool {
        alert_name.contains(ALERT_NAME)
    }

    fn is_experimental(&self) -> bool {
        false
    }
}
