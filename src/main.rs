use anyhow::Result;
use tracing::info;

use pruning_cronjob_investigator::{
    load_config, BoxError, Investigation, KubeClientFactory, PruningCronjobInvestigation, Resources,
    SignatureCatalog, UpstreamError,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;

    // Compile the signature catalog up front so a bad pattern aborts before any cluster access
    let catalog = SignatureCatalog::builtin();
    info!("loaded {} fault signatures", catalog.len());

    let investigation = PruningCronjobInvestigation::new(catalog, cfg.rules.clone());
    if !investigation.should_investigate_alert(&cfg.alert_name) {
        info!("alert {:?} is not handled by {}, skipping", cfg.alert_name, investigation.name());
        return Ok(());
    }

    let factory = KubeClientFactory::new();
    let resources = Resources {
        cluster_id: cfg.cluster_id.clone(),
        name: cfg.alert_name.clone(),
        factory: &factory,
        upstream_error: cfg
            .upstream_error
            .clone()
            .map(|e| Box::new(UpstreamError(e)) as BoxError),
    };

    let result = investigation.run(resources).await?;
    info!(
        "investigation finished: {} finding(s), {} warning(s)",
        result.finding_count(),
        result.warnings.len()
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
