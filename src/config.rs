use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

use crate::investigation::ALERT_NAME;
use crate::types::{Config, RuleConfig};

/// Source of the investigator's settings; tests swap in `MockEnvironment`.
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed variable map, so config tests never touch the real environment.
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let cluster_id = non_empty(env, "CLUSTER_ID")
        .ok_or_else(|| anyhow!("CLUSTER_ID env var must be set"))?;

    let alert_name = non_empty(env, "ALERT_NAME").unwrap_or_else(|| ALERT_NAME.to_string());

    // Missing upstream error is reported by the investigation itself
    let upstream_error = non_empty(env, "UPSTREAM_ERROR");

    Ok(Config {
        cluster_id,
        alert_name,
        upstream_error,
        rules: load_rule_config_with_env(env)?,
    })
}

pub fn load_rule_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<RuleConfig> {
    let defaults = RuleConfig::default();

    let cpu_threshold_millicores = match non_empty(env, "CPU_THRESHOLD_MILLICORES") {
        Some(raw) => raw
            .parse::<i64>()
            .context("Invalid CPU_THRESHOLD_MILLICORES")?,
        None => defaults.cpu_threshold_millicores,
    };
    if cpu_threshold_millicores <= 0 {
        return Err(anyhow!(
            "CPU_THRESHOLD_MILLICORES must be positive, got {}",
            cpu_threshold_millicores
        ));
    }

    Ok(RuleConfig {
        monitoring_namespace: non_empty(env, "MONITORING_NAMESPACE")
            .unwrap_or(defaults.monitoring_namespace),
        node_exporter_selector: non_empty(env, "NODE_EXPORTER_SELECTOR")
            .unwrap_or(defaults.node_exporter_selector),
        pruning_namespace: non_empty(env, "PRUNING_NAMESPACE").unwrap_or(defaults.pruning_namespace),
        cpu_threshold_millicores,
        sdn_network_type: non_empty(env, "SDN_NETWORK_TYPE").unwrap_or(defaults.sdn_network_type),
        sandbox_error_pattern: non_empty(env, "SANDBOX_ERROR_PATTERN")
            .unwrap_or(defaults.sandbox_error_pattern),
    })
}

fn non_empty<E: EnvironmentProvider>(env: &E, key: &str) -> Option<String> {
    env.get_var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
