use std::sync::Arc;

use kiln_core::api::{AppConfig, DeployPlugin, RunnerPlugin, TracerPlugin};

use crate::deploy::StagingDeployPlugin;
use crate::runner::ShellProcessRunner;
use crate::tracer::TracingTracer;

pub fn build_runner(cfg: &AppConfig) -> Arc<dyn RunnerPlugin> {
    Arc::new(ShellProcessRunner::new(&cfg.command))
}

pub fn build_tracer(_cfg: &AppConfig) -> Arc<dyn TracerPlugin> {
    Arc::new(TracingTracer::new())
}

pub fn build_deploy(cfg: &AppConfig) -> anyhow::Result<Arc<dyn DeployPlugin>> {
    if cfg.deployment.staging_dir.trim().is_empty() {
        anyhow::bail!("deployment.staging_dir must not be empty");
    }
    Ok(Arc::new(StagingDeployPlugin::new(&cfg.deployment)))
}
