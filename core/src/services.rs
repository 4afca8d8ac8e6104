use std::sync::Arc;

use crate::config::AppConfig;
use crate::operation::DeployPlugin;
use crate::runner::RunnerPlugin;
use crate::trace::TracerPlugin;

#[derive(Clone)]
pub struct Services {
    pub runner: Arc<dyn RunnerPlugin>,
    pub tracer: Arc<dyn TracerPlugin>,
    pub deploy: Arc<dyn DeployPlugin>,
}

/// Builds concrete plugins from configuration.
pub trait ServicesFactory {
    fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services>;
}
