//! ServicesFactory implementation: builds the runner, tracer and deploy plugins from configuration.
use kiln_core::api::{AppConfig, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

impl ServicesFactory for PluginServicesFactory {
    fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services> {
        let deploy = factory::build_deploy(cfg)?;
        tracing::debug!(
            target: "kiln.services",
            shell = %cfg.command.shell,
            staging_dir = %cfg.deployment.staging_dir,
            "building services"
        );
        Ok(Services {
            runner: factory::build_runner(cfg),
            tracer: factory::build_tracer(cfg),
            deploy,
        })
    }
}
