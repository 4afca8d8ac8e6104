use crate::command::CommandService;
use crate::config::AppConfig;
use crate::operation::OperationRegistry;
use crate::services::{Services, ServicesFactory};

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services: Services,
    operations: OperationRegistry,
    deletions: OperationRegistry,
}

impl AppContext {
    pub fn new(cfg: AppConfig, factory: &dyn ServicesFactory) -> anyhow::Result<Self> {
        let services = factory.build_services(&cfg)?;
        Ok(Self::with_services(cfg, services))
    }

    pub fn with_services(cfg: AppConfig, services: Services) -> Self {
        let retain = cfg.deployment.retained_operations;
        Self {
            cfg,
            services,
            operations: OperationRegistry::with_retention(retain),
            deletions: OperationRegistry::with_retention(retain),
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Push deploys, keyed by deployment id.
    pub fn operations(&self) -> &OperationRegistry {
        &self.operations
    }

    /// Delete requests, keyed by the id of the deployment being removed.
    pub fn deletions(&self) -> &OperationRegistry {
        &self.deletions
    }

    pub fn command_service(&self) -> CommandService {
        CommandService::new(self.services.runner.clone(), self.services.tracer.clone())
    }
}
