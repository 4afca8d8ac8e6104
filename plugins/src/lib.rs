pub mod deploy;
pub mod factory;
pub mod runner;
pub mod services;
pub mod tracer;

pub use services::PluginServicesFactory;
