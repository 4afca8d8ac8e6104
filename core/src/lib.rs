pub mod api;
pub mod command;
pub mod config;
pub mod context;
pub mod docs;
pub mod errors;
pub mod operation;
pub mod runner;
pub mod services;
pub mod trace;

pub use context::AppContext;
