pub mod cli;
pub mod exec;
pub mod http_server;
