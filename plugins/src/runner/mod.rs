pub mod shell;

pub use shell::ShellProcessRunner;
