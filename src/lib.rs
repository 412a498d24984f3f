pub mod cli;
pub mod config;
pub mod errors;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod stepper;
pub mod transcript;
pub mod tree;
pub mod ux;
pub mod wire;
