pub mod actions;
pub mod config;
pub mod engine;
pub mod logging;
pub mod orchestrator;
pub mod pattern;
pub mod remote;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod token_provider;
pub mod transfer;

#[cfg(test)]
mod memory_store;
