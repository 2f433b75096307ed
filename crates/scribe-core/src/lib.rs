//! Configuration loading and knowledge-base bootstrap.

pub mod bootstrap;
pub mod config;
