//! Configuration storage module

pub mod bootstrap;
pub mod settings;
