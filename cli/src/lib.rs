//! skylift Library
//!
//! Core modules for the skylift deployment tool.

pub mod app;
pub mod cli;
pub mod cloud;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod ops;
pub mod remote;
pub mod server;
pub mod source;
pub mod storage;
pub mod utils;
