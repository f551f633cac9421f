//! Build server module

pub mod gate;
pub mod handlers;
pub mod serve;
pub mod state;
