//! Wire models for the cloud provider control plane.
//!
//! Request and response bodies only; no I/O lives here.

pub mod models;
