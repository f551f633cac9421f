//! Remote host access

pub mod keys;
pub mod rsync;
pub mod ssh;
