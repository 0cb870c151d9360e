//! Ready-made scenarios.

pub mod sandbox_mounts;
