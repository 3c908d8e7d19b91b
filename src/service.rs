//! Service descriptor: where the remote service lives and which auth endpoints it exposes.

pub mod descriptor;

pub use descriptor::*;
