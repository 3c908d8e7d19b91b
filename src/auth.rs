//! Identifiers and credential models shared by the gateway and the typed API.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{pair::*, secret::*};
