//! Typed operations over the service's certificate endpoints.

pub mod certificates;
pub mod charge;
pub mod filter;
pub mod model;
pub mod public;

pub use certificates::CertificatesApi;
pub use charge::*;
pub use filter::*;
pub use model::*;
pub use public::PublicClient;

// self
use crate::{gateway::Gateway, http::ApiTransport};

impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Certificate endpoints authenticated through this gateway.
	pub fn certificates(&self) -> CertificatesApi<'_, T> {
		CertificatesApi::new(self)
	}
}
