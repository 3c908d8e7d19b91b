//! Thread-safe in-memory [`CredentialStore`] for short-lived processes and tests.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	store::{CredentialSlots, CredentialStore, StoreFuture},
};

type SlotCell = Arc<RwLock<CredentialSlots>>;

/// Credential store that keeps tokens in-process; cloned handles share the same slots.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotCell);
impl MemoryStore {
	/// Creates a store seeded with the provided pair.
	pub fn with_pair(pair: CredentialPair) -> Self {
		let mut slots = CredentialSlots::default();

		slots.replace(pair);

		Self(Arc::new(RwLock::new(slots)))
	}

	/// Returns a copy of the current slots.
	pub fn snapshot(&self) -> CredentialSlots {
		self.0.read().clone()
	}
}
impl CredentialStore for MemoryStore {
	fn access(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let cell = self.0.clone();

		Box::pin(async move { Ok(cell.read().access.clone()) })
	}

	fn set_access(&self, token: TokenSecret) -> StoreFuture<'_, ()> {
		let cell = self.0.clone();

		Box::pin(async move {
			cell.write().access = Some(token);

			Ok(())
		})
	}

	fn refresh(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let cell = self.0.clone();

		Box::pin(async move { Ok(cell.read().refresh.clone()) })
	}

	fn replace(&self, pair: CredentialPair) -> StoreFuture<'_, ()> {
		let cell = self.0.clone();

		Box::pin(async move {
			cell.write().replace(pair);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let cell = self.0.clone();

		Box::pin(async move {
			cell.write().clear();

			Ok(())
		})
	}
}
