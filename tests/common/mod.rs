#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::MockServer;
// self
use certdesk::{
	auth::CredentialPair,
	gateway::ReqwestGateway,
	service::ServiceDescriptor,
	store::MemoryStore,
};

pub fn descriptor(server: &MockServer) -> ServiceDescriptor {
	ServiceDescriptor::from_env_value(Some(&server.url("/api/v1/")))
		.expect("Mock server descriptor should build.")
}

/// Gateway over a fresh memory store plus a counter of session-invalid events.
pub fn gateway(
	server: &MockServer,
	pair: Option<CredentialPair>,
) -> (ReqwestGateway, MemoryStore, Arc<AtomicUsize>) {
	let store = pair.map(MemoryStore::with_pair).unwrap_or_default();
	let events = Arc::new(AtomicUsize::new(0));
	let observed = events.clone();
	let gateway = ReqwestGateway::new(Arc::new(store.clone()), descriptor(server))
		.with_session_observer(move || {
			observed.fetch_add(1, Ordering::SeqCst);
		});

	(gateway, store, events)
}

pub fn events(counter: &AtomicUsize) -> usize {
	counter.load(Ordering::SeqCst)
}
