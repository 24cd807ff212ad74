//! Service wiring: one engine over one store, plus the outbox relay.

use std::sync::Arc;
use std::time::Duration;

use campustrade_engine::{ExchangeEngine, OutboxRelay};
use campustrade_notifications::TracingSink;
use campustrade_store::InMemoryStore;

/// Everything the handlers need, behind one `Extension<Arc<AppServices>>`.
pub struct AppServices {
    pub engine: ExchangeEngine<Arc<InMemoryStore>>,
    store: Arc<InMemoryStore>,
}

pub fn build_services() -> AppServices {
    let store = Arc::new(InMemoryStore::new());
    AppServices {
        engine: ExchangeEngine::new(Arc::clone(&store)),
        store,
    }
}

/// Background task that periodically drains committed notifications to the
/// delivery sink. Delivery is decoupled from the request path: handlers
/// only write outbox rows inside their transactions.
pub fn spawn_outbox_relay(services: &Arc<AppServices>) {
    let relay = OutboxRelay::new(Arc::clone(&services.store), TracingSink);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(500));
        loop {
            tick.tick().await;
            relay.drain();
        }
    });
}
