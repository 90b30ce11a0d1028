use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricefeed::{InMemoryStore, PriceFeedError, Symbol, SymbolId, SymbolState, SymbolStore};
use tokio::sync::Notify;

/// Symbol store whose next `list` or `by_name` call parks after reading.
///
/// `read_done` fires once the rows are in hand; the call returns them only
/// after `release` is notified.
pub struct GatedSymbols {
    inner: InMemoryStore,
    gate_list: AtomicBool,
    gate_by_name: AtomicBool,
    pub read_done: Notify,
    pub release: Notify,
}

impl GatedSymbols {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryStore::new(),
            gate_list: AtomicBool::new(false),
            gate_by_name: AtomicBool::new(false),
            read_done: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn hold_next_list(&self) {
        self.gate_list.store(true, Ordering::SeqCst);
    }

    pub fn hold_next_by_name(&self) {
        self.gate_by_name.store(true, Ordering::SeqCst);
    }

    async fn park(&self, gate: &AtomicBool) {
        if gate.swap(false, Ordering::SeqCst) {
            self.read_done.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl SymbolStore for GatedSymbols {
    async fn insert(
        &self,
        symbol: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Symbol, PriceFeedError> {
        self.inner.insert(symbol, created_at).await
    }

    async fn by_id(&self, id: SymbolId) -> Result<Option<Symbol>, PriceFeedError> {
        self.inner.by_id(id).await
    }

    async fn by_name(&self, symbol: &str) -> Result<Option<Symbol>, PriceFeedError> {
        let found = self.inner.by_name(symbol).await;
        self.park(&self.gate_by_name).await;
        found
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Symbol>, PriceFeedError> {
        let rows = self.inner.list(active_only).await;
        self.park(&self.gate_list).await;
        rows
    }

    async fn set_state(&self, id: SymbolId, state: SymbolState) -> Result<bool, PriceFeedError> {
        self.inner.set_state(id, state).await
    }

    async fn set_last_price(
        &self,
        id: SymbolId,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, PriceFeedError> {
        self.inner.set_last_price(id, price, at).await
    }
}
