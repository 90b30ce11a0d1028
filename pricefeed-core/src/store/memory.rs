use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{PriceStore, SymbolStore, check_point};
use crate::PriceFeedError;
use pricefeed_types::{PricePoint, Symbol, SymbolId, SymbolState};

#[derive(Default)]
struct Inner {
    points: BTreeMap<(SymbolId, i64), PricePoint>,
    symbols: BTreeMap<SymbolId, Symbol>,
    next_id: SymbolId,
}

/// Process-local store backed by ordered maps.
///
/// Implements both [`PriceStore`] and [`SymbolStore`]; intended for tests,
/// demos and short-lived processes that do not need durability.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PriceStore for InMemoryStore {
    async fn upsert(&self, point: PricePoint) -> Result<(), PriceFeedError> {
        check_point(&point)?;
        let mut g = self.inner.write().await;
        g.points.insert((point.symbol_id, point.timestamp), point);
        Ok(())
    }

    async fn upsert_many(&self, points: &[PricePoint]) -> Result<usize, PriceFeedError> {
        // validate the whole batch first so a bad point leaves the store untouched
        for p in points {
            check_point(p)?;
        }
        let mut g = self.inner.write().await;
        for p in points {
            g.points.insert((p.symbol_id, p.timestamp), *p);
        }
        Ok(points.len())
    }

    async fn range(
        &self,
        symbol_id: SymbolId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<PricePoint>, PriceFeedError> {
        if start_ms > end_ms {
            return Ok(Vec::new());
        }
        let g = self.inner.read().await;
        Ok(g.points
            .range((symbol_id, start_ms)..=(symbol_id, end_ms))
            .map(|(_, p)| *p)
            .collect())
    }

    async fn latest(&self, symbol_id: SymbolId) -> Result<Option<PricePoint>, PriceFeedError> {
        let g = self.inner.read().await;
        Ok(g.points
            .range((symbol_id, i64::MIN)..=(symbol_id, i64::MAX))
            .next_back()
            .map(|(_, p)| *p))
    }

    async fn oldest(&self, symbol_id: SymbolId) -> Result<Option<PricePoint>, PriceFeedError> {
        let g = self.inner.read().await;
        Ok(g.points
            .range((symbol_id, i64::MIN)..=(symbol_id, i64::MAX))
            .next()
            .map(|(_, p)| *p))
    }

    async fn before(
        &self,
        symbol_id: SymbolId,
        ts_ms: i64,
        limit: usize,
    ) -> Result<Vec<PricePoint>, PriceFeedError> {
        let g = self.inner.read().await;
        Ok(g.points
            .range((symbol_id, i64::MIN)..(symbol_id, ts_ms))
            .rev()
            .take(limit)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn after(
        &self,
        symbol_id: SymbolId,
        ts_ms: i64,
        limit: usize,
    ) -> Result<Vec<PricePoint>, PriceFeedError> {
        let g = self.inner.read().await;
        Ok(g.points
            .range((symbol_id, ts_ms)..=(symbol_id, i64::MAX))
            .filter(|((_, ts), _)| *ts > ts_ms)
            .take(limit)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn count(&self, symbol_id: SymbolId) -> Result<u64, PriceFeedError> {
        let g = self.inner.read().await;
        let n = g
            .points
            .range((symbol_id, i64::MIN)..=(symbol_id, i64::MAX))
            .count();
        Ok(n as u64)
    }

    async fn delete_range(
        &self,
        symbol_id: SymbolId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<u64, PriceFeedError> {
        if start_ms > end_ms {
            return Ok(0);
        }
        let mut g = self.inner.write().await;
        let keys: Vec<(SymbolId, i64)> = g
            .points
            .range((symbol_id, start_ms)..=(symbol_id, end_ms))
            .map(|(k, _)| *k)
            .collect();
        for k in &keys {
            g.points.remove(k);
        }
        Ok(keys.len() as u64)
    }
}

#[async_trait]
impl SymbolStore for InMemoryStore {
    async fn insert(
        &self,
        symbol: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Symbol, PriceFeedError> {
        let mut g = self.inner.write().await;
        if g.symbols.values().any(|s| s.symbol == symbol) {
            return Err(PriceFeedError::storage(format!(
                "UNIQUE constraint failed: symbols.symbol ({symbol})"
            )));
        }
        g.next_id += 1;
        let row = Symbol {
            id: g.next_id,
            symbol: symbol.to_string(),
            state: SymbolState::Active,
            created_at,
            last_price: None,
            last_price_at: None,
        };
        g.symbols.insert(row.id, row.clone());
        Ok(row)
    }

    async fn by_id(&self, id: SymbolId) -> Result<Option<Symbol>, PriceFeedError> {
        Ok(self.inner.read().await.symbols.get(&id).cloned())
    }

    async fn by_name(&self, symbol: &str) -> Result<Option<Symbol>, PriceFeedError> {
        let g = self.inner.read().await;
        Ok(g.symbols.values().find(|s| s.symbol == symbol).cloned())
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Symbol>, PriceFeedError> {
        let g = self.inner.read().await;
        let mut out: Vec<Symbol> = g
            .symbols
            .values()
            .filter(|s| !active_only || s.is_active())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(out)
    }

    async fn set_state(&self, id: SymbolId, state: SymbolState) -> Result<bool, PriceFeedError> {
        let mut g = self.inner.write().await;
        Ok(g.symbols.get_mut(&id).is_some_and(|s| {
            s.state = state;
            true
        }))
    }

    async fn set_last_price(
        &self,
        id: SymbolId,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, PriceFeedError> {
        let mut g = self.inner.write().await;
        Ok(g.symbols.get_mut(&id).is_some_and(|s| {
            s.last_price = Some(price);
            s.last_price_at = Some(at);
            true
        }))
    }
}
