//! Symbol registry with an explicit read cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use moka::future::Cache;
use pricefeed_core::{PriceFeedError, Symbol, SymbolId, SymbolState, SymbolStore};

const CACHE_CAPACITY: u64 = 1_024;

/// Read cache owned by the registry.
///
/// Symbols are cached by id and by name, and the two listings (active only,
/// everything) are cached under their `active_only` flag. Every mutating
/// registry call drops all three and bumps `generation`.
///
/// A reader records the generation before it goes to the store and only
/// fills the cache if no mutation happened meanwhile, so rows read before a
/// change are never written back after it.
struct RegistryCache {
    by_id: Cache<SymbolId, Symbol>,
    by_name: Cache<String, Symbol>,
    lists: Cache<bool, Arc<Vec<Symbol>>>,
    generation: AtomicU64,
}

impl RegistryCache {
    fn new() -> Self {
        Self {
            by_id: Cache::new(CACHE_CAPACITY),
            by_name: Cache::new(CACHE_CAPACITY),
            lists: Cache::new(2),
            generation: AtomicU64::new(0),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.by_id.invalidate_all();
        self.by_name.invalidate_all();
        self.lists.invalidate_all();
    }

    async fn remember(&self, symbol: &Symbol, seen: u64) {
        if self.generation() != seen {
            return;
        }
        self.by_id.insert(symbol.id, symbol.clone()).await;
        self.by_name
            .insert(symbol.symbol.clone(), symbol.clone())
            .await;
        // a mutation landed between the check and the inserts
        if self.generation() != seen {
            self.by_id.invalidate(&symbol.id).await;
            self.by_name.invalidate(&symbol.symbol).await;
        }
    }

    async fn remember_list(&self, active_only: bool, rows: &Arc<Vec<Symbol>>, seen: u64) {
        if self.generation() != seen {
            return;
        }
        self.lists.insert(active_only, Arc::clone(rows)).await;
        if self.generation() != seen {
            self.lists.invalidate(&active_only).await;
        }
    }
}

/// Tracks which symbols are monitored, backed by a [`SymbolStore`].
///
/// Registration is "create if absent, else reactivate in place": a symbol's
/// id and `created_at` never change once assigned.
pub struct SymbolRegistry {
    store: Arc<dyn SymbolStore>,
    cache: RegistryCache,
}

impl SymbolRegistry {
    /// Create a registry over `store` with an empty cache.
    #[must_use]
    pub fn new(store: Arc<dyn SymbolStore>) -> Self {
        Self {
            store,
            cache: RegistryCache::new(),
        }
    }

    /// Register `symbol`, or reactivate it if it was deactivated.
    ///
    /// # Errors
    /// - `InvalidArg` if the name is empty after trimming.
    /// - `AlreadyActive` if the symbol is registered and active.
    /// - Store failures.
    pub async fn register(&self, symbol: &str) -> Result<Symbol, PriceFeedError> {
        let name = symbol.trim();
        if name.is_empty() {
            return Err(PriceFeedError::InvalidArg(
                "symbol must not be empty".into(),
            ));
        }

        let out = match self.store.by_name(name).await? {
            Some(existing) if existing.is_active() => {
                return Err(PriceFeedError::already_active(name));
            }
            Some(mut existing) => {
                if !self
                    .store
                    .set_state(existing.id, SymbolState::Active)
                    .await?
                {
                    return Err(PriceFeedError::not_found(format!("symbol id {}", existing.id)));
                }
                existing.state = SymbolState::Active;
                tracing::info!(symbol = name, id = existing.id, "symbol reactivated");
                existing
            }
            None => {
                let created = self.store.insert(name, Utc::now()).await?;
                tracing::info!(symbol = name, id = created.id, "symbol registered");
                created
            }
        };
        self.cache.invalidate_all();
        Ok(out)
    }

    /// Look up a symbol by id, regardless of state.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn get(&self, id: SymbolId) -> Result<Option<Symbol>, PriceFeedError> {
        if let Some(hit) = self.cache.by_id.get(&id).await {
            return Ok(Some(hit));
        }
        let seen = self.cache.generation();
        let found = self.store.by_id(id).await?;
        if let Some(s) = &found {
            self.cache.remember(s, seen).await;
        }
        Ok(found)
    }

    /// Look up a symbol by pair name, regardless of state.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn get_by_name(&self, symbol: &str) -> Result<Option<Symbol>, PriceFeedError> {
        if let Some(hit) = self.cache.by_name.get(symbol).await {
            return Ok(Some(hit));
        }
        let seen = self.cache.generation();
        let found = self.store.by_name(symbol).await?;
        if let Some(s) = &found {
            self.cache.remember(s, seen).await;
        }
        Ok(found)
    }

    /// Look up a symbol that must exist, in any state. The name is trimmed
    /// the same way `register` trims it.
    ///
    /// # Errors
    /// Returns `NotRegistered` when no row exists for `symbol`.
    pub async fn require(&self, symbol: &str) -> Result<Symbol, PriceFeedError> {
        let name = symbol.trim();
        self.get_by_name(name)
            .await?
            .ok_or_else(|| PriceFeedError::not_registered(name))
    }

    /// Active symbols, ordered by name.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn list_active(&self) -> Result<Arc<Vec<Symbol>>, PriceFeedError> {
        self.list(true).await
    }

    /// Every registered symbol, active or not, ordered by name.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn list_all(&self) -> Result<Arc<Vec<Symbol>>, PriceFeedError> {
        self.list(false).await
    }

    async fn list(&self, active_only: bool) -> Result<Arc<Vec<Symbol>>, PriceFeedError> {
        if let Some(hit) = self.cache.lists.get(&active_only).await {
            return Ok(hit);
        }
        let seen = self.cache.generation();
        let rows = Arc::new(self.store.list(active_only).await?);
        self.cache.remember_list(active_only, &rows, seen).await;
        Ok(rows)
    }

    /// Soft-delete a symbol; its history is kept. Returns false for an unknown id.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn deactivate(&self, id: SymbolId) -> Result<bool, PriceFeedError> {
        let changed = self.store.set_state(id, SymbolState::Inactive).await?;
        self.cache.invalidate_all();
        if changed {
            tracing::info!(id, "symbol deactivated");
        }
        Ok(changed)
    }

    /// Record the most recent live price. Returns false for an unknown id.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn update_last_price(&self, id: SymbolId, price: f64) -> Result<bool, PriceFeedError> {
        let changed = self.store.set_last_price(id, price, Utc::now()).await?;
        self.cache.invalidate_all();
        Ok(changed)
    }
}
