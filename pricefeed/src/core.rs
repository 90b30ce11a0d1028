use std::sync::Arc;

use pricefeed_core::{
    BackfillConfig, ExchangeConnector, HeartbeatConfig, PriceFeedConfig, PriceFeedError,
    PriceStore, RetryConfig, RetryPolicy, SymbolStore,
};

use crate::planner::GapFillPlanner;
use crate::registry::SymbolRegistry;

/// Orchestrator that keeps minute price history for registered symbols.
///
/// Owns the exchange connector, the price store, the symbol registry, the
/// gap-fill planner and the retry policy. Cheap to share behind an `Arc`.
pub struct PriceFeed {
    pub(crate) exchange: Arc<dyn ExchangeConnector>,
    pub(crate) prices: Arc<dyn PriceStore>,
    pub(crate) registry: SymbolRegistry,
    pub(crate) cfg: PriceFeedConfig,
    pub(crate) retry: RetryPolicy,
    pub(crate) planner: GapFillPlanner,
    pub(crate) span: tracing::Span,
}

/// Builder for constructing a `PriceFeed` with custom configuration.
pub struct PriceFeedBuilder {
    exchange: Option<Arc<dyn ExchangeConnector>>,
    prices: Option<Arc<dyn PriceStore>>,
    symbols: Option<Arc<dyn SymbolStore>>,
    cfg: PriceFeedConfig,
    span: Option<tracing::Span>,
}

impl Default for PriceFeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceFeedBuilder {
    /// Create a new builder with the default configuration.
    ///
    /// Behavior and trade-offs:
    /// - Starts with no exchange and no stores; all three must be supplied.
    /// - Defaults follow the reference deployment: 5 minutes of history,
    ///   gap filling on with a 1 minute threshold and a 1000 minute cap,
    ///   3 retry attempts starting at 1 s.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exchange: None,
            prices: None,
            symbols: None,
            cfg: PriceFeedConfig::default(),
            span: None,
        }
    }

    /// Set the exchange connector used for tickers and candles.
    #[must_use]
    pub fn with_exchange(mut self, exchange: Arc<dyn ExchangeConnector>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Set the store that holds price points.
    #[must_use]
    pub fn with_price_store(mut self, store: Arc<dyn PriceStore>) -> Self {
        self.prices = Some(store);
        self
    }

    /// Set the store that persists registered symbols.
    #[must_use]
    pub fn with_symbol_store(mut self, store: Arc<dyn SymbolStore>) -> Self {
        self.symbols = Some(store);
        self
    }

    /// Use one backend for both prices and symbols.
    #[must_use]
    pub fn with_store<S>(self, store: Arc<S>) -> Self
    where
        S: PriceStore + SymbolStore + 'static,
    {
        let prices: Arc<dyn PriceStore> = store.clone();
        let symbols: Arc<dyn SymbolStore> = store;
        self.with_price_store(prices).with_symbol_store(symbols)
    }

    /// Replace the whole configuration.
    #[must_use]
    pub const fn config(mut self, cfg: PriceFeedConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the backfill and gap-fill settings.
    ///
    /// Behavior and trade-offs:
    /// - A larger `max_gap_fill_minutes` recovers longer outages in one pass at
    ///   the cost of bigger exchange requests.
    /// - `concurrency > 1` backfills several symbols at once during sweeps;
    ///   each symbol is still handled by a single task.
    #[must_use]
    pub const fn backfill(mut self, cfg: BackfillConfig) -> Self {
        self.cfg.backfill = cfg;
        self
    }

    /// Set the heartbeat cadence used by coordinators built from this feed.
    #[must_use]
    pub const fn heartbeat(mut self, cfg: HeartbeatConfig) -> Self {
        self.cfg.heartbeat = cfg;
        self
    }

    /// Set the retry policy applied around exchange calls.
    ///
    /// Behavior and trade-offs:
    /// - Only transient exchange errors are retried.
    /// - More attempts ride out longer blips but delay the final error.
    #[must_use]
    pub const fn retry(mut self, cfg: RetryConfig) -> Self {
        self.cfg.retry = cfg;
        self
    }

    /// Attach a tracing span that parents every event the feed emits.
    #[must_use]
    pub fn span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Build the `PriceFeed`.
    ///
    /// # Errors
    /// - `InvalidArg` if the exchange or either store is missing.
    /// - `InvalidConfig` if the configuration fails validation.
    pub fn build(self) -> Result<PriceFeed, PriceFeedError> {
        let exchange = self.exchange.ok_or_else(|| {
            PriceFeedError::InvalidArg(
                "no exchange connector; add one via with_exchange(...)".to_string(),
            )
        })?;
        let prices = self.prices.ok_or_else(|| {
            PriceFeedError::InvalidArg(
                "no price store; add one via with_price_store(...) or with_store(...)".to_string(),
            )
        })?;
        let symbols = self.symbols.ok_or_else(|| {
            PriceFeedError::InvalidArg(
                "no symbol store; add one via with_symbol_store(...) or with_store(...)"
                    .to_string(),
            )
        })?;
        self.cfg.validate()?;

        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("backfill", exchange = exchange.name()));

        Ok(PriceFeed {
            exchange,
            prices,
            registry: SymbolRegistry::new(symbols),
            retry: RetryPolicy::new(self.cfg.retry),
            planner: GapFillPlanner::from_config(&self.cfg.backfill),
            cfg: self.cfg,
            span,
        })
    }
}

impl PriceFeed {
    /// Start building a new `PriceFeed`.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use pricefeed::{PriceFeed, InMemoryStore};
    /// use pricefeed_mock::MockExchange;
    ///
    /// let feed = PriceFeed::builder()
    ///     .with_exchange(Arc::new(MockExchange::new()))
    ///     .with_store(Arc::new(InMemoryStore::new()))
    ///     .build()?;
    /// feed.registry().register("BTC/USDT").await?;
    /// let report = feed.backfill_symbol("BTC/USDT", None).await?;
    /// ```
    #[must_use]
    pub fn builder() -> PriceFeedBuilder {
        PriceFeedBuilder::new()
    }

    /// The symbol registry.
    #[must_use]
    pub const fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    /// The price store.
    #[must_use]
    pub fn prices(&self) -> &dyn PriceStore {
        self.prices.as_ref()
    }

    /// The exchange connector.
    #[must_use]
    pub fn exchange(&self) -> &dyn ExchangeConnector {
        self.exchange.as_ref()
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &PriceFeedConfig {
        &self.cfg
    }

    /// The gap-fill planner configured from the backfill settings.
    #[must_use]
    pub const fn planner(&self) -> &GapFillPlanner {
        &self.planner
    }

    /// The span that parents this feed's events.
    #[must_use]
    pub const fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Check that the price store is reachable.
    ///
    /// # Errors
    /// Returns the store's error when it is unreachable.
    pub async fn health(&self) -> Result<(), PriceFeedError> {
        self.prices.ping().await
    }
}
