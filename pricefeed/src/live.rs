use tracing::Instrument;

use pricefeed_core::{PriceFeedError, PriceFetchReport, PricePoint, Symbol, Ticker, floor_to_minute};

use crate::core::PriceFeed;

impl PriceFeed {
    /// Capture the live price of every active symbol.
    ///
    /// Behavior and trade-offs:
    /// - One batch ticker request is made under the retry policy; if it still
    ///   fails, every symbol gets a failed report carrying that error.
    /// - A pair missing from the batch response is a per-symbol failure.
    /// - Each captured price is stored as a flat point (open = high = low =
    ///   close, volume 0) at the ticker's minute and cached on the registry.
    ///
    /// # Errors
    /// Fails only when the active symbols cannot be listed; everything after
    /// that is reported per symbol.
    pub async fn fetch_all_prices(&self) -> Result<Vec<PriceFetchReport>, PriceFeedError> {
        self.fetch_all_prices_inner()
            .instrument(self.span.clone())
            .await
    }

    async fn fetch_all_prices_inner(&self) -> Result<Vec<PriceFetchReport>, PriceFeedError> {
        let symbols = self.registry.list_active().await?;
        if symbols.is_empty() {
            tracing::debug!("no active symbols to fetch");
            return Ok(Vec::new());
        }

        let Some(tickers) = self.exchange.as_ticker_provider() else {
            let e = PriceFeedError::unsupported("tickers");
            return Ok(symbols
                .iter()
                .map(|s| PriceFetchReport::failed(s.symbol.clone(), e.clone()))
                .collect());
        };

        let names: Vec<String> = symbols.iter().map(|s| s.symbol.clone()).collect();
        let mut batch = match self
            .retry
            .run("fetch_tickers", || tickers.fetch_tickers(&names))
            .await
        {
            Ok(map) => map,
            Err(e) => {
                tracing::error!(error = %e, "batch ticker fetch failed");
                return Ok(names
                    .iter()
                    .map(|n| PriceFetchReport::failed(n.clone(), e.clone()))
                    .collect());
            }
        };

        let mut out = Vec::with_capacity(symbols.len());
        for sym in symbols.iter() {
            let report = match batch.remove(&sym.symbol) {
                Some(ticker) => match self.store_ticker(sym, &ticker).await {
                    Ok(ts) => PriceFetchReport::captured(sym.symbol.clone(), ticker.last, ts),
                    Err(e) => PriceFetchReport::failed(sym.symbol.clone(), e),
                },
                None => PriceFetchReport::failed(
                    sym.symbol.clone(),
                    PriceFeedError::Data(format!("No ticker data returned for {}", sym.symbol)),
                ),
            };
            out.push(report);
        }

        let ok = out.iter().filter(|r| r.is_success()).count();
        tracing::info!(ok, total = out.len(), "price fetch complete");
        Ok(out)
    }

    /// Capture the live price of a single registered symbol.
    ///
    /// Never fails: an unregistered symbol, a missing ticker capability and
    /// exchange or store errors are all reported through the returned report.
    pub async fn fetch_price(&self, symbol: &str) -> PriceFetchReport {
        self.fetch_price_inner(symbol)
            .instrument(self.span.clone())
            .await
            .unwrap_or_else(|e| PriceFetchReport::failed(symbol, e))
    }

    async fn fetch_price_inner(&self, symbol: &str) -> Result<PriceFetchReport, PriceFeedError> {
        let sym = self.registry.require(symbol).await?;
        let symbol = sym.symbol.as_str();
        let tickers = self
            .exchange
            .as_ticker_provider()
            .ok_or_else(|| PriceFeedError::unsupported("tickers"))?;
        let ticker = self
            .retry
            .run("fetch_ticker", || tickers.fetch_ticker(symbol))
            .await?;
        let ts = self.store_ticker(&sym, &ticker).await?;
        Ok(PriceFetchReport::captured(symbol, ticker.last, ts))
    }

    async fn store_ticker(&self, sym: &Symbol, ticker: &Ticker) -> Result<i64, PriceFeedError> {
        let ts = floor_to_minute(ticker.timestamp);
        self.prices
            .upsert(PricePoint::flat(sym.id, ts, ticker.last))
            .await?;
        self.registry.update_last_price(sym.id, ticker.last).await?;
        tracing::debug!(symbol = %sym.symbol, price = ticker.last, ts, "price stored");
        Ok(ts)
    }
}
