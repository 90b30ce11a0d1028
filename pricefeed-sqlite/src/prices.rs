use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use pricefeed_core::{PriceFeedError, PricePoint, PriceStore, SymbolId, check_point};

use crate::SqliteStore;

const UPSERT: &str = "INSERT INTO price_data (symbol_id, timestamp, open, high, low, close, volume)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(symbol_id, timestamp) DO UPDATE SET
         open = excluded.open,
         high = excluded.high,
         low = excluded.low,
         close = excluded.close,
         volume = excluded.volume";

const COLUMNS: &str = "symbol_id, timestamp, open, high, low, close, volume";

fn point_from_row(row: &Row<'_>) -> rusqlite::Result<PricePoint> {
    Ok(PricePoint {
        symbol_id: row.get(0)?,
        timestamp: row.get(1)?,
        open: row.get(2)?,
        high: row.get(3)?,
        low: row.get(4)?,
        close: row.get(5)?,
        volume: row.get(6)?,
    })
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl PriceStore for SqliteStore {
    async fn upsert(&self, point: PricePoint) -> Result<(), PriceFeedError> {
        check_point(&point)?;
        self.with_conn("upsert", move |conn| {
            conn.execute(
                UPSERT,
                params![
                    point.symbol_id,
                    point.timestamp,
                    point.open,
                    point.high,
                    point.low,
                    point.close,
                    point.volume
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn upsert_many(&self, points: &[PricePoint]) -> Result<usize, PriceFeedError> {
        for p in points {
            check_point(p)?;
        }
        if points.is_empty() {
            return Ok(0);
        }
        let points = points.to_vec();
        self.with_conn("upsert_many", move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(UPSERT)?;
                for p in &points {
                    stmt.execute(params![
                        p.symbol_id,
                        p.timestamp,
                        p.open,
                        p.high,
                        p.low,
                        p.close,
                        p.volume
                    ])?;
                }
            }
            tx.commit()?;
            Ok(points.len())
        })
        .await
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
        self.with_conn("range", move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM price_data
                 WHERE symbol_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
                 ORDER BY timestamp ASC"
            ))?;
            stmt.query_map(params![symbol_id, start_ms, end_ms], point_from_row)?
                .collect()
        })
        .await
    }

    async fn latest(&self, symbol_id: SymbolId) -> Result<Option<PricePoint>, PriceFeedError> {
        self.with_conn("latest", move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM price_data WHERE symbol_id = ?1
                     ORDER BY timestamp DESC LIMIT 1"
                ),
                params![symbol_id],
                point_from_row,
            )
            .optional()
        })
        .await
    }

    async fn oldest(&self, symbol_id: SymbolId) -> Result<Option<PricePoint>, PriceFeedError> {
        self.with_conn("oldest", move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM price_data WHERE symbol_id = ?1
                     ORDER BY timestamp ASC LIMIT 1"
                ),
                params![symbol_id],
                point_from_row,
            )
            .optional()
        })
        .await
    }

    async fn before(
        &self,
        symbol_id: SymbolId,
        ts_ms: i64,
        limit: usize,
    ) -> Result<Vec<PricePoint>, PriceFeedError> {
        self.with_conn("before", move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM price_data
                 WHERE symbol_id = ?1 AND timestamp < ?2
                 ORDER BY timestamp DESC LIMIT ?3"
            ))?;
            stmt.query_map(params![symbol_id, ts_ms, sql_limit(limit)], point_from_row)?
                .collect()
        })
        .await
    }

    async fn after(
        &self,
        symbol_id: SymbolId,
        ts_ms: i64,
        limit: usize,
    ) -> Result<Vec<PricePoint>, PriceFeedError> {
        self.with_conn("after", move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {COLUMNS} FROM price_data
                 WHERE symbol_id = ?1 AND timestamp > ?2
                 ORDER BY timestamp ASC LIMIT ?3"
            ))?;
            stmt.query_map(params![symbol_id, ts_ms, sql_limit(limit)], point_from_row)?
                .collect()
        })
        .await
    }

    async fn count(&self, symbol_id: SymbolId) -> Result<u64, PriceFeedError> {
        let n: i64 = self
            .with_conn("count", move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM price_data WHERE symbol_id = ?1",
                    params![symbol_id],
                    |row| row.get(0),
                )
            })
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
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
        let removed = self
            .with_conn("delete_range", move |conn| {
                conn.execute(
                    "DELETE FROM price_data
                     WHERE symbol_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3",
                    params![symbol_id, start_ms, end_ms],
                )
            })
            .await?;
        Ok(removed as u64)
    }

    async fn ping(&self) -> Result<(), PriceFeedError> {
        self.with_conn("ping", |conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        })
        .await
        .map(|_| ())
    }
}
