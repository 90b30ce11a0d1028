use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use pricefeed_core::{PriceFeedError, Symbol, SymbolId, SymbolState, SymbolStore};

use crate::SqliteStore;

const COLUMNS: &str = "id, symbol, is_active, created_at, last_price, last_price_at";

fn encode_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn symbol_from_row(row: &Row<'_>) -> rusqlite::Result<Symbol> {
    let created_at: String = row.get(3)?;
    let last_price_at: Option<String> = row.get(5)?;
    Ok(Symbol {
        id: row.get(0)?,
        symbol: row.get(1)?,
        state: if row.get::<_, bool>(2)? {
            SymbolState::Active
        } else {
            SymbolState::Inactive
        },
        created_at: decode_time(3, &created_at)?,
        last_price: row.get(4)?,
        last_price_at: last_price_at.map(|s| decode_time(5, &s)).transpose()?,
    })
}

#[async_trait]
impl SymbolStore for SqliteStore {
    async fn insert(
        &self,
        symbol: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Symbol, PriceFeedError> {
        let name = symbol.to_string();
        let stamp = encode_time(created_at);
        let id: SymbolId = self
            .with_conn("insert_symbol", move |conn| {
                conn.execute(
                    "INSERT INTO symbols (symbol, is_active, created_at) VALUES (?1, 1, ?2)",
                    params![name, stamp],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(Symbol {
            id,
            symbol: symbol.to_string(),
            state: SymbolState::Active,
            created_at,
            last_price: None,
            last_price_at: None,
        })
    }

    async fn by_id(&self, id: SymbolId) -> Result<Option<Symbol>, PriceFeedError> {
        self.with_conn("symbol_by_id", move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM symbols WHERE id = ?1"),
                params![id],
                symbol_from_row,
            )
            .optional()
        })
        .await
    }

    async fn by_name(&self, symbol: &str) -> Result<Option<Symbol>, PriceFeedError> {
        let name = symbol.to_string();
        self.with_conn("symbol_by_name", move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM symbols WHERE symbol = ?1"),
                params![name],
                symbol_from_row,
            )
            .optional()
        })
        .await
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Symbol>, PriceFeedError> {
        self.with_conn("list_symbols", move |conn| {
            let sql = if active_only {
                format!("SELECT {COLUMNS} FROM symbols WHERE is_active = 1 ORDER BY symbol")
            } else {
                format!("SELECT {COLUMNS} FROM symbols ORDER BY symbol")
            };
            let mut stmt = conn.prepare_cached(&sql)?;
            stmt.query_map([], symbol_from_row)?.collect()
        })
        .await
    }

    async fn set_state(&self, id: SymbolId, state: SymbolState) -> Result<bool, PriceFeedError> {
        let active = state == SymbolState::Active;
        let changed = self
            .with_conn("set_symbol_state", move |conn| {
                conn.execute(
                    "UPDATE symbols SET is_active = ?1 WHERE id = ?2",
                    params![active, id],
                )
            })
            .await?;
        Ok(changed > 0)
    }

    async fn set_last_price(
        &self,
        id: SymbolId,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, PriceFeedError> {
        let stamp = encode_time(at);
        let changed = self
            .with_conn("set_last_price", move |conn| {
                conn.execute(
                    "UPDATE symbols SET last_price = ?1, last_price_at = ?2 WHERE id = ?3",
                    params![price, stamp, id],
                )
            })
            .await?;
        Ok(changed > 0)
    }
}
