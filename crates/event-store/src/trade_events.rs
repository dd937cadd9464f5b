//! Event Store: append-only log of upstream trade observations.

use chrono::{DateTime, Utc};
use futures_util::Stream;
use sim_core::types::{EventSource, Side, TradeEvent};
use sim_core::{Error, Result};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::info;

pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bulk-loads `events` via `COPY` into an unlogged scratch table, drains
    /// it into `trade_events` with `ON CONFLICT (signature) DO NOTHING`, then
    /// resolves the assigned id of every signature in the batch — including
    /// ones that were already present, so a caller that re-ingests the same
    /// signature still gets back the original row's id.
    pub async fn insert_batch(&self, events: &[TradeEvent]) -> Result<HashMap<String, i64>> {
        if events.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.pool.acquire().await?;

        let mut copy_in = conn
            .copy_in_raw(
                "COPY scratch_trade_events (
                    signature, mint, trader, side, token_amount, sol_amount,
                    new_token_balance, curve_key, v_tokens_post, v_sol_post,
                    market_cap_sol, pool, received_at
                ) FROM STDIN WITH (FORMAT csv)",
            )
            .await?;

        let mut buf = String::new();
        for event in events {
            write_csv_row(&mut buf, event);
        }
        copy_in.send(buf.into_bytes()).await?;
        copy_in.finish().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO trade_events (
                signature, mint, trader, side, token_amount, sol_amount,
                new_token_balance, curve_key, v_tokens_post, v_sol_post,
                market_cap_sol, pool, received_at
            )
            SELECT
                signature, mint, trader, side, token_amount, sol_amount,
                new_token_balance, curve_key, v_tokens_post, v_sol_post,
                market_cap_sol, pool, received_at
            FROM scratch_trade_events
            ON CONFLICT (signature) DO NOTHING
            "#,
        )
        .execute(&mut *conn)
        .await?;

        let signatures: Vec<&str> = events.iter().map(|e| e.signature.as_str()).collect();
        let id_rows = sqlx::query("SELECT id, signature FROM trade_events WHERE signature = ANY($1)")
            .bind(&signatures)
            .fetch_all(&mut *conn)
            .await?;
        let mut ids = HashMap::with_capacity(id_rows.len());
        for row in &id_rows {
            let signature: String = row.try_get("signature").map_err(Error::from)?;
            let id: i64 = row.try_get("id").map_err(Error::from)?;
            ids.insert(signature, id);
        }

        sqlx::query("TRUNCATE scratch_trade_events")
            .execute(&mut *conn)
            .await?;

        let inserted = result.rows_affected() as usize;
        info!(
            requested = events.len(),
            inserted,
            resolved = ids.len(),
            "trade event batch inserted"
        );
        Ok(ids)
    }

    /// Forward-only, memory-bounded stream of events with
    /// `received_at ∈ [from, to]`, ordered by `(received_at, id)`.
    pub fn stream_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Stream<Item = Result<TradeEvent>> + '_ {
        async_stream::try_stream! {
            let mut rows = sqlx::query(
                r#"
                SELECT id, signature, mint, trader, side, token_amount, sol_amount,
                       new_token_balance, curve_key, v_tokens_post, v_sol_post,
                       market_cap_sol, pool, received_at, ingested_at
                FROM trade_events
                WHERE received_at >= $1 AND received_at <= $2
                ORDER BY received_at, id
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch(&self.pool);

            use futures_util::StreamExt;
            while let Some(row) = rows.next().await {
                yield row_to_event(&row?)?;
            }
        }
    }

    /// Same guarantees as `stream_range`, additionally filtered by `trader`.
    pub fn stream_by_trader(
        &self,
        trader: String,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Stream<Item = Result<TradeEvent>> + '_ {
        async_stream::try_stream! {
            let mut rows = sqlx::query(
                r#"
                SELECT id, signature, mint, trader, side, token_amount, sol_amount,
                       new_token_balance, curve_key, v_tokens_post, v_sol_post,
                       market_cap_sol, pool, received_at, ingested_at
                FROM trade_events
                WHERE trader = $1 AND received_at >= $2 AND received_at <= $3
                ORDER BY received_at, id
                "#,
            )
            .bind(&trader)
            .bind(from)
            .bind(to)
            .fetch(&self.pool);

            use futures_util::StreamExt;
            while let Some(row) = rows.next().await {
                yield row_to_event(&row?)?;
            }
        }
    }
}

fn side_to_i16(side: Side) -> i16 {
    match side {
        Side::Buy => 0,
        Side::Sell => 1,
    }
}

fn side_from_i16(value: i16) -> Side {
    if value == 0 {
        Side::Buy
    } else {
        Side::Sell
    }
}

fn write_csv_row(buf: &mut String, event: &TradeEvent) {
    let _ = write!(
        buf,
        "{},{},{},{},{},{},{},{},{},{},{},{},{}\r\n",
        csv_escape(&event.signature),
        csv_escape(&event.mint),
        csv_escape(&event.trader),
        side_to_i16(event.side),
        event.token_amount,
        event.sol_amount,
        event.new_token_balance,
        csv_escape(&event.curve_key),
        event.v_tokens_post,
        event.v_sol_post,
        event.market_cap_sol,
        event.pool.as_deref().map(csv_escape).unwrap_or_default(),
        event.received_at.to_rfc3339(),
    );
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row_to_event(row: &sqlx::postgres::PgRow) -> Result<TradeEvent> {
    let pool: Option<String> = row.try_get("pool").map_err(Error::from)?;
    Ok(TradeEvent {
        id: row.try_get("id").map_err(Error::from)?,
        signature: row.try_get("signature").map_err(Error::from)?,
        mint: row.try_get("mint").map_err(Error::from)?,
        trader: row.try_get("trader").map_err(Error::from)?,
        side: side_from_i16(row.try_get("side").map_err(Error::from)?),
        token_amount: row.try_get("token_amount").map_err(Error::from)?,
        sol_amount: row.try_get("sol_amount").map_err(Error::from)?,
        new_token_balance: row.try_get("new_token_balance").map_err(Error::from)?,
        curve_key: row.try_get("curve_key").map_err(Error::from)?,
        v_tokens_post: row.try_get("v_tokens_post").map_err(Error::from)?,
        v_sol_post: row.try_get("v_sol_post").map_err(Error::from)?,
        market_cap_sol: row.try_get("market_cap_sol").map_err(Error::from)?,
        pool,
        received_at: row.try_get("received_at").map_err(Error::from)?,
        ingested_at: row.try_get("ingested_at").map_err(Error::from)?,
        // The store itself is agnostic to live/replay; the Replay Driver
        // stamps `Replay` on events it reads from here before enqueuing them.
        source: EventSource::Live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn csv_escape_quotes_commas_and_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn csv_row_is_well_formed_for_a_typical_event() {
        let event = TradeEvent {
            id: None,
            signature: "sig-1".to_string(),
            mint: "mint1".to_string(),
            trader: "trader1".to_string(),
            side: Side::Buy,
            token_amount: dec!(100),
            sol_amount: dec!(1.5),
            new_token_balance: dec!(100),
            curve_key: "curve1".to_string(),
            v_tokens_post: dec!(1_000_000_000),
            v_sol_post: dec!(30),
            market_cap_sol: dec!(30),
            pool: Some("pump".to_string()),
            received_at: Utc::now(),
            ingested_at: None,
            source: EventSource::Live,
        };
        let mut buf = String::new();
        write_csv_row(&mut buf, &event);
        assert!(buf.starts_with("sig-1,mint1,trader1,0,"));
        assert!(buf.ends_with("\r\n"));
    }
}
