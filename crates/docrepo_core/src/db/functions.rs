//! SQL scalar functions evaluating document predicates inside SQLite.
//!
//! # Responsibility
//! - Expose equality/fuzzy, within-radius and full-text matching to SQL so
//!   that `COUNT(*)`, `LIMIT` and `OFFSET` run inside the engine.
//!
//! # Invariants
//! - Functions are deterministic and side-effect free.
//! - A malformed stored body is an error, not a silent non-match.

use crate::search::equality::values_match;
use crate::search::field::{lookup, lookup_f64};
use crate::search::geo::within_radius;
use crate::search::text::value_matches;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;
use serde_json::Value;

pub const DOC_EQUALS: &str = "doc_equals";
pub const DOC_WITHIN_RADIUS: &str = "doc_within_radius";
pub const DOC_SEARCH: &str = "doc_search";

/// Registers all document match functions on `conn`.
pub fn register_match_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    // doc_equals(body, field, expected_json, similarity_or_null)
    conn.create_scalar_function(DOC_EQUALS, 4, flags, |ctx| {
        let body = json_arg(ctx, 0)?;
        let field: String = ctx.get(1)?;
        let expected = json_arg(ctx, 2)?;
        let similarity: Option<f64> = ctx.get(3)?;
        Ok(lookup(&body, &field)
            .is_some_and(|actual| values_match(actual, &expected, similarity)))
    })?;

    // doc_within_radius(body, lat_field, lon_field, lat, lon, radius_km)
    conn.create_scalar_function(DOC_WITHIN_RADIUS, 6, flags, |ctx| {
        let body = json_arg(ctx, 0)?;
        let lat_field: String = ctx.get(1)?;
        let lon_field: String = ctx.get(2)?;
        let center_lat: f64 = ctx.get(3)?;
        let center_lon: f64 = ctx.get(4)?;
        let radius: f64 = ctx.get(5)?;
        Ok(
            match (lookup_f64(&body, &lat_field), lookup_f64(&body, &lon_field)) {
                (Some(lat), Some(lon)) => within_radius(lat, lon, center_lat, center_lon, radius),
                _ => false,
            },
        )
    })?;

    // doc_search(body, field, term)
    conn.create_scalar_function(DOC_SEARCH, 3, flags, |ctx| {
        let body = json_arg(ctx, 0)?;
        let field: String = ctx.get(1)?;
        let term: String = ctx.get(2)?;
        Ok(lookup(&body, &field).is_some_and(|value| value_matches(value, &term)))
    })?;

    Ok(())
}

fn json_arg(ctx: &Context<'_>, index: usize) -> rusqlite::Result<Value> {
    let raw: String = ctx.get(index)?;
    serde_json::from_str(&raw).map_err(|err| rusqlite::Error::UserFunctionError(Box::new(err)))
}
