//! `integrations` table: per-vendor endpoint and last known status.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use super::types::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, Serialize)]
pub struct IntegrationRow {
    pub service_name: String,
    pub endpoint: String,
    pub status: String,
    pub last_check: Option<DateTime<Utc>>,
}

/// Insert or update a vendor row. `last_check` is only overwritten when given.
pub fn upsert_integration(
    conn: &Connection,
    service_name: &str,
    endpoint: &str,
    status: &str,
    last_check: Option<DateTime<Utc>>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO integrations (service_name, endpoint, status, last_check) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(service_name) DO UPDATE SET endpoint = excluded.endpoint, \
         status = excluded.status, \
         last_check = COALESCE(excluded.last_check, integrations.last_check)",
        params![
            service_name,
            endpoint,
            status,
            last_check.map(format_timestamp)
        ],
    )?;
    Ok(())
}

pub fn list_integrations(conn: &Connection) -> Result<Vec<IntegrationRow>> {
    let mut stmt = conn.prepare(
        "SELECT service_name, endpoint, status, last_check FROM integrations ORDER BY service_name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let raw: Option<String> = row.get(3)?;
            Ok(IntegrationRow {
                service_name: row.get(0)?,
                endpoint: row.get(1)?,
                status: row.get(2)?,
                last_check: raw.map(|r| parse_timestamp(3, &r)).transpose()?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
