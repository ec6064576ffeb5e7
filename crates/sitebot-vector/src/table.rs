//! LanceDB connection and housekeeping helpers.

use anyhow::{Result, anyhow};
use lancedb::{connect, Connection, Table};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Open a table that the indexer must already have built.
pub async fn open_existing(conn: &Connection, name: &str) -> Result<Table> {
    if !table_exists(conn, name).await? {
        return Err(anyhow!("table '{}' not found; run the indexer first", name));
    }
    Ok(conn.open_table(name).execute().await?)
}
