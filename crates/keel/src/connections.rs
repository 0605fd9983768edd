//! Process-wide registry of connection pools, shared by every session
//! factory whose properties have the same connection key.

use crate::connect::driver;

use keel_core::{
    driver::{ConnectionPool, ConnectionProperties},
    Result,
};

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};
use tokio::sync::Mutex;

struct Connection {
    pool: Arc<dyn ConnectionPool>,

    /// Session factories holding the pool
    factories: usize,
}

fn connections() -> &'static Mutex<HashMap<String, Connection>> {
    static CONNECTIONS: OnceLock<Mutex<HashMap<String, Connection>>> = OnceLock::new();
    CONNECTIONS.get_or_init(Default::default)
}

/// The pool for `properties`, connecting on first use. Each call must be
/// matched by one [`release`].
pub(crate) async fn acquire(properties: &ConnectionProperties) -> Result<Arc<dyn ConnectionPool>> {
    let key = properties.connection_key();
    let mut connections = connections().lock().await;

    if let Some(connection) = connections.get_mut(&key) {
        connection.factories += 1;
        tracing::debug!(%key, factories = connection.factories, "reusing connection pool");
        return Ok(connection.pool.clone());
    }

    let pool = driver(&properties.adapter)?.connect(properties).await?;
    tracing::debug!(%key, "connected");

    connections.insert(
        key,
        Connection {
            pool: pool.clone(),
            factories: 1,
        },
    );

    Ok(pool)
}

/// Drops one factory's hold on the pool, closing it when no factory is left.
pub(crate) async fn release(key: &str) -> Result<()> {
    let mut connections = connections().lock().await;

    let Some(connection) = connections.get_mut(key) else {
        return Ok(());
    };

    connection.factories -= 1;
    if connection.factories > 0 {
        return Ok(());
    }

    if let Some(connection) = connections.remove(key) {
        tracing::debug!(%key, "closing connection pool");
        connection.pool.close().await?;
    }

    Ok(())
}
