use crate::{context, Callback, Session, SessionFactory};

use keel_core::{
    driver::{ConnectionProperties, Driver},
    mapping::Mappings,
    Error, Promise, Result,
};

use std::sync::Arc;

/// Connects to the storage engine named by `properties.adapter` and returns
/// a session factory for `mappings`.
pub fn connect(
    properties: ConnectionProperties,
    mappings: Mappings,
    callback: Option<Callback<SessionFactory>>,
) -> Promise<SessionFactory> {
    context::run("connect", callback, SessionFactory::connect(properties, mappings))
}

/// Connects and opens one session on a factory of its own. Closing the
/// session closes that factory and releases its hold on the pool.
pub fn open_session(
    properties: ConnectionProperties,
    mappings: Mappings,
    callback: Option<Callback<Session>>,
) -> Promise<Session> {
    context::run("open_session", callback, async move {
        let factory = SessionFactory::connect(properties, mappings).await?;
        match factory.open_session_impl(true).await {
            Ok(session) => Ok(session),
            Err(err) => {
                // The session never took ownership, so the factory is closed here
                let _ = factory.close(None).await;
                Err(err)
            }
        }
    })
}

pub(crate) fn driver(adapter: &str) -> Result<Arc<dyn Driver>> {
    match adapter {
        "memory" => memory(),
        "" => Err(Error::invalid_argument("connection properties name no adapter")),
        adapter => Err(Error::invalid_argument(format!(
            "unsupported adapter; adapter={adapter}"
        ))),
    }
}

#[cfg(feature = "memory")]
fn memory() -> Result<Arc<dyn Driver>> {
    Ok(Arc::new(keel_driver_memory::Memory))
}

#[cfg(not(feature = "memory"))]
fn memory() -> Result<Arc<dyn Driver>> {
    Err(Error::invalid_argument("`memory` feature not enabled"))
}
