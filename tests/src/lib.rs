pub mod models;
pub mod prelude;

// Re-export for use in macros
pub use keel;

pub use std_util::*;

use keel::{ConnectionProperties, Entity, Mappings, Session, SessionFactory, TableMapping};

use std::sync::atomic::{AtomicUsize, Ordering};

/// A domain type together with the mapping its tests register.
pub trait Model: Entity + Default {
    fn mapping() -> TableMapping;
}

#[macro_export]
macro_rules! models {
    (
        $( $model:ty ),* $(,)?
    ) => {{
        let mut mappings = $crate::keel::Mappings::new();
        $(
            mappings
                .register::<$model>(<$model as $crate::Model>::mapping())
                .unwrap();
        )*
        mappings
    }};
}

/// Routes tracing output through the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Memory connection properties whose default database no other test in
/// the process uses. Every factory shares one store, so tests keep apart by
/// database.
pub fn properties() -> ConnectionProperties {
    static NEXT: AtomicUsize = AtomicUsize::new(0);

    let database = format!("test_{}", NEXT.fetch_add(1, Ordering::Relaxed));
    ConnectionProperties::new("memory").database(database)
}

pub struct Fixture {
    pub factory: SessionFactory,
    pub session: Session,
}

impl Fixture {
    /// Connects, opens a session, and creates a table for every mapping.
    pub async fn setup(mappings: Mappings) -> Fixture {
        Self::with_tables(mappings, vec![]).await
    }

    /// Like [`Fixture::setup`], also creating the tables of `extra`, which
    /// have no domain type.
    pub async fn with_tables(mappings: Mappings, extra: Vec<TableMapping>) -> Fixture {
        init_tracing();

        let factory = keel::connect(properties(), mappings.clone(), None)
            .await
            .unwrap();
        let session = factory.open_session(None).await.unwrap();

        let tables = mappings.iter().map(|descriptor| descriptor.mapping.clone());
        for mapping in tables.chain(extra) {
            session.create_table(mapping, None).await.unwrap();
        }

        Fixture { factory, session }
    }

    pub fn database(&self) -> &str {
        &self.factory.properties().database
    }

    pub async fn teardown(self) {
        self.factory.close(None).await.unwrap();
    }
}
