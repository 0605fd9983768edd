use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};
use url::Url;

/// How to reach a storage engine.
///
/// Parsed from a URL such as `memory://localhost/shop?pool_size=4`, where
/// the scheme names the adapter and the path the default database, or
/// deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProperties {
    pub adapter: String,
    pub host: String,
    pub port: Option<u16>,

    /// Database used for tables named without one.
    pub database: String,

    pub user: Option<String>,
    pub password: Option<String>,

    /// Adapter-specific settings.
    pub options: BTreeMap<String, String>,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            adapter: String::new(),
            host: "localhost".to_string(),
            port: None,
            database: "test".to_string(),
            user: None,
            password: None,
            options: BTreeMap::new(),
        }
    }
}

impl ConnectionProperties {
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            ..Self::default()
        }
    }

    pub fn from_url(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;

        let mut properties = Self::new(url.scheme());

        if let Some(host) = url.host_str() {
            properties.host = host.to_string();
        }
        properties.port = url.port();

        let database = url.path().trim_start_matches('/');
        if !database.is_empty() {
            properties.database = database.to_string();
        }

        if !url.username().is_empty() {
            properties.user = Some(url.username().to_string());
        }
        properties.password = url.password().map(str::to_string);

        properties.options = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        Ok(properties)
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Identifies the storage engine instance. Factories whose properties
    /// share a key share one connection pool.
    pub fn connection_key(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}", self.adapter, self.host),
            None => format!("{}://{}", self.adapter, self.host),
        }
    }
}

impl FromStr for ConnectionProperties {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_url(s)
    }
}
