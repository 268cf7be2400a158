//! In-memory [`UsageBackend`] for tests and embedding.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::UsageBackend;
use crate::models::UsageData;

/// Usage store kept in memory behind a `RwLock`.
#[derive(Default)]
pub struct InMemoryUsageBackend {
    data: RwLock<UsageData>,
}

impl InMemoryUsageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageBackend for InMemoryUsageBackend {
    async fn load(&self) -> Result<UsageData> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow!("usage store lock poisoned"))?;
        Ok(data.clone())
    }

    async fn save(&self, data: &UsageData) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("usage store lock poisoned"))?;
        *guard = data.clone();
        Ok(())
    }
}
