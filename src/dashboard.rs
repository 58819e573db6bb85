//! Query object the presentation layer talks to.
//!
//! A [`Dashboard`] owns the source, the pipeline settings and a [`TtlCache`]
//! of loaded tables. Every interaction calls [`Dashboard::query`] again; the
//! canonical table is never modified.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::TtlCache;
use crate::error::Result;
use crate::fetch::HttpClient;
use crate::filter::{Filter, filter};
use crate::pipeline::{PipelineConfig, load_table};
use crate::reading::Table;
use crate::source::{Source, read_source};
use crate::summary::{Summary, anomalies};

/// What one interaction renders: the filtered rows, KPIs and the anomaly table.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub filtered: Table,
    pub summary: Summary,
    pub anomalies: Table,
}

impl View {
    pub fn of(table: &Table, selection: &Filter) -> Self {
        let filtered = filter(table, selection);
        View {
            summary: Summary::of(&filtered),
            anomalies: anomalies(&filtered),
            filtered,
        }
    }
}

pub struct Dashboard<C> {
    client: C,
    source: Source,
    config: PipelineConfig,
    cache: TtlCache<Source, Table>,
}

impl<C: HttpClient> Dashboard<C> {
    pub fn new(client: C, source: Source, config: PipelineConfig, ttl: Duration) -> Self {
        Dashboard {
            client,
            source,
            config,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The full normalized table, fetched and built at most once per TTL.
    pub async fn load(&self) -> Result<Arc<Table>> {
        self.cache
            .get_or_try_load(&self.source, move || async move {
                let bytes = read_source(&self.client, &self.source).await?;
                info!(source = %self.source, bytes = bytes.len(), "Building table");
                load_table(&bytes, &self.config)
            })
            .await
    }

    /// Drops the cached table and loads it again.
    pub async fn refresh(&self) -> Result<Arc<Table>> {
        self.cache.invalidate(&self.source).await;
        self.load().await
    }

    pub async fn query(&self, selection: &Filter) -> Result<View> {
        let table = self.load().await?;
        Ok(View::of(&table, selection))
    }
}
