use crate::dialects::Dialect;
use crate::executor::{DataSource, ExecutionContext};
use crate::statistics::{provider_by_name, Estimate, StatisticsError, StatisticsProvider, TableRef};
use log::{debug, info};
use std::sync::Arc;

/// Ordered fallback over statistics providers.
///
/// Providers are asked in order; the first estimate wins. A provider with no
/// estimate passes the question on, and if none has one the chain has none.
/// An error stops the chain: a lost connection or a cancellation is not
/// something the next provider can answer around.
#[derive(Clone)]
pub struct StatisticsChain {
    dialect: Arc<Dialect>,
    providers: Vec<Arc<dyn StatisticsProvider>>,
}

impl StatisticsChain {
    pub fn new(dialect: Arc<Dialect>, providers: Vec<Arc<dyn StatisticsProvider>>) -> Self {
        Self { dialect, providers }
    }

    /// Chain of built-in providers, in the order named.
    pub fn from_names<S: AsRef<str>>(dialect: Arc<Dialect>, names: &[S]) -> Result<Self, StatisticsError> {
        let providers = names
            .iter()
            .map(|name| provider_by_name(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(dialect, providers))
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn table_cardinality(
        &self,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        self.first_estimate(&format!("table {}", table), |provider| {
            provider.table_cardinality(&self.dialect, source, table, ctx)
        })
    }

    pub fn column_cardinality(
        &self,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        column: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        self.first_estimate(&format!("column {}.[{}]", table, column), |provider| {
            provider.column_cardinality(&self.dialect, source, table, column, ctx)
        })
    }

    pub fn query_cardinality(
        &self,
        source: &dyn DataSource,
        sql: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        self.first_estimate("query", |provider| {
            provider.query_cardinality(&self.dialect, source, sql, ctx)
        })
    }

    fn first_estimate<F>(&self, target: &str, mut ask: F) -> Result<Estimate, StatisticsError>
    where
        F: FnMut(&dyn StatisticsProvider) -> Result<Estimate, StatisticsError>,
    {
        for provider in &self.providers {
            match ask(provider.as_ref())? {
                Some(estimate) => {
                    info!("Cardinality of {} is {} (from {})", target, estimate, provider.name());
                    return Ok(Some(estimate));
                }
                None => debug!("Provider {} has no estimate for {}", provider.name(), target),
            }
        }
        debug!("No provider could estimate {}", target);
        Ok(None)
    }
}

impl std::fmt::Debug for StatisticsChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsChain")
            .field("dialect", &self.dialect.product())
            .field("providers", &self.provider_names())
            .finish()
    }
}
