use crate::dialects::Dialect;
use crate::executor::{DataSource, ExecutionContext, IndexKind};
use crate::statistics::{Estimate, StatisticsError, StatisticsProvider, TableRef};
use log::debug;

pub const NAME: &str = "index-metadata";

/// Estimates cardinalities from driver index metadata.
///
/// Cheap: a single metadata round trip and no scan of the table. It has
/// nothing to say about arbitrary queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexMetadataStatisticsProvider;

impl StatisticsProvider for IndexMetadataStatisticsProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn table_cardinality(
        &self,
        _dialect: &Dialect,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        let operation = || format!("while computing cardinality of table {}", table);

        ctx.check().map_err(|e| StatisticsError::backend(operation(), e))?;
        let mut connection = source
            .connect()
            .map_err(|e| StatisticsError::backend(operation(), e))?;
        let mut cursor = connection
            .index_info(table, ctx)
            .map_err(|e| StatisticsError::backend(operation(), e))?;

        let mut max_non_unique: Option<u64> = None;
        loop {
            ctx.check().map_err(|e| StatisticsError::backend(operation(), e))?;
            let Some(row) = cursor
                .next_row()
                .map_err(|e| StatisticsError::backend(operation(), e))?
            else {
                break;
            };

            let Ok(cardinality) = u64::try_from(row.cardinality) else {
                continue;
            };

            if row.kind == IndexKind::TableStatistic {
                debug!("Table statistic for {}: {}", table, cardinality);
                return Ok(Some(cardinality));
            }

            // A non-unique index counts the non-NULL values it covers; the
            // widest one is the best available stand-in for the row count.
            if row.non_unique {
                max_non_unique = Some(max_non_unique.map_or(cardinality, |max| max.max(cardinality)));
            }
        }

        debug!("Largest non-unique index on {}: {:?}", table, max_non_unique);
        Ok(max_non_unique)
    }

    fn column_cardinality(
        &self,
        _dialect: &Dialect,
        source: &dyn DataSource,
        table: &TableRef<'_>,
        column: &str,
        ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        let operation = || format!("while computing cardinality of column {}.[{}]", table, column);

        ctx.check().map_err(|e| StatisticsError::backend(operation(), e))?;
        let mut connection = source
            .connect()
            .map_err(|e| StatisticsError::backend(operation(), e))?;
        let mut cursor = connection
            .index_info(table, ctx)
            .map_err(|e| StatisticsError::backend(operation(), e))?;

        loop {
            ctx.check().map_err(|e| StatisticsError::backend(operation(), e))?;
            let Some(row) = cursor
                .next_row()
                .map_err(|e| StatisticsError::backend(operation(), e))?
            else {
                return Ok(None);
            };

            if row.kind == IndexKind::TableStatistic {
                return Ok(u64::try_from(row.cardinality).ok());
            }
        }
    }

    fn query_cardinality(
        &self,
        _dialect: &Dialect,
        _source: &dyn DataSource,
        _sql: &str,
        _ctx: &ExecutionContext,
    ) -> Result<Estimate, StatisticsError> {
        // No metadata entry exists for arbitrary SQL.
        Ok(None)
    }
}
