use crate::{
    error::{
        Error,
        Result,
    },
    metrics::{
        AggregationMode,
        MetricCategory,
        RawRecords,
        Repository,
        RepositoryBlock,
    },
    normalizer::{
        normalize,
        simplified_row,
    },
    source::MetricSource,
};

/// Gathers one repository's rows, one category at a time and in the order requested.
pub struct CategoryAggregator<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: MetricSource + ?Sized> CategoryAggregator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Builds the repository's block. Any failed fetch abandons the whole block.
    #[instrument(level = "debug", skip(self, repository, mode), fields(repository = %repository.full_name))]
    pub async fn aggregate(&self, repository: &Repository, mode: &AggregationMode) -> Result<RepositoryBlock> {
        let (rows, traffic) = match mode {
            AggregationMode::Simplified => {
                let records = self.fetch(repository, MetricCategory::Clones).await?;
                let row = match &records {
                    RawRecords::Clones(clones) => simplified_row(&repository.display_name, clones),
                    other => {
                        return Err(Error::CategoryMismatch {
                            requested: MetricCategory::Clones,
                            received: other.category(),
                        })
                    }
                };
                (vec![row], vec![records])
            }
            AggregationMode::Full { categories } => {
                let mut rows = Vec::new();
                let mut traffic = Vec::with_capacity(categories.len());
                for &category in categories {
                    let records = self.fetch(repository, category).await?;
                    rows.extend(normalize(&records));
                    traffic.push(records);
                }
                (rows, traffic)
            }
        };

        debug!(rows = rows.len(), "aggregated");
        Ok(RepositoryBlock {
            repository: repository.clone(),
            rows,
            traffic,
        })
    }

    async fn fetch(&self, repository: &Repository, category: MetricCategory) -> Result<RawRecords> {
        let records = self.source.fetch_category(repository, category).await?;
        if records.category() != category {
            return Err(Error::CategoryMismatch {
                requested: category,
                received: records.category(),
            });
        }
        Ok(records)
    }
}
