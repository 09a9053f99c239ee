mod github;

use crate::{
    error::Result,
    metrics::{
        MetricCategory,
        RawRecords,
        Repository,
    },
};
pub use github::GithubSource;
use std::{
    future::Future,
    pin::Pin,
};

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Selects which of an owner's repositories belong to the fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFilter {
    pub owner: String,
    pub name_prefix: String,
}

impl RepositoryFilter {
    pub fn new(owner: impl Into<String>, name_prefix: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name_prefix: name_prefix.into(),
        }
    }

    /// Builds the repository handle for `name`, or `None` if the name is not part of the fleet.
    pub fn select(&self, name: &str) -> Option<Repository> {
        Repository::with_prefix(self.owner.clone(), name, &self.name_prefix)
    }
}

/// Where traffic records come from.
pub trait MetricSource {
    /// Lists the repositories matching `filter`, in the order the platform returns them.
    fn list_repositories<'a>(&'a self, filter: &'a RepositoryFilter) -> SourceFuture<'a, Vec<Repository>>;

    /// Fetches one category's records. A category without data yields [`RawRecords::empty`].
    fn fetch_category<'a>(
        &'a self,
        repository: &'a Repository,
        category: MetricCategory,
    ) -> SourceFuture<'a, RawRecords>;
}
