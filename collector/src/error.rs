use crate::metrics::MetricCategory;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Fetching {category} traffic for {repository} failed: {reason}")]
    SourceFetch {
        repository: String,
        category: MetricCategory,
        reason: eyre::Report,
    },
    #[error("Listing repositories failed: {0}")]
    Listing(eyre::Report),
    #[error("The source answered a {requested} request with {received} records")]
    CategoryMismatch {
        requested: MetricCategory,
        received: MetricCategory,
    },
    #[error("Writing output to {target} failed: {reason}")]
    SinkWrite { target: String, reason: eyre::Report },
    #[error("The spreadsheet service rejected the request: {0}")]
    Spreadsheet(eyre::Report),
}

/// How far an error reaches within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Only the block of the repository being processed is lost.
    Repository,
    /// The run cannot continue.
    Run,
}

impl Error {
    pub fn sink_write(target: impl Into<String>, reason: impl Into<eyre::Report>) -> Self {
        Self::SinkWrite {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Source failures only cost the repository they occurred for. Sink failures are scoped by the
    /// caller, since only it knows whether the failing handle is shared across repositories.
    pub fn scope(&self) -> ErrorScope {
        match self {
            Error::SourceFetch { .. } | Error::CategoryMismatch { .. } => ErrorScope::Repository,
            Error::Configuration(_) | Error::Listing(_) | Error::SinkWrite { .. } | Error::Spreadsheet(_) => {
                ErrorScope::Run
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_failures_are_repository_scoped() {
        let err = Error::SourceFetch {
            repository: "iocage-plugin-foo".to_string(),
            category: MetricCategory::Views,
            reason: eyre::eyre!("boom"),
        };
        assert_eq!(err.scope(), ErrorScope::Repository);
        assert_eq!(
            err.to_string(),
            "Fetching views traffic for iocage-plugin-foo failed: boom"
        );
    }

    #[test]
    fn result_accepts_another_error_type() {
        fn parse(value: &str) -> Result<u64, std::num::ParseIntError> {
            value.parse()
        }
        assert_eq!(parse("42"), Ok(42));
        assert!(parse("many").is_err());
    }

    #[test]
    fn configuration_errors_end_the_run() {
        assert_eq!(Error::Configuration("no token".into()).scope(), ErrorScope::Run);
    }
}
