use super::{
    MetricSource,
    RepositoryFilter,
    SourceFuture,
};
use crate::{
    error::{
        Error,
        Result,
    },
    metrics::{
        ContentPath,
        MetricCategory,
        RawRecords,
        Referrer,
        Repository,
        TrafficSeries,
        ViewTraffic,
    },
};
use eyre::eyre;
use reqwest::{
    header::ACCEPT,
    Client as HttpClient,
    StatusCode,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use url::Url;

const PAGE_SIZE: usize = 100;
const MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ListedRepository {
    name: String,
}

/// Traffic source backed by the GitHub REST API.
///
/// Traffic endpoints need push access to the repository; a `404` is treated as "no data" for that
/// category rather than as a failure.
pub struct GithubSource {
    http_client: HttpClient,
    api_url: Url,
    token: String,
    weekly_views: bool,
}

impl GithubSource {
    pub fn new(api_url: Url, token: impl Into<String>, weekly_views: bool) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Configuration("a GitHub access token is required".to_string()));
        }
        if api_url.cannot_be_a_base() {
            return Err(Error::Configuration(format!("{api_url} cannot be used as an API base URL")));
        }
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build the HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_url,
            token,
            weekly_views,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> eyre::Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| eyre!("{} cannot be used as an API base URL", self.api_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn traffic_endpoint(&self, repository: &Repository, segments: &[&str], per: Option<&str>) -> eyre::Result<Url> {
        let mut path = vec!["repos", repository.owner.as_str(), repository.full_name.as_str(), "traffic"];
        path.extend_from_slice(segments);
        let mut url = self.endpoint(&path)?;
        if let Some(per) = per {
            url.query_pairs_mut().append_pair("per", per);
        }
        Ok(url)
    }

    /// `Ok(None)` when the platform has nothing for `url`.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> eyre::Result<Option<T>> {
        debug!(%url, "GET");
        let response = self
            .http_client
            .get(url.clone())
            .bearer_auth(&self.token)
            .header(ACCEPT, MEDIA_TYPE)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => {
                debug!(%url, status = %response.status(), "no data");
                Ok(None)
            }
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(eyre!("{url} answered {status}: {body}"))
            }
        }
    }

    async fn fetch(&self, repository: &Repository, category: MetricCategory) -> eyre::Result<RawRecords> {
        let records = match category {
            MetricCategory::Referrers => {
                let url = self.traffic_endpoint(repository, &["popular", "referrers"], None)?;
                RawRecords::Referrers(self.get_json::<Vec<Referrer>>(url).await?.unwrap_or_default())
            }
            MetricCategory::Paths => {
                let url = self.traffic_endpoint(repository, &["popular", "paths"], None)?;
                RawRecords::Paths(self.get_json::<Vec<ContentPath>>(url).await?.unwrap_or_default())
            }
            MetricCategory::Views => {
                let url = self.traffic_endpoint(repository, &["views"], Some("day"))?;
                let daily = self.get_json::<TrafficSeries>(url).await?.unwrap_or_default();
                let weekly = if self.weekly_views {
                    let url = self.traffic_endpoint(repository, &["views"], Some("week"))?;
                    Some(self.get_json::<TrafficSeries>(url).await?.unwrap_or_default())
                } else {
                    None
                };
                RawRecords::Views(ViewTraffic { daily, weekly })
            }
            MetricCategory::Clones => {
                let url = self.traffic_endpoint(repository, &["clones"], Some("day"))?;
                RawRecords::Clones(self.get_json::<TrafficSeries>(url).await?.unwrap_or_default())
            }
        };
        Ok(records)
    }

    async fn list(&self, filter: &RepositoryFilter) -> eyre::Result<Vec<Repository>> {
        let mut repositories = Vec::new();
        for page in 1.. {
            let mut url = self.endpoint(&["orgs", filter.owner.as_str(), "repos"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let listed = self
                .get_json::<Vec<ListedRepository>>(url)
                .await?
                .ok_or_else(|| eyre!("organization {} not found", filter.owner))?;
            let listed_count = listed.len();
            repositories.extend(listed.iter().filter_map(|repo| filter.select(&repo.name)));
            debug!(page, listed_count, selected = repositories.len(), "listed repositories");

            if listed_count < PAGE_SIZE {
                break;
            }
        }
        Ok(repositories)
    }
}

impl MetricSource for GithubSource {
    fn list_repositories<'a>(&'a self, filter: &'a RepositoryFilter) -> SourceFuture<'a, Vec<Repository>> {
        Box::pin(async move { self.list(filter).await.map_err(Error::Listing) })
    }

    fn fetch_category<'a>(
        &'a self,
        repository: &'a Repository,
        category: MetricCategory,
    ) -> SourceFuture<'a, RawRecords> {
        Box::pin(async move {
            self.fetch(repository, category)
                .await
                .map_err(|reason| Error::SourceFetch {
                    repository: repository.full_name.clone(),
                    category,
                    reason,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source(api_url: &str) -> GithubSource {
        GithubSource::new(Url::parse(api_url).unwrap(), "token", true).unwrap()
    }

    fn repository() -> Repository {
        Repository::with_prefix("freenas", "iocage-plugin-foo", "iocage-plugin-").unwrap()
    }

    #[test]
    fn missing_token_is_a_configuration_error() {
        let url = Url::parse("https://api.github.com").unwrap();
        let err = GithubSource::new(url, "  ", false).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn traffic_endpoints() {
        let source = source("https://api.github.com");
        let url = source
            .traffic_endpoint(&repository(), &["popular", "referrers"], None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/freenas/iocage-plugin-foo/traffic/popular/referrers"
        );

        let url = source.traffic_endpoint(&repository(), &["views"], Some("week")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/freenas/iocage-plugin-foo/traffic/views?per=week"
        );
    }

    #[test]
    fn endpoints_respect_an_api_path_prefix() {
        let source = source("https://github.example.com/api/v3/");
        let url = source.endpoint(&["orgs", "freenas", "repos"]).unwrap();
        assert_eq!(url.as_str(), "https://github.example.com/api/v3/orgs/freenas/repos");
    }
}
