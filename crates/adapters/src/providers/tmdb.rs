//! TMDB person lookup: search by name, then fetch the top hit's details.

use super::http::{build_client, normalize_base_url, send_json};
use cinedex_config::TmdbConfig;
use cinedex_shared::{RequestContext, Result, SecretString};
use reqwest::header::HeaderMap;
use serde::Deserialize;

pub(crate) const PROVIDER: &str = "tmdb";

/// A person resolved through TMDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TmdbPerson {
    pub name: Box<str>,
    /// Empty biographies are reported as `None`.
    pub biography: Option<Box<str>>,
    pub photo: Option<Box<str>>,
}

/// TMDB v3 client authenticated with an API key.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: Box<str>,
    image_base_url: Box<str>,
    language: Box<str>,
    api_key: SecretString,
}

impl TmdbClient {
    /// Build a client from config; `None` when no API key is configured.
    pub fn from_config(config: &TmdbConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        Ok(Some(Self {
            client: build_client(PROVIDER, config.timeout_ms, HeaderMap::new())?,
            base_url: normalize_base_url(PROVIDER, &config.base_url)?,
            image_base_url: normalize_base_url(PROVIDER, &config.image_base_url)?,
            language: config.language.clone(),
            api_key,
        }))
    }

    /// Find a person by name; `Ok(None)` when the search has no results.
    pub(crate) async fn find_person(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Option<TmdbPerson>> {
        let search = self
            .client
            .get(format!("{}/search/person", self.base_url))
            .query(&[
                ("api_key", self.api_key.expose()),
                ("query", name),
                ("language", &*self.language),
            ]);
        let results: SearchResponse = send_json(ctx, PROVIDER, "tmdb.search_person", search).await?;
        let Some(hit) = results.results.into_iter().next() else {
            return Ok(None);
        };

        let details = self
            .client
            .get(format!("{}/person/{}", self.base_url, hit.id))
            .query(&[("api_key", self.api_key.expose()), ("language", &*self.language)]);
        let person: PersonDetails = send_json(ctx, PROVIDER, "tmdb.person_details", details).await?;

        let name = person
            .name
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| name.to_owned());
        Ok(Some(TmdbPerson {
            name: name.into_boxed_str(),
            biography: person
                .biography
                .map(|bio| bio.trim().to_owned())
                .filter(|bio| !bio.is_empty())
                .map(String::into_boxed_str),
            photo: person
                .profile_path
                .filter(|path| !path.is_empty())
                .map(|path| format!("{}{path}", self.image_base_url).into_boxed_str()),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct PersonDetails {
    name: Option<String>,
    biography: Option<String>,
    profile_path: Option<String>,
}
