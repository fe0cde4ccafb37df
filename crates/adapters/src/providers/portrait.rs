//! Portrait lookup by scraping the `og:image` meta tag of a public page.
//!
//! Page layouts change without notice; a page without the tag is "no
//! portrait", never an error.

use super::http::{build_client, map_http_status, send};
use cinedex_config::{PORTRAIT_NAME_PLACEHOLDER, PortraitConfig};
use cinedex_ports::{BoxFuture, PortraitLookupPort};
use cinedex_shared::{ErrorEnvelope, RequestContext, Result};
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use url::Url;

const PROVIDER: &str = "portrait";

/// Portrait lookup that reads `og:image` from a templated page URL.
#[derive(Debug, Clone)]
pub struct PagePortraitLookup {
    client: reqwest::Client,
    page_url_template: Box<str>,
    meta_patterns: [Regex; 2],
}

impl PagePortraitLookup {
    /// Build the lookup from config; `None` when disabled.
    pub fn from_config(config: &PortraitConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(&config.page_url_template, config.timeout_ms).map(Some)
    }

    /// Build a lookup for a template containing `{name}`.
    pub fn new(page_url_template: &str, timeout_ms: u64) -> Result<Self> {
        if !page_url_template.contains(PORTRAIT_NAME_PLACEHOLDER) {
            return Err(ErrorEnvelope::invalid_input(format!(
                "portrait page template must contain {PORTRAIT_NAME_PLACEHOLDER}"
            )));
        }
        Ok(Self {
            client: build_client(PROVIDER, timeout_ms, HeaderMap::new())?,
            page_url_template: page_url_template.into(),
            meta_patterns: og_image_patterns()?,
        })
    }

    fn page_url(&self, name: &str) -> Result<Url> {
        let slug = name.split_whitespace().collect::<Vec<_>>().join("_");
        let raw = self.page_url_template.replace(PORTRAIT_NAME_PLACEHOLDER, &slug);
        Url::parse(&raw).map_err(|error| {
            ErrorEnvelope::invalid_input(format!("portrait page url is invalid: {error}"))
        })
    }

    fn extract(&self, page_url: &Url, html: &str) -> Option<Box<str>> {
        let raw = self
            .meta_patterns
            .iter()
            .find_map(|pattern| pattern.captures(html))
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().replace("&amp;", "&"))?;
        let resolved = page_url.join(raw.trim()).ok()?;
        matches!(resolved.scheme(), "http" | "https").then(|| resolved.as_str().into())
    }
}

impl PortraitLookupPort for PagePortraitLookup {
    fn find_portrait(
        &self,
        ctx: &RequestContext,
        name: Box<str>,
    ) -> BoxFuture<'_, Result<Option<Box<str>>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            if name.trim().is_empty() {
                return Ok(None);
            }
            let page_url = self.page_url(&name)?;
            let request = self.client.get(page_url.clone());
            let (status, payload) = send(&ctx, PROVIDER, "portrait.find", request).await?;
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(map_http_status(PROVIDER, status));
            }
            let html = String::from_utf8_lossy(&payload);
            Ok(self.extract(&page_url, &html))
        })
    }
}

fn og_image_patterns() -> Result<[Regex; 2]> {
    let compile = |pattern: &str| {
        Regex::new(pattern).map_err(|error| {
            ErrorEnvelope::invalid_input(format!("invalid og:image pattern: {error}"))
        })
    };
    Ok([
        compile(r#"(?is)<meta\s[^>]*?property\s*=\s*["']og:image["'][^>]*?content\s*=\s*["']([^"']+)["']"#)?,
        compile(r#"(?is)<meta\s[^>]*?content\s*=\s*["']([^"']+)["'][^>]*?property\s*=\s*["']og:image["']"#)?,
    ])
}
