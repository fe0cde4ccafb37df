//! Enrichment provider boundary contracts.
//!
//! Providers are slow, rate-limited, and unreliable. Any failure they report is
//! a `ProviderError` from the core's point of view; how a provider chains its
//! own sources (structured API, generative fallback, page scrape) is internal
//! to the implementation.

use crate::BoxFuture;
use cinedex_domain::{Language, SubjectId, Track};
use cinedex_shared::{RequestContext, Result};

/// Request to resolve one director by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorQuery {
    /// Single director name (never a group field).
    pub name: Box<str>,
    /// Catalog item the lookup was triggered for, if any.
    pub movie_context_id: Option<SubjectId>,
    /// Language the caller will serve.
    pub language: Language,
}

/// Director payload returned by a provider, in the production language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorProfile {
    /// Name as reported by the provider.
    pub name: Box<str>,
    /// Biography text.
    pub biography: Box<str>,
    /// Portrait URL.
    pub photo: Option<Box<str>>,
}

/// Boundary contract for director enrichment.
pub trait DirectorProviderPort: Send + Sync {
    /// Resolve a director's biography and photo.
    fn resolve_director(
        &self,
        ctx: &RequestContext,
        query: DirectorQuery,
    ) -> BoxFuture<'_, Result<DirectorProfile>>;
}

/// Request to resolve a film soundtrack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundtrackQuery {
    /// Film title.
    pub title: Box<str>,
    /// Film year.
    pub year: Option<i32>,
    /// Film director field.
    pub director: Option<Box<str>>,
    /// Language the caller will serve.
    pub language: Language,
}

/// Soundtrack payload returned by a provider, in the production language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundtrackProfile {
    /// Ordered track list.
    pub tracks: Vec<Track>,
    /// Description of the soundtrack.
    pub description: Box<str>,
    /// Pipeline tag, e.g. `gpt_spotify`.
    pub provenance: Box<str>,
}

/// Boundary contract for soundtrack enrichment.
pub trait SoundtrackProviderPort: Send + Sync {
    /// Resolve the main tracks of a film.
    fn resolve_soundtrack(
        &self,
        ctx: &RequestContext,
        query: SoundtrackQuery,
    ) -> BoxFuture<'_, Result<SoundtrackProfile>>;
}

/// Request to translate production-language text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    /// Source text.
    pub text: Box<str>,
    /// Target language.
    pub target: Language,
}

/// Boundary contract for translation.
///
/// Implementations may fail; callers fall back to the source text.
pub trait TranslatorPort: Send + Sync {
    /// Translate text into the target language.
    fn translate(
        &self,
        ctx: &RequestContext,
        request: TranslateRequest,
    ) -> BoxFuture<'_, Result<Box<str>>>;
}

/// Boundary contract for portrait discovery.
///
/// Implementations typically scrape third-party pages whose layout can change
/// at any time; callers must treat every failure as "no portrait".
pub trait PortraitLookupPort: Send + Sync {
    /// Find a portrait URL for a person.
    fn find_portrait(
        &self,
        ctx: &RequestContext,
        name: Box<str>,
    ) -> BoxFuture<'_, Result<Option<Box<str>>>>;
}
