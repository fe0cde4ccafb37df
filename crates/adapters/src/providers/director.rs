//! Director provider chain: TMDB first, then a generated biography with a
//! scraped portrait.

use super::http::{no_match, not_configured};
use super::openai::{ChatPrompt, OpenAiChatClient};
use super::tmdb::{TmdbClient, TmdbPerson};
use cinedex_ports::{
    BoxFuture, DirectorProfile, DirectorProviderPort, DirectorQuery, PortraitLookupPort,
};
use cinedex_shared::{ErrorEnvelope, RequestContext, Result};
use std::sync::Arc;

const BIOGRAPHY_SYSTEM: &str =
    "You are a film expert who writes engaging biographies of film directors.";

/// Director provider chaining the configured sources.
///
/// Stages that are not configured are skipped. A stage error falls through to
/// the next stage; the chain fails only when no stage yields a biography.
#[derive(Clone, Default)]
pub struct ChainedDirectorProvider {
    tmdb: Option<TmdbClient>,
    openai: Option<OpenAiChatClient>,
    portraits: Option<Arc<dyn PortraitLookupPort>>,
}

impl ChainedDirectorProvider {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the TMDB stage.
    #[must_use]
    pub fn with_tmdb(mut self, tmdb: Option<TmdbClient>) -> Self {
        self.tmdb = tmdb;
        self
    }

    /// Add the generative biography stage.
    #[must_use]
    pub fn with_openai(mut self, openai: Option<OpenAiChatClient>) -> Self {
        self.openai = openai;
        self
    }

    /// Portrait lookup used when the profile has no photo yet.
    #[must_use]
    pub fn with_portraits(mut self, portraits: Option<Arc<dyn PortraitLookupPort>>) -> Self {
        self.portraits = portraits;
        self
    }

    async fn resolve(&self, ctx: &RequestContext, name: &str) -> Result<DirectorProfile> {
        if self.tmdb.is_none() && self.openai.is_none() {
            return Err(not_configured("director"));
        }

        let mut last_error: Option<ErrorEnvelope> = None;
        let mut partial: Option<TmdbPerson> = None;

        if let Some(tmdb) = self.tmdb.as_ref() {
            match tmdb.find_person(ctx, name).await {
                Ok(Some(person)) => {
                    if let Some(biography) = person.biography.clone() {
                        return Ok(DirectorProfile {
                            name: person.name,
                            biography,
                            photo: person.photo,
                        });
                    }
                    partial = Some(person);
                },
                Ok(None) => {},
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    tracing::warn!(code = %error.code, "tmdb director lookup failed");
                    last_error = Some(error);
                },
            }
        }

        if let Some(openai) = self.openai.as_ref() {
            match generate_biography(ctx, openai, name).await {
                Ok(biography) => {
                    let display_name = partial
                        .as_ref()
                        .map_or_else(|| name.into(), |person| person.name.clone());
                    let photo = match partial.and_then(|person| person.photo) {
                        Some(photo) => Some(photo),
                        None => self.find_portrait(ctx, name).await?,
                    };
                    return Ok(DirectorProfile {
                        name: display_name,
                        biography: biography.into_boxed_str(),
                        photo,
                    });
                },
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    tracing::warn!(code = %error.code, "director biography generation failed");
                    last_error = Some(error);
                },
            }
        }

        Err(last_error.unwrap_or_else(|| {
            no_match("director", format!("no source has a biography for {name}"))
        }))
    }

    async fn find_portrait(&self, ctx: &RequestContext, name: &str) -> Result<Option<Box<str>>> {
        let Some(portraits) = self.portraits.as_ref() else {
            return Ok(None);
        };
        match portraits.find_portrait(ctx, name.into()).await {
            Ok(photo) => Ok(photo),
            Err(error) if error.is_cancelled() => Err(error),
            Err(error) => {
                tracing::debug!(code = %error.code, "portrait lookup failed");
                Ok(None)
            },
        }
    }
}

impl DirectorProviderPort for ChainedDirectorProvider {
    fn resolve_director(
        &self,
        ctx: &RequestContext,
        query: DirectorQuery,
    ) -> BoxFuture<'_, Result<DirectorProfile>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("director.resolve")?;
            self.resolve(&ctx, query.name.trim()).await
        })
    }
}

async fn generate_biography(
    ctx: &RequestContext,
    openai: &OpenAiChatClient,
    name: &str,
) -> Result<String> {
    let user = format!(
        "Write a rich, detailed biography of the film director {name}. \
         Cover their cinematic style, their most important and influential films, \
         distinctive techniques, their impact on the industry, major awards, and legacy. \
         Write 150 to 250 words in Brazilian Portuguese with a respectful, informative tone. \
         If you lack specific information, say so honestly while staying positive about \
         their contribution to cinema."
    );
    openai
        .complete(
            ctx,
            "director.generate_biography",
            ChatPrompt {
                system: BIOGRAPHY_SYSTEM,
                user,
                max_tokens: 400,
                temperature: 0.7,
                timeout: openai.generation_timeout(),
            },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_domain::Language;
    use cinedex_shared::ErrorCode;

    #[tokio::test]
    async fn empty_chain_is_not_configured() {
        let provider = ChainedDirectorProvider::new();
        let ctx = RequestContext::new_request();
        let result = provider
            .resolve_director(
                &ctx,
                DirectorQuery {
                    name: "Ridley Scott".into(),
                    movie_context_id: None,
                    language: Language::Pt,
                },
            )
            .await;
        assert_eq!(
            result.err().map(|error| error.code),
            Some(ErrorCode::provider("not_configured"))
        );
    }
}
