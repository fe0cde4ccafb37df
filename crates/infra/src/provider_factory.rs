//! Enrichment provider selection from config.

use crate::InfraResult;
use cinedex_adapters::providers::{
    ChainedDirectorProvider, GenerativeSoundtrackProvider, OpenAiChatClient, OpenAiTranslator,
    PagePortraitLookup, SpotifyClient, TmdbClient,
};
use cinedex_config::ValidatedBackendConfig;
use cinedex_ports::{
    DirectorProviderPort, PortraitLookupPort, SoundtrackProviderPort, TranslatorPort,
};
use std::sync::Arc;

/// Provider adapters built for one backend instance.
#[derive(Clone)]
pub struct ProviderSet {
    /// Director chain (structured API, then generated biography).
    pub directors: Arc<dyn DirectorProviderPort>,
    /// Generated soundtrack with optional Spotify matching.
    pub soundtracks: Arc<dyn SoundtrackProviderPort>,
    /// Translator; absent without an `OpenAI` key.
    pub translator: Option<Arc<dyn TranslatorPort>>,
    /// Portrait lookup; absent when disabled.
    pub portraits: Option<Arc<dyn PortraitLookupPort>>,
    /// Names of the configured upstream sources, for status output.
    pub configured: Vec<&'static str>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ProviderSet")
            .field("configured", &self.configured)
            .field("translator", &self.translator.is_some())
            .field("portraits", &self.portraits.is_some())
            .finish_non_exhaustive()
    }
}

/// Build every provider adapter the config enables.
///
/// Missing credentials disable a source instead of failing; the chain then
/// reports `provider:not_configured` per call.
pub fn build_providers(config: &ValidatedBackendConfig) -> InfraResult<ProviderSet> {
    let providers = &config.providers;
    let tmdb = TmdbClient::from_config(&providers.tmdb)?;
    let openai = OpenAiChatClient::from_config(&providers.openai)?;
    let spotify = SpotifyClient::from_config(&providers.spotify)?.map(Arc::new);
    let portraits = PagePortraitLookup::from_config(&providers.portrait)?.map(|lookup| {
        let lookup: Arc<dyn PortraitLookupPort> = Arc::new(lookup);
        lookup
    });

    let mut configured = Vec::new();
    if tmdb.is_some() {
        configured.push("tmdb");
    }
    if openai.is_some() {
        configured.push("openai");
    }
    if spotify.is_some() {
        configured.push("spotify");
    }
    if portraits.is_some() {
        configured.push("portrait");
    }

    let directors = ChainedDirectorProvider::new()
        .with_tmdb(tmdb)
        .with_openai(openai.clone())
        .with_portraits(portraits.clone());
    let soundtracks = GenerativeSoundtrackProvider::new(openai.clone(), spotify);
    let translator = openai.map(|client| {
        let translator: Arc<dyn TranslatorPort> = Arc::new(OpenAiTranslator::new(client));
        translator
    });

    tracing::debug!(sources = ?configured, "enrichment providers built");
    Ok(ProviderSet {
        directors: Arc::new(directors),
        soundtracks: Arc::new(soundtracks),
        translator,
        portraits,
        configured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_config::BackendConfig;
    use cinedex_shared::SecretString;

    #[test]
    fn no_credentials_leaves_only_the_portrait_scraper() -> InfraResult<()> {
        let config = BackendConfig::default().validate_and_normalize()?;
        let set = build_providers(&config)?;
        assert_eq!(set.configured, ["portrait"]);
        assert!(set.translator.is_none());
        assert!(set.portraits.is_some());
        Ok(())
    }

    #[test]
    fn an_openai_key_enables_generation_and_translation() -> InfraResult<()> {
        let mut config = BackendConfig::default();
        config.providers.openai.api_key = Some(SecretString::from("sk-test"));
        config.providers.portrait.enabled = false;
        let set = build_providers(&config.validate_and_normalize()?)?;
        assert_eq!(set.configured, ["openai"]);
        assert!(set.translator.is_some());
        assert!(set.portraits.is_none());
        Ok(())
    }
}
