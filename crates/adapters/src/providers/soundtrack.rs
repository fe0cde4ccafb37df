//! Soundtrack provider: a generated track list, matched track by track
//! against Spotify when credentials are configured.

use super::http::{no_match, not_configured};
use super::openai::{ChatPrompt, OpenAiChatClient};
use super::spotify::SpotifyClient;
use cinedex_domain::Track;
use cinedex_ports::{BoxFuture, SoundtrackProfile, SoundtrackProviderPort, SoundtrackQuery};
use cinedex_shared::{RequestContext, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Upper bound on tracks kept from a generated list.
pub const MAX_TRACKS: usize = 8;

const SOUNDTRACK_SYSTEM: &str =
    "You are a film music expert. Answer only with the requested JSON.";
const PROVENANCE_GENERATED: &str = "gpt";
const PROVENANCE_MATCHED: &str = "gpt_spotify";

/// Soundtrack provider backed by a chat model and optional Spotify matching.
#[derive(Debug, Clone, Default)]
pub struct GenerativeSoundtrackProvider {
    openai: Option<OpenAiChatClient>,
    spotify: Option<Arc<SpotifyClient>>,
}

impl GenerativeSoundtrackProvider {
    /// Create a provider from its optional clients.
    #[must_use]
    pub const fn new(openai: Option<OpenAiChatClient>, spotify: Option<Arc<SpotifyClient>>) -> Self {
        Self { openai, spotify }
    }

    async fn resolve(
        &self,
        ctx: &RequestContext,
        query: &SoundtrackQuery,
    ) -> Result<SoundtrackProfile> {
        let Some(openai) = self.openai.as_ref() else {
            return Err(not_configured("soundtrack"));
        };

        let completion = openai
            .complete(
                ctx,
                "soundtrack.generate",
                ChatPrompt {
                    system: SOUNDTRACK_SYSTEM,
                    user: soundtrack_prompt(query),
                    max_tokens: 800,
                    temperature: 0.7,
                    timeout: openai.generation_timeout(),
                },
            )
            .await?;

        let generated = parse_soundtrack(&completion);
        if generated.tracks.is_empty() {
            return Err(no_match(
                "soundtrack",
                format!("no tracks could be read for {}", query.title),
            ));
        }

        let (tracks, matched) = match self.spotify.as_deref() {
            Some(spotify) => match_tracks(ctx, spotify, generated.tracks).await?,
            None => (generated.tracks, 0),
        };
        let provenance = if matched > 0 {
            PROVENANCE_MATCHED
        } else {
            PROVENANCE_GENERATED
        };

        Ok(SoundtrackProfile {
            tracks,
            description: generated.description,
            provenance: provenance.into(),
        })
    }
}

impl SoundtrackProviderPort for GenerativeSoundtrackProvider {
    fn resolve_soundtrack(
        &self,
        ctx: &RequestContext,
        query: SoundtrackQuery,
    ) -> BoxFuture<'_, Result<SoundtrackProfile>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("soundtrack.resolve")?;
            self.resolve(&ctx, &query).await
        })
    }
}

async fn match_tracks(
    ctx: &RequestContext,
    spotify: &SpotifyClient,
    tracks: Vec<Track>,
) -> Result<(Vec<Track>, usize)> {
    let mut matched = 0;
    let mut resolved = Vec::with_capacity(tracks.len());
    for track in tracks {
        match spotify.find_track(ctx, &track.title, &track.artist).await {
            Ok(Some(hit)) => {
                matched += 1;
                resolved.push(hit.enrich(track));
            },
            Ok(None) => resolved.push(track),
            Err(error) if error.is_cancelled() => return Err(error),
            Err(error) => {
                tracing::debug!(code = %error.code, title = %track.title, "spotify match failed");
                resolved.push(track);
            },
        }
    }
    Ok((resolved, matched))
}

fn soundtrack_prompt(query: &SoundtrackQuery) -> String {
    let mut film = format!("\"{}\"", query.title);
    if let Some(year) = query.year {
        film.push_str(&format!(" ({year})"));
    }
    if let Some(director) = query.director.as_deref() {
        film.push_str(&format!(", directed by {director}"));
    }
    format!(
        "List the 5 to 8 most memorable tracks from the soundtrack of the film {film}. \
         Include original score pieces and licensed songs that play a key role in the film. \
         Reply with JSON shaped as \
         {{\"tracks\": [{{\"title\": \"...\", \"artist\": \"...\", \"description\": \"...\"}}], \
         \"description\": \"...\"}}. \
         Write every description in Brazilian Portuguese; the top-level description should \
         summarize the soundtrack in two or three sentences."
    )
}

/// Tracks and description read from a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GeneratedSoundtrack {
    pub tracks: Vec<Track>,
    pub description: Box<str>,
}

/// Read a completion as JSON, falling back to a numbered `Title - Artist` list.
pub(crate) fn parse_soundtrack(completion: &str) -> GeneratedSoundtrack {
    parse_json(completion).unwrap_or_else(|| GeneratedSoundtrack {
        tracks: parse_lines(completion),
        description: "".into(),
    })
}

#[derive(Debug, Deserialize)]
struct RawSoundtrack {
    #[serde(default)]
    tracks: Vec<RawTrack>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn parse_json(completion: &str) -> Option<GeneratedSoundtrack> {
    let start = completion.find('{')?;
    let end = completion.rfind('}')?;
    let candidate = completion.get(start..=end)?;
    let raw: RawSoundtrack = serde_json::from_str(candidate).ok()?;
    let tracks = raw
        .tracks
        .into_iter()
        .filter_map(|track| {
            let title = non_empty(track.title)?;
            Some(generated_track(
                title,
                non_empty(track.artist).unwrap_or_default(),
                non_empty(track.description).unwrap_or_default(),
            ))
        })
        .take(MAX_TRACKS)
        .collect();
    Some(GeneratedSoundtrack {
        tracks,
        description: non_empty(raw.description).unwrap_or_default().into_boxed_str(),
    })
}

fn parse_lines(completion: &str) -> Vec<Track> {
    completion
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (number, rest) = line.split_once(['.', ')'])?;
            if number.is_empty() || !number.chars().all(|ch| ch.is_ascii_digit()) {
                return None;
            }
            let rest = rest.trim().trim_matches('"');
            let (title, artist) = rest
                .split_once(" - ")
                .or_else(|| rest.split_once(" – "))
                .unwrap_or((rest, ""));
            let title = title.trim().trim_matches('"').trim();
            if title.is_empty() {
                return None;
            }
            Some(generated_track(title.to_owned(), artist.trim().to_owned(), String::new()))
        })
        .take(MAX_TRACKS)
        .collect()
}

fn generated_track(title: String, artist: String, description: String) -> Track {
    Track {
        title: title.into_boxed_str(),
        artist: artist.into_boxed_str(),
        description: description.into_boxed_str(),
        spotify_id: None,
        preview_url: None,
        external_url: None,
        album: None,
        duration_ms: None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
