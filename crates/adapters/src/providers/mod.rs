//! HTTP-backed enrichment providers.

mod director;
mod http;
mod openai;
mod portrait;
mod soundtrack;
mod spotify;
mod tmdb;
mod translator;

pub use director::ChainedDirectorProvider;
pub use openai::OpenAiChatClient;
pub use portrait::PagePortraitLookup;
pub use soundtrack::{GenerativeSoundtrackProvider, MAX_TRACKS};
pub use spotify::SpotifyClient;
pub use tmdb::TmdbClient;
pub use translator::OpenAiTranslator;
