//! Scripted enrichment providers that count their calls.

use crate::errors::{no_match_error, provider_error};
use cinedex_domain::Track;
use cinedex_ports::{
    BoxFuture, DirectorProfile, DirectorProviderPort, DirectorQuery, PortraitLookupPort,
    SoundtrackProfile, SoundtrackProviderPort, SoundtrackQuery, TranslateRequest, TranslatorPort,
};
use cinedex_shared::{RequestContext, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Tracks call counts and peak concurrency of a fake.
#[derive(Debug, Default)]
struct CallMeter {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl CallMeter {
    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Director provider answering from a fixed table.
///
/// Names missing from the table fail with `provider:no_match`; names marked
/// failing fail with `provider:http`.
#[derive(Debug, Default)]
pub struct FakeDirectorProvider {
    profiles: BTreeMap<String, DirectorProfile>,
    failing: BTreeSet<String>,
    fail_all: bool,
    delay: Option<Duration>,
    meter: CallMeter,
    queried: Mutex<Vec<String>>,
}

impl FakeDirectorProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that fails every lookup.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Answer `name` with this biography and photo.
    pub fn with_profile(mut self, name: &str, biography: &str, photo: Option<&str>) -> Self {
        self.profiles.insert(
            name.to_owned(),
            DirectorProfile {
                name: name.into(),
                biography: biography.into(),
                photo: photo.map(Into::into),
            },
        );
        self
    }

    /// Fail lookups for `name`.
    pub fn failing_for(mut self, name: &str) -> Self {
        self.failing.insert(name.to_owned());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of lookups made.
    pub fn calls(&self) -> usize {
        self.meter.calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.meter.peak.load(Ordering::SeqCst)
    }

    /// Names looked up, in call order.
    pub fn queried_names(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

impl DirectorProviderPort for FakeDirectorProvider {
    fn resolve_director(
        &self,
        _ctx: &RequestContext,
        query: DirectorQuery,
    ) -> BoxFuture<'_, Result<DirectorProfile>> {
        Box::pin(async move {
            self.meter.enter();
            self.queried.lock().unwrap().push(query.name.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let name = &*query.name;
            let result = if self.fail_all || self.failing.contains(name) {
                Err(provider_error("director lookup failed"))
            } else {
                self.profiles
                    .get(name)
                    .cloned()
                    .ok_or_else(|| no_match_error(name))
            };
            self.meter.leave();
            result
        })
    }
}

/// Soundtrack provider answering every title with a fixed track list.
#[derive(Debug, Default)]
pub struct FakeSoundtrackProvider {
    failing: BTreeSet<String>,
    fail_all: bool,
    delay: Option<Duration>,
    meter: CallMeter,
}

impl FakeSoundtrackProvider {
    /// Provider that succeeds for every title.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that fails every lookup.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Fail lookups for `title`.
    pub fn failing_for(mut self, title: &str) -> Self {
        self.failing.insert(title.to_owned());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of lookups made.
    pub fn calls(&self) -> usize {
        self.meter.calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.meter.peak.load(Ordering::SeqCst)
    }
}

impl SoundtrackProviderPort for FakeSoundtrackProvider {
    fn resolve_soundtrack(
        &self,
        _ctx: &RequestContext,
        query: SoundtrackQuery,
    ) -> BoxFuture<'_, Result<SoundtrackProfile>> {
        Box::pin(async move {
            self.meter.enter();
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let result = if self.fail_all || self.failing.contains(&*query.title) {
                Err(provider_error("soundtrack lookup failed"))
            } else {
                Ok(soundtrack_profile(&query.title))
            };
            self.meter.leave();
            result
        })
    }
}

/// The profile `FakeSoundtrackProvider` returns for `title`.
pub fn soundtrack_profile(title: &str) -> SoundtrackProfile {
    SoundtrackProfile {
        tracks: vec![
            Track {
                title: format!("{title} Main Titles").into(),
                artist: "Vangelis".into(),
                description: "Opening theme".into(),
                ..Track::default()
            },
            Track {
                title: "End Titles".into(),
                artist: "Vangelis".into(),
                description: "Closing credits".into(),
                ..Track::default()
            },
        ],
        description: format!("Trilha sonora de {title}").into(),
        provenance: "gpt".into(),
    }
}

/// Translator that tags text with the target language code.
#[derive(Debug, Default)]
pub struct FakeTranslator {
    fail_all: bool,
    calls: AtomicUsize,
}

impl FakeTranslator {
    /// Translator that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translator that always fails.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of translation requests.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TranslatorPort for FakeTranslator {
    fn translate(
        &self,
        _ctx: &RequestContext,
        request: TranslateRequest,
    ) -> BoxFuture<'_, Result<Box<str>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(provider_error("translation failed"));
            }
            Ok(format!("[{}] {}", request.target.as_str(), request.text).into_boxed_str())
        })
    }
}

/// Portrait lookup answering from a fixed table.
#[derive(Debug, Default)]
pub struct FakePortraitLookup {
    portraits: BTreeMap<String, String>,
    calls: AtomicUsize,
}

impl FakePortraitLookup {
    /// Empty lookup; every name has no portrait.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `name` with `url`.
    pub fn with_portrait(mut self, name: &str, url: &str) -> Self {
        self.portraits.insert(name.to_owned(), url.to_owned());
        self
    }

    /// Number of lookups made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PortraitLookupPort for FakePortraitLookup {
    fn find_portrait(
        &self,
        _ctx: &RequestContext,
        name: Box<str>,
    ) -> BoxFuture<'_, Result<Option<Box<str>>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.portraits.get(&*name).map(|url| url.as_str().into()))
        })
    }
}
