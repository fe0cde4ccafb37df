//! Dependencies shared by the detail cache use cases.

use cinedex_ports::{
    CatalogPort, ClockPort, DirectorProviderPort, DocumentStorePort, LogEvent, LogFields, LogLevel,
    LoggerPort, PortraitLookupPort, SoundtrackProviderPort, TranslatorPort,
};
use cinedex_shared::ErrorEnvelope;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time budgets applied around every boundary call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallBudgets {
    /// Any single store or catalog call.
    pub store: Duration,
    /// One director resolution (the provider may chain several sources).
    pub director: Duration,
    /// One soundtrack resolution.
    pub soundtrack: Duration,
    /// One translation.
    pub translation: Duration,
    /// One portrait lookup.
    pub portrait: Duration,
}

impl Default for CallBudgets {
    fn default() -> Self {
        Self {
            store: Duration::from_secs(30),
            director: Duration::from_secs(25),
            soundtrack: Duration::from_secs(45),
            translation: Duration::from_secs(3),
            portrait: Duration::from_secs(5),
        }
    }
}

/// Dependencies required by the cache manager, composer, and warmer.
#[derive(Clone)]
pub struct DetailDeps {
    /// Catalog of base entities.
    pub catalog: Arc<dyn CatalogPort>,
    /// Store for composites and enrichment records.
    pub store: Arc<dyn DocumentStorePort>,
    /// Director enrichment provider.
    pub directors: Arc<dyn DirectorProviderPort>,
    /// Soundtrack enrichment provider.
    pub soundtracks: Arc<dyn SoundtrackProviderPort>,
    /// Optional translator; without one, text is served untranslated.
    pub translator: Option<Arc<dyn TranslatorPort>>,
    /// Optional portrait lookup for stored directors without a photo.
    pub portraits: Option<Arc<dyn PortraitLookupPort>>,
    /// Time source.
    pub clock: Arc<dyn ClockPort>,
    /// Call budgets.
    pub budgets: CallBudgets,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

impl DetailDeps {
    pub(crate) fn emit(&self, level: LogLevel, event: &str, message: &str, fields: LogFields) {
        self.emit_event(level, event, message, fields, None);
    }

    pub(crate) fn emit_error(
        &self,
        level: LogLevel,
        event: &str,
        message: &str,
        fields: LogFields,
        error: &ErrorEnvelope,
    ) {
        let payload = serde_json::to_value(error).unwrap_or_else(|_| Value::String(error.to_string()));
        self.emit_event(level, event, message, fields, Some(payload));
    }

    fn emit_event(
        &self,
        level: LogLevel,
        event: &str,
        message: &str,
        fields: LogFields,
        error: Option<Value>,
    ) {
        if let Some(logger) = self.logger.as_ref() {
            logger.log(LogEvent {
                event: event.into(),
                level,
                message: message.into(),
                fields: (!fields.is_empty()).then_some(fields),
                error,
            });
        }
    }
}

pub(crate) fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}
