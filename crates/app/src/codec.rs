//! Mapping between typed records and stored documents.

use cinedex_domain::{CompositeRecord, DirectorRecord, EpochMillis, SoundtrackRecord};
use cinedex_ports::{Collection, StoredDocument};
use cinedex_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) fn composite_document(record: &CompositeRecord) -> Result<StoredDocument> {
    Ok(StoredDocument {
        key: record.cache_key().as_str().into(),
        subject_id: Some(record.subject_id.as_str().into()),
        language: Some(record.language.as_str().into()),
        created_at_ms: record.created_at_ms,
        body: encode(Collection::Composites, record)?,
    })
}

pub(crate) fn composite_record(document: StoredDocument) -> Result<CompositeRecord> {
    let record: CompositeRecord = decode(Collection::Composites, document)?;
    if !record.has_consistent_key() {
        return Err(corrupt(
            Collection::Composites,
            record.cache_key().as_str(),
            "cache key does not match subject and language",
        ));
    }
    Ok(record)
}

pub(crate) fn director_document(
    record: &DirectorRecord,
    created_at_ms: EpochMillis,
) -> Result<StoredDocument> {
    Ok(StoredDocument {
        key: record.name.clone(),
        subject_id: None,
        language: None,
        created_at_ms,
        body: encode(Collection::Directors, record)?,
    })
}

pub(crate) fn director_record(document: StoredDocument) -> Result<DirectorRecord> {
    decode(Collection::Directors, document)
}

pub(crate) fn soundtrack_document(
    record: &SoundtrackRecord,
    created_at_ms: EpochMillis,
) -> Result<StoredDocument> {
    Ok(StoredDocument {
        key: record.key.as_str().into(),
        subject_id: None,
        language: None,
        created_at_ms,
        body: encode(Collection::Soundtracks, record)?,
    })
}

pub(crate) fn soundtrack_record(document: StoredDocument) -> Result<SoundtrackRecord> {
    decode(Collection::Soundtracks, document)
}

fn encode<T: Serialize>(collection: Collection, record: &T) -> Result<serde_json::Value> {
    serde_json::to_value(record).map_err(|error| {
        ErrorEnvelope::invariant(
            ErrorCode::internal(),
            format!("failed to encode {collection} record: {error}"),
        )
    })
}

fn decode<T: DeserializeOwned>(collection: Collection, document: StoredDocument) -> Result<T> {
    let StoredDocument { key, body, .. } = document;
    serde_json::from_value(body).map_err(|error| corrupt(collection, &key, &error.to_string()))
}

fn corrupt(collection: Collection, key: &str, detail: &str) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::store("corrupt_document"),
        format!("unreadable {collection} document: {detail}"),
        ErrorClass::NonRetriable,
    )
    .with_metadata("collection", collection.as_str())
    .with_metadata("key", key)
}
