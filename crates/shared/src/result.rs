//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for the shared `Result` type.
pub trait ResultExt<T> {
    /// Tag the error side with the operation that produced it.
    fn with_operation(self, operation: &'static str) -> Result<T>;

    /// Discard the error, keeping only the success value.
    ///
    /// Used where a failure is absorbed into a degraded result.
    fn degrade(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_operation(self, operation: &'static str) -> Result<T> {
        self.map_err(|error| error.with_metadata("operation", operation))
    }

    fn degrade(self) -> Option<T> {
        self.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_operation_tags_errors() {
        let value: Result<i32> = Err(ErrorEnvelope::store_unavailable("down"));
        let tagged = value.with_operation("store.get");

        assert!(tagged.is_err());
        if let Err(error) = tagged {
            assert_eq!(
                error.metadata.get("operation").map(String::as_str),
                Some("store.get")
            );
        }
    }

    #[test]
    fn degrade_drops_errors() {
        let value: Result<i32> = Err(ErrorEnvelope::invalid_input("bad"));
        assert_eq!(value.degrade(), None);

        let value: Result<i32> = Ok(2);
        assert_eq!(value.degrade(), Some(2));
    }
}
