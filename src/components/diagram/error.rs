//! Errors surfaced to callers.
//!
//! Only producer-side contract violations (unparseable serialized payloads)
//! are reported as errors. Everything else in this crate degrades to "no
//! visual change".

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Deserialization failures of backend data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Serialized node/edge metadata is not valid JSON for the record.
	#[error("Invalid diagram metadata: {0}")]
	MetadataParse(#[source] serde_json::Error),

	/// The diagram payload does not decode.
	#[error("Invalid diagram payload: {0}")]
	PayloadParse(#[source] serde_json::Error),
}
