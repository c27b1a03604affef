//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("bincode error: {0}")]
	Bincode(#[from] bincode::Error),
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("source fetch failed: {0}")]
	Fetch(#[from] crate::catalog::fetcher::FetchError),
	/// A package ended up depending on itself through the catalogue.
	///
	/// Holds the install ids along the chain, the repeated id last.
	#[error("dependency cycle detected: {}", .0.join(" -> "))]
	DependencyCycle(Vec<String>),
	/// The operation was stopped through its task monitor.
	#[error("operation cancelled")]
	Cancelled,
}
