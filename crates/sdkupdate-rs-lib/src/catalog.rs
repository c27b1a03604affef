//! # Package catalogue
//!
//! Versioned component descriptors as loaded from repository sources or from the local
//! install snapshot. Everything in here is plain data, the decisions are made in
//! [`crate::relationship_resolver`].

pub mod revision;
pub use revision::Revision;

pub mod android_version;
pub use android_version::AndroidVersion;

pub mod archive;
pub use archive::*;

pub mod package;
pub use package::*;

pub mod source;
pub use source::*;

pub mod fetcher;
pub use fetcher::*;

pub mod cache;
pub use cache::*;

pub mod local;
pub use local::*;
