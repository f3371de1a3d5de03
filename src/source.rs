//! Retrieval collaborator for remote documents.
//!
//! The importer never performs network I/O itself. Callers supply a
//! [`DocumentSource`] that turns a location into a body plus response headers
//! and, optionally, a service-level warning that short-circuits parsing.

use crate::error::Result;
use crate::models::HeaderInfo;

/// A document returned by a [`DocumentSource`]
#[derive(Debug, Clone, Default)]
pub struct FetchedDocument {
    pub body: Vec<u8>,
    pub header_info: HeaderInfo,
    /// Set when the service answered with a warning instead of data
    pub warning: Option<String>,
}

impl FetchedDocument {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_info.insert(name.into(), value.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Fetches documents by location (usually a URL)
pub trait DocumentSource {
    fn fetch(&self, location: &str) -> Result<FetchedDocument>;
}

impl<F> DocumentSource for F
where
    F: Fn(&str) -> Result<FetchedDocument>,
{
    fn fetch(&self, location: &str) -> Result<FetchedDocument> {
        self(location)
    }
}

/// Source for local-only use; every fetch fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteSource;

impl DocumentSource for NoRemoteSource {
    fn fetch(&self, location: &str) -> Result<FetchedDocument> {
        Err(crate::error::RdbError::Fetch {
            location: location.to_string(),
            reason: "no such file and no remote source configured".to_string(),
        })
    }
}
