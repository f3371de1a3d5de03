//! Import pipeline entry points and result assembly.
//!
//! [`Rdb1Importer`] drives the stages in order: decode, split, read, coerce,
//! reconstruct timestamps, then assemble the [`RecordSet`] with its metadata.
//! Column names are normalized to `[A-Za-z0-9_]` during assembly.

use crate::config::ParseConfig;
use crate::coercion::coerce_value_columns;
use crate::conventions::{NamingConventions, RDB1_CONVENTIONS};
use crate::datetime::reconstruct;
use crate::error::Result;
use crate::header::{decode_document, split_document};
use crate::models::{Diagnostic, HeaderInfo, RecordSet, ResultMetadata, Table};
use crate::reader::{ReadMode, read_table};
use crate::source::{DocumentSource, NoRemoteSource};
use crate::timezone::TimezoneNormalizer;
use chrono::Utc;
use chrono_tz::Tz;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid column name regex"));

/// Where a document came from
#[derive(Debug, Clone)]
enum Origin {
    Local,
    Remote {
        location: String,
        header_info: HeaderInfo,
    },
}

/// Parses RDB1 documents into [`RecordSet`]s.
///
/// The importer is stateless between calls. Remote locations are resolved
/// through the configured [`DocumentSource`].
#[derive(Debug, Clone)]
pub struct Rdb1Importer<S = NoRemoteSource> {
    config: ParseConfig,
    output_tz: Tz,
    conventions: NamingConventions,
    source: S,
}

impl Rdb1Importer<NoRemoteSource> {
    /// Create an importer for local input; fails on an unknown timezone
    pub fn new(config: ParseConfig) -> Result<Self> {
        let output_tz = config.resolve_timezone()?;
        Ok(Self {
            config,
            output_tz,
            conventions: RDB1_CONVENTIONS,
            source: NoRemoteSource,
        })
    }
}

impl<S: DocumentSource> Rdb1Importer<S> {
    /// Attach a retrieval collaborator for remote locations
    pub fn with_source<T: DocumentSource>(self, source: T) -> Rdb1Importer<T> {
        Rdb1Importer {
            config: self.config,
            output_tz: self.output_tz,
            conventions: self.conventions,
            source,
        }
    }

    pub fn with_conventions(mut self, conventions: NamingConventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn output_tz(&self) -> Tz {
        self.output_tz
    }

    /// Import document text held in memory
    pub fn import_str(&self, text: &str) -> Result<RecordSet> {
        self.parse(text, Vec::new(), Origin::Local)
    }

    /// Import a raw payload, decoding it first
    pub fn import_bytes(&self, bytes: &[u8]) -> Result<RecordSet> {
        self.parse_bytes(bytes, Origin::Local)
    }

    pub fn import_path(&self, path: impl AsRef<Path>) -> Result<RecordSet> {
        let path = path.as_ref();
        debug!("Reading RDB document {}", path.display());
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes, Origin::Local)
    }

    /// Fetch a document through the source and import it
    pub fn import_remote(&self, location: &str) -> Result<RecordSet> {
        let fetched = self.source.fetch(location)?;

        if let Some(message) = fetched.warning {
            warn!("Upstream warning for {}: {}", location, message);
            let metadata = ResultMetadata {
                source_identifier: Some(location.to_string()),
                retrieval_time: Utc::now(),
                comment: Vec::new(),
                header_info: Some(fetched.header_info),
                diagnostics: vec![Diagnostic::UpstreamWarning { message }],
                output_tz: self.output_tz,
            };
            return Ok(RecordSet::new(Table::new(0), metadata));
        }

        let origin = Origin::Remote {
            location: location.to_string(),
            header_info: fetched.header_info,
        };
        self.parse_bytes(&fetched.body, origin)
    }

    /// Import a local file when `location` names one, otherwise fetch it
    pub fn import(&self, location: &str) -> Result<RecordSet> {
        if Path::new(location).exists() {
            self.import_path(location)
        } else {
            self.import_remote(location)
        }
    }

    fn parse_bytes(&self, bytes: &[u8], origin: Origin) -> Result<RecordSet> {
        let mut diagnostics = Vec::new();
        let text = decode_document(bytes, &mut diagnostics);
        self.parse(&text, diagnostics, origin)
    }

    fn parse(
        &self,
        text: &str,
        mut diagnostics: Vec<Diagnostic>,
        origin: Origin,
    ) -> Result<RecordSet> {
        let doc = split_document(text)?;
        let mode = self.config.read_mode();
        let mut table = read_table(&doc, mode, &self.conventions, &mut diagnostics)?;

        if mode == ReadMode::Typed {
            coerce_value_columns(&mut table, &self.conventions, &mut diagnostics);
        }
        if self.config.reconstructs_timestamps() {
            let normalizer = TimezoneNormalizer::new(self.output_tz, self.conventions);
            reconstruct(&mut table, &self.conventions, &normalizer, &mut diagnostics)?;
        }

        let shared = self.conventions.shared_tz_column;
        table.move_column_before(&self.conventions.reported_column(shared), shared);
        normalize_column_names(&mut table);

        let (source_identifier, header_info) = match origin {
            Origin::Local => (None, None),
            Origin::Remote {
                location,
                header_info,
            } => (Some(location), Some(header_info)),
        };

        info!(
            "Imported {} rows x {} columns ({} diagnostics)",
            table.height(),
            table.width(),
            diagnostics.len()
        );

        let metadata = ResultMetadata {
            source_identifier,
            retrieval_time: Utc::now(),
            comment: doc.comments.iter().map(|line| line.to_string()).collect(),
            header_info,
            diagnostics,
            output_tz: self.output_tz,
        };
        Ok(RecordSet::new(table, metadata))
    }
}

/// Import document text with the given options and local-only retrieval
pub fn import_rdb1(text: &str, config: &ParseConfig) -> Result<RecordSet> {
    Rdb1Importer::new(config.clone())?.import_str(text)
}

/// Make a name a valid identifier: invalid characters become `_` and a
/// leading digit gets an `X` prefix.
pub fn normalize_name(name: &str) -> String {
    let cleaned = INVALID_NAME_CHARS.replace_all(name, "_");
    match cleaned.chars().next() {
        None => "X".to_string(),
        Some(first) if first.is_ascii_digit() => format!("X{cleaned}"),
        Some(_) => cleaned.into_owned(),
    }
}

/// Normalize every column name, suffixing duplicates with `_1`, `_2`, ...
fn normalize_column_names(table: &mut Table) {
    let mut seen: HashSet<String> = HashSet::new();
    for column in table.columns_mut() {
        let base = normalize_name(column.name());
        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        if name != column.name() {
            debug!("Renamed column '{}' to '{}'", column.name(), name);
            column.set_name(name.clone());
        }
        seen.insert(name);
    }
}
