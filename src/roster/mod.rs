//! Customer roster: candidate records and the JSON roster collaborator.
//!
//! The workflow never creates or deletes records. It only reads whatever
//! snapshot the roster hands it, and may be handed a fresh one at any time.

pub mod watcher;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Errors from loading a roster snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// The roster file could not be read.
    #[error("failed to read roster {path}: {source}")]
    Io {
        /// Path of the roster file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The roster file is not a valid roster document.
    #[error("failed to parse roster {path}: {source}")]
    Parse {
        /// Path of the roster file.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// A customer entry eligible for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Unique record id (numeric ids from the API are read as strings).
    #[serde(deserialize_with = "id_from_text_or_number")]
    pub id: String,
    /// Name shown to the operator and printed in the message body.
    #[serde(alias = "name", alias = "nombre")]
    pub display_name: String,
    /// Identification number; only counts when non-blank after trimming.
    #[serde(default, alias = "identification_number")]
    pub identifier: Option<String>,
}

impl CandidateRecord {
    /// Build a record from borrowed parts.
    pub fn new(id: &str, display_name: &str, identifier: Option<&str>) -> Self {
        Self {
            id: id.to_owned(),
            display_name: display_name.to_owned(),
            identifier: identifier.map(str::to_owned),
        }
    }

    /// Whether the identifier exists and is non-blank.
    pub fn has_identifier(&self) -> bool {
        self.identifier
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    /// The identifier as stored, or an empty string when absent.
    pub fn identifier_str(&self) -> &str {
        self.identifier.as_deref().unwrap_or_default()
    }

    /// Case-insensitive substring match on the display name.
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.display_name
            .to_lowercase()
            .contains(needle_lowercase)
    }
}

fn id_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Accepted top-level shapes of a roster document.
#[derive(Deserialize)]
#[serde(untagged)]
enum RosterDocument {
    List(Vec<CandidateRecord>),
    Wrapped { clients: Vec<CandidateRecord> },
}

/// Parse a roster document from JSON text.
///
/// # Errors
///
/// Returns the JSON error if the text is neither a record array nor an
/// object with a `clients` array.
pub fn parse_roster(json: &str) -> Result<Vec<CandidateRecord>, serde_json::Error> {
    Ok(match serde_json::from_str::<RosterDocument>(json)? {
        RosterDocument::List(records) => records,
        RosterDocument::Wrapped { clients } => clients,
    })
}

/// Load a roster snapshot from a JSON file.
///
/// # Errors
///
/// Returns [`RosterError::Io`] if the file cannot be read and
/// [`RosterError::Parse`] if it is not a roster document.
pub fn load_roster(path: &Path) -> Result<Vec<CandidateRecord>, RosterError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_roster(&contents).map_err(|source| RosterError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), count = records.len(), "roster loaded");
    Ok(records)
}

/// Supplier of candidate snapshots.
pub trait RosterSource {
    /// Take a fresh snapshot of the roster.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError`] when the snapshot cannot be produced.
    fn snapshot(&self) -> Result<Vec<CandidateRecord>, RosterError>;
}

/// Roster backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonRosterFile {
    path: PathBuf,
}

impl JsonRosterFile {
    /// Create a roster source reading from `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterSource for JsonRosterFile {
    fn snapshot(&self) -> Result<Vec<CandidateRecord>, RosterError> {
        load_roster(&self.path)
    }
}
