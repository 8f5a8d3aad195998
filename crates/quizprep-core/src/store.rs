//! JSON record store.
//!
//! Every record is one pretty-printed JSON file in a directory, named after
//! its key. [`Library`] puts notes and quiz history side by side under a
//! single data directory.

use std::fmt::Write as _;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, ValidationError};
use crate::model::{Note, QuizRecord};

/// Key-value persistence for one record type.
pub trait RecordStore<T> {
    /// Write `record` under `key`, replacing any previous value.
    fn put(&self, key: &str, record: &T) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<T>, StoreError>;

    /// All records, ordered by key.
    fn list(&self) -> Result<Vec<T>, StoreError>;

    fn contains(&self, key: &str) -> bool;
}

/// A directory of `<key>.json` files.
#[derive(Debug, Clone)]
pub struct JsonDirStore<T> {
    dir: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonDirStore<T> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _record: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Map a key to a file stem. Letters, digits, `-` and `.` are kept and spaces
/// become `_`; every other byte is percent-encoded, so distinct keys never
/// share a file.
pub fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for (i, c) in key.char_indices() {
        match c {
            ' ' => stem.push('_'),
            '.' if i == 0 => stem.push_str("%2E"),
            c if c.is_alphanumeric() || c == '-' || c == '.' => stem.push(c),
            c => {
                let mut buf = [0; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(stem, "%{byte:02X}");
                }
            }
        }
    }
    stem
}

impl<T: Serialize + DeserializeOwned> RecordStore<T> for JsonDirStore<T> {
    fn put(&self, key: &str, record: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        std::fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
    }

    fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            match read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(records)
    }

    fn contains(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Notes and quiz history under one data directory.
#[derive(Debug, Clone)]
pub struct Library {
    notes: JsonDirStore<Note>,
    history: JsonDirStore<QuizRecord>,
}

impl Library {
    /// Open (without creating) the library rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            notes: JsonDirStore::new(data_dir.join("notes")),
            history: JsonDirStore::new(data_dir.join("quiz_history")),
        }
    }

    /// Create both record directories.
    pub fn init(&self) -> Result<(), StoreError> {
        for dir in [self.notes.dir(), self.history.dir()] {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Save a note. Re-saving a title keeps its creation time.
    pub fn save_note(&self, title: &str, content: &str) -> anyhow::Result<Note> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle.into());
        }
        if content.trim().is_empty() {
            return Err(ValidationError::MissingContent.into());
        }

        let mut note = Note::new(title, content);
        if let Some(previous) = self.notes.get(title)? {
            // Case-folding file systems can map two titles to one file.
            if previous.title != title {
                return Err(ValidationError::TitleConflict {
                    title: title.to_string(),
                    existing: previous.title,
                }
                .into());
            }
            note.created_at = previous.created_at;
        }
        self.notes.put(title, &note)?;
        tracing::info!(title, chars = content.len(), "note saved");
        Ok(note)
    }

    pub fn note(&self, title: &str) -> Result<Option<Note>, StoreError> {
        let title = title.trim();
        Ok(self.notes.get(title)?.filter(|note| note.title == title))
    }

    /// Every note, ordered by title.
    pub fn notes(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes = self.notes.list()?;
        notes.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(notes)
    }

    /// Persist a finished quiz. Records are never overwritten.
    pub fn save_quiz(&self, record: &QuizRecord) -> Result<String, StoreError> {
        let key = record.storage_key();
        if self.history.contains(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        self.history.put(&key, record)?;
        tracing::info!(
            note = %record.note_title,
            average = record.average_score,
            key = %key,
            "quiz result saved"
        );
        Ok(key)
    }

    /// All attempts, oldest first.
    pub fn history(&self) -> Result<Vec<QuizRecord>, StoreError> {
        let mut records = self.history.list()?;
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    pub fn history_for(&self, note_title: &str) -> Result<Vec<QuizRecord>, StoreError> {
        let mut records = self.history()?;
        records.retain(|r| r.note_title == note_title);
        Ok(records)
    }
}
