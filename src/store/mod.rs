//! JSON file store
//! ---
//!
//! Snapshots and exports live side by side in one folder, one file per generation:
//! `neuro-{name}-gen{generation:03}.json` for snapshots and `neuro-{name}-export.json`
//! for the single exported network.  Files are written through a temporary file in the
//! same folder and renamed into place, so a reader never sees a partial write.
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ne_core::snapshot::{Export, Snapshot, SnapshotSource};
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

/// Loads a single network for use outside of training
pub mod loader;

pub use self::loader::NeuroLoader;

const SAVE_INFO: &str = "Neurokit snapshot - can be used to continue training";
const EXPORT_INFO: &str = "Neurokit export - can be used for evaluating/using the network";

#[derive(Debug, Error)]
/// Failures reading or writing the store
pub enum StoreError {
    /// No snapshot with the store's prefix exists
    #[error("no files in `{}` with prefix `{}`", .folder.display(), .prefix)]
    NotFound {
        /// Folder searched
        folder: PathBuf,
        /// File name prefix searched for
        prefix: String,
    },

    /// Filesystem failure
    #[error("i/o error on `{}`: {}", .path.display(), .source)]
    Io {
        /// File or folder involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Malformed or unserializable JSON
    #[error("json error on `{}`: {}", .path.display(), .source)]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot holds no networks
    #[error("snapshot of generation {0} holds no networks")]
    EmptySnapshot(i64),
}

#[derive(Serialize)]
struct Annotated<'a, T> {
    _info: &'static str,
    #[serde(flatten)]
    record: &'a T,
}

#[derive(Clone, Debug)]
/// Folder-backed persistence for one named training run
pub struct FileStore {
    folder: PathBuf,
    name: String,
}

impl FileStore {
    /// Opens a store, creating `folder` if needed
    pub fn new<P: Into<PathBuf>, S: Into<String>>(folder: P, name: S) -> Result<Self, StoreError> {
        let folder = folder.into();
        fs::create_dir_all(&folder).map_err(|e| StoreError::Io {
            path: folder.clone(),
            source: e,
        })?;
        Ok(FileStore {
            folder: folder,
            name: name.into(),
        })
    }

    /// Folder holding every file of this store
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Name of the training run
    pub fn name(&self) -> &str {
        &self.name
    }

    fn prefix(&self) -> String {
        format!("neuro-{}-gen", self.name)
    }

    /// File name of the snapshot for `generation`
    pub fn snapshot_filename(&self, generation: i64) -> String {
        format!("{}{:03}.json", self.prefix(), generation)
    }

    /// File name of the export
    pub fn export_filename(&self) -> String {
        format!("neuro-{}-export.json", self.name)
    }

    /// File name of the snapshot with the highest generation
    pub fn find_latest(&self) -> Result<String, StoreError> {
        let prefix = self.prefix();
        let entries = fs::read_dir(&self.folder).map_err(|e| StoreError::Io {
            path: self.folder.clone(),
            source: e,
        })?;

        let mut latest: Option<(i64, String)> = None;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io {
                path: self.folder.clone(),
                source: e,
            })?;
            let fname = match entry.file_name().into_string() {
                Ok(fname) => fname,
                Err(_) => continue,
            };
            let generation = fname
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|g| g.parse::<i64>().ok());
            if let Some(generation) = generation {
                if latest.as_ref().map_or(true, |(best, _)| generation > *best) {
                    latest = Some((generation, fname));
                }
            }
        }

        latest.map(|(_, fname)| fname).ok_or_else(|| StoreError::NotFound {
            folder: self.folder.clone(),
            prefix: prefix,
        })
    }

    /// Loads `filename`, or the latest snapshot when `None`
    pub fn load<M: DeserializeOwned>(&self, filename: Option<&str>) -> Result<Snapshot<M>, StoreError> {
        let filename = match filename {
            Some(fname) => fname.to_string(),
            None => self.find_latest()?,
        };
        let snapshot: Snapshot<M> = self.read_json(&filename)?;
        info!(
            file = %filename,
            generation = snapshot.generation,
            networks = snapshot.networks.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Saves a snapshot to `filename`, or to the generation's default file name.
    /// Returns the path written.
    pub fn save<M: serde::Serialize>(
        &self,
        snapshot: &Snapshot<M>,
        filename: Option<&str>,
    ) -> Result<PathBuf, StoreError> {
        let filename = filename
            .map(|f| f.to_string())
            .unwrap_or_else(|| self.snapshot_filename(snapshot.generation));
        let record = Annotated {
            _info: SAVE_INFO,
            record: snapshot,
        };
        let path = self.write_json(&filename, &record)?;
        info!(file = %filename, generation = snapshot.generation, "snapshot saved");
        Ok(path)
    }

    /// Writes a single network export.  Returns the path written.
    pub fn export<M: serde::Serialize>(&self, export: &Export<M>, filename: Option<&str>) -> Result<PathBuf, StoreError> {
        let filename = filename
            .map(|f| f.to_string())
            .unwrap_or_else(|| self.export_filename());
        let record = Annotated {
            _info: EXPORT_INFO,
            record: export,
        };
        let path = self.write_json(&filename, &record)?;
        info!(file = %filename, generation = export.generation, "network exported");
        Ok(path)
    }

    /// Loads an export from `filename`, or from the default export file name
    pub fn load_export<M: DeserializeOwned>(&self, filename: Option<&str>) -> Result<Export<M>, StoreError> {
        let filename = filename
            .map(|f| f.to_string())
            .unwrap_or_else(|| self.export_filename());
        let export: Export<M> = self.read_json(&filename)?;
        info!(file = %filename, generation = export.generation, "export loaded");
        Ok(export)
    }

    fn read_json<T: DeserializeOwned>(&self, filename: &str) -> Result<T, StoreError> {
        let path = self.folder.join(filename);
        let file = File::open(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::Json { path: path, source: e })
    }

    fn write_json<T: serde::Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf, StoreError> {
        let path = self.folder.join(filename);
        let io_error = |e: io::Error| StoreError::Io {
            path: path.clone(),
            source: e,
        };

        let mut tmp = NamedTempFile::new_in(&self.folder).map_err(&io_error)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, value).map_err(|e| StoreError::Json {
                path: path.clone(),
                source: e,
            })?;
            writer.flush().map_err(&io_error)?;
        }
        tmp.persist(&path).map_err(|e| io_error(e.error))?;
        Ok(path)
    }
}

impl<M: DeserializeOwned> SnapshotSource<M> for FileStore {
    type Error = StoreError;

    fn load_snapshot(&self, handle: Option<&str>) -> Result<Snapshot<M>, StoreError> {
        self.load(handle)
    }
}
