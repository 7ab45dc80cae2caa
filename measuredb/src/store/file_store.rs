// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info};
use parking_lot::Mutex;

use crate::measurement::measurement::Measurement;
use crate::query::time_range::TimeRange;
use crate::store::memory_store::{merge_sorted, MemoryStore};
use crate::store::{MeasurementStore, ScanResult};
use crate::utils::error::MeasureDBError;
use crate::utils::serialize;

/// Identifies a version of the store file, so that changes made by other processes are noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileVersion {
  modified: Option<SystemTime>,
  len: u64,
}

/// Get the version of the file at the given path, or `None` if there is no file.
fn file_version(file_path: &Path) -> Result<Option<FileVersion>, MeasureDBError> {
  match fs::metadata(file_path) {
    Ok(metadata) => Ok(Some(FileVersion {
      modified: metadata.modified().ok(),
      len: metadata.len(),
    })),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
    Err(err) => Err(MeasureDBError::StoreUnavailable(format!(
      "Cannot access {}. {}",
      file_path.display(),
      err
    ))),
  }
}

/// Measurements persisted to a zstd-compressed json file, and served from memory.
///
/// The file is the source of truth, and may be rewritten by other processes (such as the seeder). Every
/// operation first checks whether the file changed since it was last loaded, and reloads it if so. Every
/// write persists the complete new set of measurements before it becomes visible to readers.
#[derive(Debug)]
pub struct FileStore {
  file_path: PathBuf,
  memory_store: MemoryStore,

  // Version of the file the memory store was loaded from. Also serializes reloads and writers.
  loaded_version: Mutex<Option<FileVersion>>,

  sync_after_write: bool,
}

impl FileStore {
  /// Open the store at the given path. A missing file is an empty store; a file that cannot be read or
  /// decoded makes the store unavailable.
  pub fn open(file_path: &Path) -> Result<Self, MeasureDBError> {
    let file_store = FileStore {
      file_path: file_path.to_path_buf(),
      memory_store: MemoryStore::new(),
      loaded_version: Mutex::new(None),
      sync_after_write: false,
    };

    {
      let mut loaded_version = file_store.loaded_version.lock();
      file_store.reload_if_changed(&mut loaded_version)?;
      if loaded_version.is_none() {
        info!(
          "Store file {} does not exist. Starting with an empty store.",
          file_path.display()
        );
      }
    }

    Ok(file_store)
  }

  /// Sync the file to disk after every write instead of leaving it to the OS. Usually only set in tests.
  pub fn set_sync_after_write(&mut self, sync_after_write: bool) {
    self.sync_after_write = sync_after_write;
  }

  /// Get the path of the store file.
  pub fn get_file_path(&self) -> &Path {
    &self.file_path
  }

  /// Replace the in-memory measurements with the file contents, if the file changed since it was loaded.
  /// A file that disappeared leaves an empty store.
  fn reload_if_changed(
    &self,
    loaded_version: &mut Option<FileVersion>,
  ) -> Result<(), MeasureDBError> {
    // Read the version before the contents: a change racing with the load is then seen on the next check.
    let current_version = file_version(&self.file_path)?;
    if current_version == *loaded_version {
      return Ok(());
    }

    let measurements = match current_version {
      Some(_) => self.load()?,
      None => Vec::new(),
    };
    self.memory_store.replace(merge_sorted(&[], measurements)?);
    *loaded_version = current_version;
    Ok(())
  }

  /// Make sure the in-memory measurements reflect the current file.
  fn refresh(&self) -> Result<(), MeasureDBError> {
    let mut loaded_version = self.loaded_version.lock();
    self.reload_if_changed(&mut loaded_version)
  }

  fn load(&self) -> Result<Vec<Measurement>, MeasureDBError> {
    let (measurements, num_bytes): (Vec<Measurement>, u64) = serialize::read(&self.file_path)
      .map_err(|err| {
        MeasureDBError::StoreUnavailable(format!(
          "Cannot load measurements from {}. {}",
          self.file_path.display(),
          err
        ))
      })?;
    info!(
      "Loaded {} measurements ({} bytes) from {}",
      measurements.len(),
      num_bytes,
      self.file_path.display()
    );
    Ok(measurements)
  }

  /// Persist the given sorted measurements and make them visible to readers.
  fn commit(
    &self,
    loaded_version: &mut Option<FileVersion>,
    measurements: Vec<Measurement>,
  ) -> Result<(), MeasureDBError> {
    let (uncompressed, compressed) =
      serialize::write(measurements.as_slice(), &self.file_path, self.sync_after_write)?;
    debug!(
      "Persisted {} measurements to {} ({} bytes, {} compressed)",
      measurements.len(),
      self.file_path.display(),
      uncompressed,
      compressed
    );

    *loaded_version = file_version(&self.file_path)?;
    self.memory_store.replace(measurements);
    Ok(())
  }
}

impl MeasurementStore for FileStore {
  fn scan(&self, range: &TimeRange) -> Result<ScanResult, MeasureDBError> {
    self.refresh()?;
    self.memory_store.scan(range)
  }

  fn first(&self) -> Result<Option<Measurement>, MeasureDBError> {
    self.refresh()?;
    self.memory_store.first()
  }

  fn last(&self) -> Result<Option<Measurement>, MeasureDBError> {
    self.refresh()?;
    self.memory_store.last()
  }

  fn count(&self) -> Result<usize, MeasureDBError> {
    self.refresh()?;
    self.memory_store.count()
  }

  fn insert_many(&self, measurements: Vec<Measurement>) -> Result<usize, MeasureDBError> {
    let mut loaded_version = self.loaded_version.lock();
    self.reload_if_changed(&mut loaded_version)?;
    let num_measurements = measurements.len();

    let merged = merge_sorted(&self.memory_store.snapshot(), measurements)?;
    self.commit(&mut loaded_version, merged)?;

    Ok(num_measurements)
  }

  fn clear(&self) -> Result<usize, MeasureDBError> {
    let mut loaded_version = self.loaded_version.lock();
    self.reload_if_changed(&mut loaded_version)?;
    let num_deleted = self.memory_store.count()?;

    self.commit(&mut loaded_version, Vec::new())?;

    Ok(num_deleted)
  }
}
