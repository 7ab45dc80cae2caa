// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::error::MeasureDBError;

// Level for zstd compression. Higher level means higher compression ratio, at the expense of speed of compression and decompression.
pub const COMPRESSION_LEVEL: i32 = 15;

/// Compress and write the given value to the given file. Returns the number of bytes before and after compression.
///
/// The value is first written to a sibling temporary file which is then renamed over the target, so readers
/// never observe a partially written file.
pub fn write<T: Serialize + ?Sized>(
  to_write: &T,
  file_path: &Path,
  sync_after_write: bool,
) -> Result<(u64, u64), MeasureDBError> {
  let input = serde_json::to_vec(to_write)?;
  let uncompressed_length = input.len() as u64;

  let output = zstd::stream::encode_all(input.as_slice(), COMPRESSION_LEVEL)?;

  if let Some(parent) = file_path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }

  let tmp_file_path = file_path.with_extension("tmp");
  {
    let mut file = File::options()
      .create(true)
      .write(true)
      .truncate(true)
      .open(&tmp_file_path)?;
    file.write_all(output.as_slice())?;

    if sync_after_write {
      // Forcibly sync the file contents without relying on the OS to do so.
      file.sync_all()?;
    }
  }
  fs::rename(&tmp_file_path, file_path)?;

  Ok((uncompressed_length, output.len() as u64))
}

/// Read a value from the given file. Returns the value and the number of bytes read after decompression.
pub fn read<T: DeserializeOwned>(file_path: &Path) -> Result<(T, u64), MeasureDBError> {
  let compressed = fs::read(file_path)?;
  let data = zstd::decode_all(compressed.as_slice())?;
  let retval: T = serde_json::from_slice(&data)?;
  Ok((retval, data.len() as u64))
}
