//! Precomputed image feature files.

use crate::{common::*, error::*};
use ndarray_npy::{NpzReader, NpzWriter};

/// The extension of feature files.
pub const FEATURE_EXTENSION: &str = "npz";

/// The name of the array stored in each feature file.
pub const FEATURE_KEY: &str = "arr_0";

/// Compute the feature file of an image.
///
/// Only the final extension of `file_path` is replaced, so dots inside
/// directory or stem names are kept.
pub fn feature_path(feature_root: impl AsRef<Path>, file_path: impl AsRef<Path>) -> PathBuf {
    feature_root
        .as_ref()
        .join(file_path.as_ref().with_extension(FEATURE_EXTENSION))
}

/// Load the feature array from a feature file.
pub fn load_feature(path: impl AsRef<Path>) -> Result<ArrayD<f32>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| Error::not_found(path))?;
    let mut npz = NpzReader::new(file)?;

    // numpy appends '.npy' to array names in the archive
    let name = npz
        .names()?
        .into_iter()
        .find(|name| name == FEATURE_KEY || name.strip_suffix(".npy") == Some(FEATURE_KEY))
        .ok_or_else(|| Error::MalformedRecord {
            reason: format!(
                "feature file {} has no array named '{}'",
                path.display(),
                FEATURE_KEY
            ),
        })?;
    let array: ArrayD<f32> = npz.by_name(&name)?;

    Ok(array)
}

/// Save a feature array to a compressed feature file.
///
/// Missing parent directories are created.
pub fn save_feature(array: ArrayViewD<'_, f32>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut npz = NpzWriter::new_compressed(File::create(path)?);
    npz.add_array(FEATURE_KEY, &array)?;
    npz.finish()?;
    Ok(())
}
