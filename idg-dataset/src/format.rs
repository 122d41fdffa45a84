//! Serialization formats of dataset and vocabulary files.

use crate::{common::*, error::*};

/// The container format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Python pickle, `.pkl` or `.pickle`.
    Pickle,
    /// JSON text, `.json`.
    Json,
}

impl Format {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("pkl") | Some("pickle") => Self::Pickle,
            Some("json") => Self::Json,
            _ => {
                return Err(Error::UnsupportedFormat {
                    path: path.to_owned(),
                })
            }
        };
        Ok(format)
    }
}

/// Load a value from a pickle or JSON file.
pub fn load_data<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    let format = Format::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);

    let value = match format {
        Format::Pickle => serde_pickle::from_reader(reader, serde_pickle::DeOptions::new())
            .map_err(|err| pickle_error(path, err))?,
        Format::Json => serde_json::from_reader(reader)?,
    };
    debug!("loaded {:?} file {}", format, path.display());

    Ok(value)
}

/// Name pickled Python objects that have no plain-data counterpart.
fn pickle_error(path: &Path, err: serde_pickle::Error) -> Error {
    let contains = |bytes: &[u8], needle: &[u8]| {
        bytes.windows(needle.len()).any(|window| window == needle)
    };
    let is_counter = fs::read(path)
        .map(|bytes| contains(&bytes, b"collections") && contains(&bytes, b"Counter"))
        .unwrap_or(false);

    if is_counter {
        warn!(
            "{} holds a pickled collections.Counter, save the vocabulary as a token to id dict",
            path.display()
        );
        Error::UnsupportedPickle {
            path: path.to_owned(),
            class: "collections.Counter".into(),
        }
    } else {
        err.into()
    }
}

/// Save a value to a pickle or JSON file.
pub fn save_data<T>(value: &T, path: impl AsRef<Path>) -> Result<()>
where
    T: Serialize,
{
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let mut writer = BufWriter::new(File::create(path)?);

    match format {
        Format::Pickle => {
            serde_pickle::to_writer(&mut writer, value, serde_pickle::SerOptions::new())?
        }
        Format::Json => serde_json::to_writer(&mut writer, value)?,
    }
    writer.flush()?;
    debug!("saved {:?} file {}", format, path.display());

    Ok(())
}
