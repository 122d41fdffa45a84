//! Dataset accessor configuration.

use crate::{common::*, error::*, image_proc::ImageMean};

/// Options to build an [IdgDataset](crate::dataset::IdgDataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// The preprocessed dataset file with images and captions.
    pub dataset_path: PathBuf,
    /// The vocabulary file.
    pub vocab_path: PathBuf,
    /// The directory of raw images. An empty path means unset.
    #[serde(default)]
    pub image_root: PathBuf,
    /// The directory of precomputed image features. An empty path means unset.
    #[serde(default)]
    pub feature_root: PathBuf,
    /// Return stored captions as is instead of id arrays.
    #[serde(default)]
    pub raw_caption: bool,
    /// Load raw images instead of precomputed features.
    #[serde(default)]
    pub raw_image: bool,
    /// The `[height, width]` of loaded raw images.
    #[serde(default = "default_image_size")]
    pub image_size: [usize; 2],
    /// The mean subtracted from raw images.
    #[serde(default)]
    pub image_mean: ImageMean,
    /// Load all image features into memory on construction.
    #[serde(default)]
    pub preload_features: bool,
}

impl DatasetConfig {
    pub fn new(dataset_path: impl Into<PathBuf>, vocab_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            vocab_path: vocab_path.into(),
            image_root: PathBuf::new(),
            feature_root: PathBuf::new(),
            raw_caption: false,
            raw_image: false,
            image_size: default_image_size(),
            image_mean: ImageMean::default(),
            preload_features: false,
        }
    }

    /// Load the configuration from a JSON5 file.
    ///
    /// Relative paths in the file are kept as is.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|_| Error::not_found(path))?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

fn default_image_size() -> [usize; 2] {
    [224, 224]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_config_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json5");
        fs::write(
            &path,
            r#"{
                // feature mode
                dataset_path: "data/train2014.pkl",
                vocab_path: "data/vocab.pkl",
                feature_root: "features/ResNet50",
                preload_features: true,
            }"#,
        )
        .unwrap();

        let config = DatasetConfig::open(&path).unwrap();
        assert_eq!(config.dataset_path, Path::new("data/train2014.pkl"));
        assert_eq!(config.image_root, PathBuf::new());
        assert_eq!(config.image_size, [224, 224]);
        assert_eq!(config.image_mean, ImageMean::Imagenet);
        assert!(config.preload_features && !config.raw_image);
    }

    #[test]
    fn open_custom_mean_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json5");
        fs::write(
            &path,
            r#"{
                dataset_path: "a.json",
                vocab_path: "b.json",
                image_root: "images",
                raw_image: true,
                image_size: [32, 48],
                image_mean: "1,2,3",
            }"#,
        )
        .unwrap();

        let config = DatasetConfig::open(&path).unwrap();
        assert_eq!(config.image_size, [32, 48]);
        assert_eq!(config.image_mean, ImageMean::Custom([1.0, 2.0, 3.0]));
    }

    #[test]
    fn open_missing_config_test() {
        assert!(matches!(
            DatasetConfig::open("/nonexistent/dataset.json5"),
            Err(Error::NotFound { .. })
        ));
    }
}
