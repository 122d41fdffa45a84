//! The random-access image captioning dataset.

use crate::{
    common::*,
    config::DatasetConfig,
    error::*,
    feature::{feature_path, load_feature},
    format::load_data,
    image_proc::ImageProcessor,
    record::{Caption, CaptionRecord, DatasetFile, ImageRecord},
};

/// The dataset that can be random accessed.
pub trait RandomAccessDataset {
    type Item;

    /// Get number of records in the dataset.
    fn len(&self) -> usize;

    /// Get the record at `index`.
    fn get(&self, index: usize) -> Result<Self::Item>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all records in index order.
    fn iter(&self) -> DatasetIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetIter {
            dataset: self,
            index: 0,
        }
    }
}

/// The iterator returned by [RandomAccessDataset::iter].
#[derive(Debug)]
pub struct DatasetIter<'a, D> {
    dataset: &'a D,
    index: usize,
}

impl<'a, D> Iterator for DatasetIter<'a, D>
where
    D: RandomAccessDataset,
{
    type Item = Result<D::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.dataset.len() {
            return None;
        }
        let item = self.dataset.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, D> ExactSizeIterator for DatasetIter<'a, D> where D: RandomAccessDataset {}

/// The way image representations are produced.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Decode raw images and subtract the channel mean.
    Raw {
        image_root: PathBuf,
        image_size: [usize; 2],
        processor: ImageProcessor,
    },
    /// Read the feature file of an image on each query.
    OnDemandFeature { feature_root: PathBuf },
    /// Keep all features in memory, index-aligned with the image table.
    PreloadedFeature {
        feature_root: PathBuf,
        features: Vec<ArrayD<f32>>,
    },
}

impl ImageSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw { .. } => "raw",
            Self::OnDemandFeature { .. } => "on-demand feature",
            Self::PreloadedFeature { .. } => "preloaded feature",
        }
    }

    pub fn feature_root(&self) -> Option<&Path> {
        match self {
            Self::Raw { .. } => None,
            Self::OnDemandFeature { feature_root } => Some(feature_root),
            Self::PreloadedFeature { feature_root, .. } => Some(feature_root),
        }
    }
}

/// The caption part of an example.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionData {
    /// The caption as stored in the dataset file.
    Raw(Caption),
    /// The caption ids.
    Ids(Array1<i64>),
}

/// An image and caption pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub caption_idx: usize,
    pub img_idx: usize,
    pub image: ArrayD<f32>,
    pub caption: CaptionData,
}

/// Diagnostic snapshot of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub vocabulary_size: usize,
    pub caption_count: usize,
    pub image_count: usize,
    pub unknown_token_ratio: R64,
}

/// The image captioning dataset.
///
/// It maps each caption index to its image and caption. The tables and
/// indices are immutable once built.
#[derive(Debug, Clone)]
pub struct IdgDataset {
    captions: Vec<CaptionRecord>,
    images: Vec<ImageRecord>,
    vocab: Vocabulary,
    /// Image index of each caption, indexed by caption index.
    cap2img: Vec<usize>,
    image_root: Option<PathBuf>,
    image_source: ImageSource,
    raw_caption: bool,
}

impl IdgDataset {
    /// Load the dataset described by `config`.
    pub fn new(config: &DatasetConfig) -> Result<Self> {
        let DatasetConfig {
            ref dataset_path,
            ref vocab_path,
            ref image_root,
            ref feature_root,
            raw_caption,
            raw_image,
            image_size,
            image_mean,
            preload_features,
        } = *config;

        // load tables
        let DatasetFile { images, captions } = load_data(dataset_path)?;
        let vocab: Vocabulary = load_data(vocab_path)?;
        info!(
            "loaded {} captions, {} images and {} vocabulary entries",
            captions.len(),
            images.len(),
            vocab.len()
        );

        let cap2img = build_cap2img(&captions, &images)?;

        // resolve image source
        let image_root = non_empty(image_root);
        let feature_root = non_empty(feature_root);

        let image_source = if raw_image {
            let image_root = image_root.clone().ok_or_else(|| Error::Configuration {
                reason: "image_root has to be defined to load images".into(),
            })?;
            if !image_root.is_dir() {
                return Err(Error::not_found(image_root));
            }
            if preload_features {
                warn!("preload_features is ignored when raw images are used");
            }

            ImageSource::Raw {
                image_root,
                image_size,
                processor: ImageProcessor::new(image_mean),
            }
        } else {
            let feature_root = feature_root.ok_or_else(|| Error::Configuration {
                reason: "feature_root has to be defined to load image features".into(),
            })?;
            if !feature_root.is_dir() {
                return Err(Error::not_found(feature_root));
            }

            if preload_features {
                info!("loading {} image features", images.len());
                let features: Vec<_> = images
                    .iter()
                    .map(|image| load_feature(feature_path(&feature_root, &image.file_path)))
                    .try_collect()?;

                ImageSource::PreloadedFeature {
                    feature_root,
                    features,
                }
            } else {
                ImageSource::OnDemandFeature { feature_root }
            }
        };
        debug!("use {} image source", image_source.kind());

        Ok(Self {
            captions,
            images,
            vocab,
            cap2img,
            image_root,
            image_source,
            raw_caption,
        })
    }

    pub fn captions(&self) -> &[CaptionRecord] {
        &self.captions
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn image_source(&self) -> &ImageSource {
        &self.image_source
    }

    pub fn raw_caption(&self) -> bool {
        self.raw_caption
    }

    /// Get the image index of a caption.
    pub fn image_of(&self, caption_idx: usize) -> Result<usize> {
        self.cap2img
            .get(caption_idx)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: caption_idx,
                len: self.captions.len(),
            })
    }

    /// Get the raw image path of an image, if an image root is configured.
    pub fn image_path(&self, img_idx: usize) -> Option<PathBuf> {
        let image = self.images.get(img_idx)?;
        let root = self.image_root.as_ref()?;
        Some(root.join(&image.file_path))
    }

    /// Get the feature file of an image, if features are used.
    pub fn feature_path(&self, img_idx: usize) -> Option<PathBuf> {
        let image = self.images.get(img_idx)?;
        let root = self.image_source.feature_root()?;
        Some(feature_path(root, &image.file_path))
    }

    /// Get the image path and decoded caption tokens of a caption.
    pub fn get_raw(&self, caption_idx: usize) -> Result<(PathBuf, Vec<String>)> {
        let img_idx = self.image_of(caption_idx)?;
        let image_root = self.image_root.as_ref().ok_or_else(|| Error::Configuration {
            reason: "image_root has to be defined to get raw image paths".into(),
        })?;
        let image_path = image_root.join(&self.images[img_idx].file_path);
        let tokens = self.captions[caption_idx].caption.to_tokens(&self.vocab)?;
        Ok((image_path, tokens))
    }

    /// Map tokens to ids. Unknown tokens become the `<UNK>` id.
    pub fn encode_tokens<I, S>(&self, tokens: I) -> Vec<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.vocab.encode(tokens)
    }

    /// Map ids to tokens.
    pub fn decode_ids<I>(&self, ids: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = usize>,
    {
        Ok(self.vocab.decode(ids)?)
    }

    /// The ratio of `<UNK>` tokens over all tokens in `captions`, rounded to
    /// 3 decimal places. It is zero if there are no tokens.
    pub fn unknown_token_ratio<'a, I>(&self, captions: I) -> R64
    where
        I: IntoIterator<Item = &'a CaptionRecord>,
    {
        unknown_token_ratio(captions)
    }

    /// The `<UNK>` ratio over all captions of the dataset.
    pub fn dataset_unknown_token_ratio(&self) -> R64 {
        unknown_token_ratio(&self.captions)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            vocabulary_size: self.vocab.len(),
            caption_count: self.captions.len(),
            image_count: self.images.len(),
            unknown_token_ratio: self.dataset_unknown_token_ratio(),
        }
    }

    fn load_image(&self, img_idx: usize) -> Result<ArrayD<f32>> {
        let image = &self.images[img_idx];

        let array = match &self.image_source {
            ImageSource::Raw {
                image_root,
                image_size,
                processor,
            } => processor.load(image_root.join(&image.file_path), *image_size, true, false)?,
            ImageSource::OnDemandFeature { feature_root } => {
                load_feature(feature_path(feature_root, &image.file_path))?
            }
            ImageSource::PreloadedFeature { features, .. } => features[img_idx].clone(),
        };

        Ok(array)
    }
}

impl RandomAccessDataset for IdgDataset {
    type Item = Example;

    fn len(&self) -> usize {
        self.captions.len()
    }

    fn get(&self, index: usize) -> Result<Example> {
        let img_idx = self.image_of(index)?;
        let image = self.load_image(img_idx)?;

        let caption = &self.captions[index].caption;
        let caption = if self.raw_caption {
            CaptionData::Raw(caption.clone())
        } else {
            let ids: Vec<i64> = caption
                .to_ids(&self.vocab)
                .into_iter()
                .map(|id| id as i64)
                .collect();
            CaptionData::Ids(Array1::from(ids))
        };

        Ok(Example {
            caption_idx: index,
            img_idx,
            image,
            caption,
        })
    }
}

/// The ratio of `<UNK>` tokens over all tokens, rounded to 3 decimal places.
pub fn unknown_token_ratio<'a, I>(captions: I) -> R64
where
    I: IntoIterator<Item = &'a CaptionRecord>,
{
    let (num_unknown, num_tokens) = captions
        .into_iter()
        .fold((0, 0), |(num_unknown, num_tokens), record| {
            (
                num_unknown + record.caption.num_unknown(),
                num_tokens + record.caption.len(),
            )
        });

    if num_tokens == 0 {
        return r64(0.0);
    }
    let ratio = num_unknown as f64 / num_tokens as f64;
    r64((ratio * 1000.0).round() / 1000.0)
}

/// Index captions to images and check that the indices are dense positions.
fn build_cap2img(captions: &[CaptionRecord], images: &[ImageRecord]) -> Result<Vec<usize>> {
    if let Some((position, image)) = images
        .iter()
        .enumerate()
        .find(|(position, image)| image.img_idx != *position)
    {
        return Err(Error::Lookup {
            reason: format!(
                "image at position {} has img_idx {}",
                position, image.img_idx
            ),
        });
    }

    captions
        .iter()
        .enumerate()
        .map(|(position, caption)| {
            let CaptionRecord {
                caption_idx,
                img_idx,
                ..
            } = *caption;

            if caption_idx != position {
                return Err(Error::Lookup {
                    reason: format!(
                        "caption at position {} has caption_idx {}",
                        position, caption_idx
                    ),
                });
            }
            if img_idx >= images.len() {
                return Err(Error::Lookup {
                    reason: format!(
                        "caption {} refers to image {}, but there are {} images",
                        caption_idx,
                        img_idx,
                        images.len()
                    ),
                });
            }
            Ok(img_idx)
        })
        .try_collect()
}

fn non_empty(path: &Path) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then(|| path.to_owned())
}
