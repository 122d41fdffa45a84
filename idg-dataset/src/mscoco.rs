//! Conversion of MSCOCO caption annotations to formatted records.

use crate::{common::*, error::*, record::FormattedRecord};

/// The MSCOCO caption dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoCaptions {
    pub annotations: Vec<CocoAnnotation>,
    pub images: Vec<CocoImage>,
}

/// A caption annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenized_caption: Option<String>,
}

/// An image entry. Descriptive fields like `coco_url` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
}

impl CocoImage {
    /// Derive the image path relative to the image root.
    ///
    /// MSCOCO file names look like `COCO_train2014_000000000009.jpg`. The
    /// segment after the prefix names the directory the image lives in.
    pub fn file_path(&self) -> Result<String> {
        let data_origin = self
            .file_name
            .split('_')
            .nth(1)
            .filter(|origin| !origin.is_empty())
            .ok_or_else(|| Error::MalformedRecord {
                reason: format!(
                    "image file name '{}' of image {} has no data origin segment",
                    self.file_name, self.id
                ),
            })?;
        let path = Path::new(data_origin).join(&self.file_name);
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Read an MSCOCO caption dataset file.
pub fn read_mscoco(path: impl AsRef<Path>) -> Result<CocoCaptions> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::not_found(path));
    }
    let reader = BufReader::new(File::open(path)?);
    let dataset: CocoCaptions = serde_json::from_reader(reader)?;
    info!(
        "read {} annotations and {} images from {}",
        dataset.annotations.len(),
        dataset.images.len(),
        path.display()
    );
    Ok(dataset)
}

/// Group annotations by image id.
///
/// Annotations keep their input order within each group.
pub fn group_by_image<I>(annotations: I) -> IndexMap<u64, Vec<CocoAnnotation>>
where
    I: IntoIterator<Item = CocoAnnotation>,
{
    annotations
        .into_iter()
        .fold(IndexMap::new(), |mut groups, annotation| {
            groups
                .entry(annotation.image_id)
                .or_insert_with(Vec::new)
                .push(annotation);
            groups
        })
}

/// Build one formatted record per image, in image order.
pub fn build_formatted_records(
    images: &[CocoImage],
    groups: &IndexMap<u64, Vec<CocoAnnotation>>,
) -> Result<Vec<FormattedRecord>> {
    images
        .iter()
        .map(|image| {
            let file_path = image.file_path()?;
            let annotations = groups
                .get(&image.id)
                .filter(|annotations| !annotations.is_empty())
                .ok_or_else(|| Error::Lookup {
                    reason: format!("image {} has no caption annotations", image.id),
                })?;

            let captions: Vec<_> = annotations
                .iter()
                .map(|annotation| annotation.caption.clone())
                .collect();

            let tokenized_captions = if annotations[0].tokenized_caption.is_some() {
                let tokenized: Vec<_> = annotations
                    .iter()
                    .map(|annotation| {
                        annotation.tokenized_caption.clone().ok_or_else(|| {
                            Error::MalformedRecord {
                                reason: format!(
                                    "annotation {} of image {} lacks tokenized_caption",
                                    annotation.id, image.id
                                ),
                            }
                        })
                    })
                    .try_collect()?;
                Some(tokenized)
            } else {
                None
            };

            Ok(FormattedRecord {
                file_path,
                id: image.id,
                captions,
                tokenized_captions,
            })
        })
        .try_collect()
}

/// Convert an MSCOCO caption file to formatted records.
pub fn mscoco_to_formatted(path: impl AsRef<Path>) -> Result<Vec<FormattedRecord>> {
    let CocoCaptions {
        annotations,
        images,
    } = read_mscoco(path)?;
    let groups = group_by_image(annotations);
    let records = build_formatted_records(&images, &groups)?;
    info!("formatted {} images", records.len());
    Ok(records)
}
