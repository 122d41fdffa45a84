//! Image loading and saving with channel-wise mean subtraction.

use crate::{common::*, error::*};
use image::{imageops::FilterType, io::Reader as ImageReader, GenericImageView as _, RgbImage};

/// The ImageNet channel means in B, G, R order.
pub const IMAGENET_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// The per-channel mean subtracted from loaded images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageMean {
    Imagenet,
    Zero,
    /// Custom means in B, G, R order.
    Custom([f32; 3]),
}

impl ImageMean {
    pub fn values(&self) -> [f32; 3] {
        match *self {
            Self::Imagenet => IMAGENET_MEAN,
            Self::Zero => [0.0; 3],
            Self::Custom(values) => values,
        }
    }
}

impl Default for ImageMean {
    fn default() -> Self {
        Self::Imagenet
    }
}

impl FromStr for ImageMean {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mean = match text.trim() {
            "imagenet" => Self::Imagenet,
            "zero" | "none" => Self::Zero,
            text => {
                let values: Vec<f32> = text
                    .split(',')
                    .map(|value| value.trim().parse::<f32>())
                    .try_collect()
                    .map_err(|_| Error::Configuration {
                        reason: format!("invalid image mean '{}'", text),
                    })?;
                let values: [f32; 3] =
                    values.try_into().map_err(|_| Error::Configuration {
                        reason: format!("image mean '{}' must have three values", text),
                    })?;
                Self::Custom(values)
            }
        };
        Ok(mean)
    }
}

impl fmt::Display for ImageMean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imagenet => write!(f, "imagenet"),
            Self::Zero => write!(f, "zero"),
            Self::Custom([b, g, r]) => write!(f, "{},{},{}", b, g, r),
        }
    }
}

impl Serialize for ImageMean {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageMean {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Image loader that produces mean-subtracted B-G-R channel-first arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageProcessor {
    mean: [f32; 3],
}

impl ImageProcessor {
    pub fn new(mean: ImageMean) -> Self {
        Self {
            mean: mean.values(),
        }
    }

    pub fn mean(&self) -> [f32; 3] {
        self.mean
    }

    /// Load an image.
    ///
    /// * `path` - The image file.
    /// * `image_size` - The `[height, width]` to resize to.
    /// * `resize` - Resize the image if its size differs from `image_size`.
    /// * `expand_dim` - Prepend a batch dimension of size 1.
    ///
    /// The output has shape `[3, height, width]`, or `[1, 3, height, width]`
    /// with `expand_dim`, in B, G, R channel order.
    pub fn load(
        &self,
        path: impl AsRef<Path>,
        image_size: [usize; 2],
        resize: bool,
        expand_dim: bool,
    ) -> Result<ArrayD<f32>> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|_| Error::not_found(path))?
            .decode()
            .map_err(|err| {
                warn!("failed to decode image {}: {}", path.display(), err);
                Error::not_found(path)
            })?;

        let [target_h, target_w] = image_size;
        let image = if resize
            && (image.height() as usize, image.width() as usize) != (target_h, target_w)
        {
            image.resize_exact(target_w as u32, target_h as u32, FilterType::Triangle)
        } else {
            image
        };

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let means = self.mean;

        let array = Array3::from_shape_fn(
            [3, height as usize, width as usize],
            |(channel, y, x)| {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                // BGR is the reverse of RGB
                f32::from(pixel[2 - channel]) - means[channel]
            },
        );

        let array = if expand_dim {
            array.insert_axis(Axis(0)).into_dyn()
        } else {
            array.into_dyn()
        };

        Ok(array)
    }

    /// Save a B-G-R channel-first array as an image file.
    ///
    /// It accepts `[3, height, width]` or `[1, 3, height, width]` arrays.
    /// Values are rounded and clamped to the `0..=255` range.
    pub fn save(&self, array: ArrayViewD<'_, f32>, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let array: ArrayView3<'_, f32> = match array.ndim() {
            4 if array.shape()[0] == 1 => array.index_axis_move(Axis(0), 0),
            _ => array,
        }
        .into_dimensionality::<Ix3>()?;

        let shape = array.shape();
        if shape[0] != 3 {
            return Err(Error::Configuration {
                reason: format!("expect 3 image channels, but get {}", shape[0]),
            });
        }
        let (height, width) = (shape[1], shape[2]);

        let image = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            let to_u8 = |channel: usize| array[[channel, y, x]].round().clamp(0.0, 255.0) as u8;
            image::Rgb([to_u8(2), to_u8(1), to_u8(0)])
        });
        image.save(path)?;

        Ok(())
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(ImageMean::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn write_image(path: &Path, width: u32, height: u32) {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([10, 20 + x as u8, 30 + y as u8])
        });
        image.save(path).unwrap();
    }

    #[test]
    fn image_mean_parse_test() {
        assert_eq!("imagenet".parse::<ImageMean>().unwrap(), ImageMean::Imagenet);
        assert_eq!("none".parse::<ImageMean>().unwrap(), ImageMean::Zero);
        assert_eq!(
            "1, 2.5, 3".parse::<ImageMean>().unwrap(),
            ImageMean::Custom([1.0, 2.5, 3.0])
        );
        assert!("1,2".parse::<ImageMean>().is_err());
        assert!("bgr".parse::<ImageMean>().is_err());
    }

    #[test]
    fn load_bgr_channel_first_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        write_image(&path, 4, 2);

        let processor = ImageProcessor::new(ImageMean::Zero);
        let array = processor.load(&path, [2, 4], true, false).unwrap();
        assert_eq!(array.shape(), [3, 2, 4]);
        let array = array.into_dimensionality::<Ix3>().unwrap();
        assert_abs_diff_eq!(array[[0, 1, 3]], 31.0);
        assert_abs_diff_eq!(array[[1, 1, 3]], 23.0);
        assert_abs_diff_eq!(array[[2, 1, 3]], 10.0);
    }

    #[test]
    fn load_subtracts_mean_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        write_image(&path, 4, 2);

        let processor = ImageProcessor::new(ImageMean::Imagenet);
        let array = processor.load(&path, [2, 4], false, true).unwrap();
        assert_eq!(array.shape(), [1, 3, 2, 4]);
        let array = array.into_dimensionality::<ndarray::Ix4>().unwrap();
        assert_abs_diff_eq!(array[[0, 2, 0, 0]], 10.0 - 123.68, epsilon = 1e-4);
        assert_abs_diff_eq!(array[[0, 0, 0, 0]], 30.0 - 103.939, epsilon = 1e-4);
    }

    #[test]
    fn load_resize_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        write_image(&path, 8, 6);

        let processor = ImageProcessor::default();
        let resized = processor.load(&path, [3, 5], true, false).unwrap();
        assert_eq!(resized.shape(), [3, 3, 5]);

        let kept = processor.load(&path, [3, 5], false, false).unwrap();
        assert_eq!(kept.shape(), [3, 6, 8]);
    }

    #[test]
    fn load_missing_image_test() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ImageProcessor::default();

        let result = processor.load(dir.path().join("missing.png"), [2, 2], true, false);
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let path = dir.path().join("broken.png");
        fs::write(&path, b"not an image").unwrap();
        let result = processor.load(&path, [2, 2], true, false);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn save_test() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.png");
        let dst = dir.path().join("dst.png");
        write_image(&src, 4, 2);

        let processor = ImageProcessor::new(ImageMean::Zero);
        let array = processor.load(&src, [2, 4], false, true).unwrap();
        processor.save(array.view(), &dst).unwrap();

        let reloaded = processor.load(&dst, [2, 4], false, false).unwrap();
        assert_eq!(reloaded, array.index_axis(Axis(0), 0));
    }
}
