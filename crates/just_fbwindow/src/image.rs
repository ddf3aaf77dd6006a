use crate::{error::Error, Result};
use image::{DynamicImage, GrayImage, ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

/// 8 bit pixels in device order: blue, green, red, alpha. The `Rgba` container is only used
/// for its layout, channel 0 holds blue.
pub type BgraImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Interleaved samples of one numeric type
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Samples {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(s) => s.len(),
            Self::I8(s) => s.len(),
            Self::U16(s) => s.len(),
            Self::I16(s) => s.len(),
            Self::F32(s) => s.len(),
            Self::F64(s) => s.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map every sample to `0..=255`: signed 8 bit values are shifted by 127, 16 bit values
    /// are divided by 255 (signed ones shifted by 127 as well), floats in `[0, 1)` are
    /// multiplied by 255. Results are rounded and saturated.
    pub fn to_u8(&self) -> Vec<u8> {
        match self {
            Self::U8(s) => s.clone(),
            Self::I8(s) => s.iter().map(|&v| saturate(f64::from(v) + 127.0)).collect(),
            Self::U16(s) => s.iter().map(|&v| saturate(f64::from(v) / 255.0)).collect(),
            Self::I16(s) => s
                .iter()
                .map(|&v| saturate(f64::from(v) / 255.0 + 127.0))
                .collect(),
            Self::F32(s) => s.iter().map(|&v| saturate(f64::from(v) * 255.0)).collect(),
            Self::F64(s) => s.iter().map(|&v| saturate(v * 255.0)).collect(),
        }
    }
}

#[inline]
fn saturate(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

macro_rules! impl_from_samples {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl From<Vec<$ty>> for Samples {
                #[inline]
                fn from(samples: Vec<$ty>) -> Self {
                    Self::$variant(samples)
                }
            }
        )*
    };
}

impl_from_samples! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    f32 => F32,
    f64 => F64,
}

/// Image handed to a window: 1 channel intensity, 3 channel RGB or 4 channel RGBA
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    channels: u8,
    samples: Samples,
}

impl Image {
    pub fn new<S>(width: u32, height: u32, channels: u8, samples: S) -> Result<Self>
    where
        S: Into<Samples>,
    {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(Error::UnsupportedChannels(channels));
        }

        let samples = samples.into();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels as usize));
        if expected != Some(samples.len()) {
            return Err(Error::InvalidImage {
                width,
                height,
                channels,
                expected: expected.unwrap_or(usize::MAX),
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[inline]
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Convert to device pixels. Intensity images are expanded to RGB first, RGB gets an
    /// opaque alpha channel and red and blue trade places.
    pub fn to_bgra(&self) -> Option<BgraImage> {
        let bytes = self.samples.to_u8();

        let rgba = match self.channels {
            1 => {
                let gray = GrayImage::from_raw(self.width, self.height, bytes)?;
                let rgb: RgbImage = DynamicImage::ImageLuma8(gray).to_rgb8();
                DynamicImage::ImageRgb8(rgb).to_rgba8()
            }
            3 => {
                let rgb = ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, bytes)?;
                DynamicImage::ImageRgb8(rgb).to_rgba8()
            }
            4 => RgbaImage::from_raw(self.width, self.height, bytes)?,
            _ => return None,
        };

        let mut bgra: BgraImage = rgba;
        for pixel in bgra.pixels_mut() {
            pixel.0.swap(0, 2);
        }
        Some(bgra)
    }
}

impl From<DynamicImage> for Image {
    fn from(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (channels, samples) = match image {
            DynamicImage::ImageLuma8(buf) => (1, Samples::U8(buf.into_raw())),
            DynamicImage::ImageLuma16(buf) => (1, Samples::U16(buf.into_raw())),
            DynamicImage::ImageRgb8(buf) => (3, Samples::U8(buf.into_raw())),
            DynamicImage::ImageRgba8(buf) => (4, Samples::U8(buf.into_raw())),
            DynamicImage::ImageRgb16(buf) => (3, Samples::U16(buf.into_raw())),
            DynamicImage::ImageRgba16(buf) => (4, Samples::U16(buf.into_raw())),
            DynamicImage::ImageRgb32F(buf) => (3, Samples::F32(buf.into_raw())),
            DynamicImage::ImageRgba32F(buf) => (4, Samples::F32(buf.into_raw())),
            other => (4, Samples::U8(other.to_rgba8().into_raw())),
        };

        Self {
            width,
            height,
            channels,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_pixel(image: &Image) -> [u8; 4] {
        image.to_bgra().unwrap().get_pixel(0, 0).0
    }

    #[test]
    fn rejects_wrong_sample_count() {
        let err = Image::new(2, 2, 3, vec![0u8; 11]).unwrap_err();
        assert!(matches!(err, Error::InvalidImage { expected: 12, actual: 11, .. }));
    }

    #[test]
    fn rejects_shape_too_large_to_address() {
        let err = Image::new(u32::MAX, u32::MAX, 4, Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidImage { actual: 0, .. }));
    }

    #[test]
    fn rejects_two_channels() {
        let err = Image::new(1, 1, 2, vec![0u8; 2]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedChannels(2)));
    }

    #[test]
    fn empty_image() {
        let image = Image::new(0, 5, 1, Vec::<u8>::new()).unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn gray_expands_to_opaque_bgra() {
        let image = Image::new(1, 1, 1, vec![77u8]).unwrap();
        assert_eq!(first_pixel(&image), [77, 77, 77, 255]);
    }

    #[test]
    fn signed_8_bit_is_biased() {
        let image = Image::new(3, 1, 1, vec![-128i8, 0, 127]).unwrap();
        let bgra = image.to_bgra().unwrap();
        assert_eq!(bgra.get_pixel(0, 0).0[0], 0);
        assert_eq!(bgra.get_pixel(1, 0).0[0], 127);
        assert_eq!(bgra.get_pixel(2, 0).0[0], 254);
    }

    #[test]
    fn signed_16_bit_is_scaled_and_biased() {
        let image = Image::new(3, 1, 1, vec![-32768i16, 0, 255 * 100]).unwrap();
        assert_eq!(Samples::from(vec![-32768i16, 0, 255 * 100]).to_u8(), vec![0, 127, 227]);
        assert_eq!(first_pixel(&image), [0, 0, 0, 255]);
    }

    #[test]
    fn unsigned_16_bit_is_scaled() {
        assert_eq!(Samples::from(vec![0u16, 255 * 200, 65535]).to_u8(), vec![0, 200, 255]);
    }

    #[test]
    fn floats_are_scaled_from_unit_range() {
        assert_eq!(Samples::from(vec![0.0f32, 0.5, 1.0, -3.0]).to_u8(), vec![0, 128, 255, 0]);
        assert_eq!(Samples::from(vec![0.2f64, 2.0, f64::NAN]).to_u8(), vec![51, 255, 0]);
    }

    #[test]
    fn rgb_becomes_bgra() {
        let image = Image::new(1, 1, 3, vec![10u8, 20, 30]).unwrap();
        assert_eq!(first_pixel(&image), [30, 20, 10, 255]);
    }

    #[test]
    fn rgba_keeps_alpha() {
        let image = Image::new(1, 1, 4, vec![10u8, 20, 30, 40]).unwrap();
        assert_eq!(first_pixel(&image), [30, 20, 10, 40]);
    }

    #[test]
    fn float_rgb() {
        let image = Image::new(1, 1, 3, vec![1.0f32, 0.0, 0.5]).unwrap();
        assert_eq!(first_pixel(&image), [128, 0, 255, 255]);
    }

    #[test]
    fn from_dynamic_image() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_raw(2, 1, vec![1, 2]).unwrap());
        let image = Image::from(gray);
        assert_eq!((image.width(), image.height(), image.channels()), (2, 1, 1));
        assert_eq!(image.samples(), &Samples::U8(vec![1, 2]));

        let la = DynamicImage::ImageLumaA8(ImageBuffer::from_raw(1, 1, vec![9, 200]).unwrap());
        let image = Image::from(la);
        assert_eq!(image.channels(), 4);
        assert_eq!(first_pixel(&image), [9, 9, 9, 200]);
    }
}
