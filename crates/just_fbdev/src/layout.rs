use crate::{error::Error, Result, BYTES_PER_PIXEL};

pub mod real;
pub mod xwd;

pub use real::RealDeviceLayout;
pub use xwd::VirtualDeviceLayout;

/// Normalized geometry of an open device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// Visible width in pixels
    pub width: u32,
    /// Visible height in pixels
    pub height: u32,
    /// Origin of the visible area inside the virtual screen
    pub x_offset: u32,
    pub y_offset: u32,
    pub bits_per_pixel: u32,
    /// Bytes per scanline, including padding
    pub line_length: u32,
    /// Length of the pixel region in bytes
    pub screen_size: usize,
}

impl DeviceInfo {
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }

    /// Byte offset of visible pixel `(col, row)` within the pixel region
    #[inline]
    pub fn pixel_offset(&self, col: usize, row: usize) -> usize {
        (self.y_offset as usize + row) * self.line_length as usize
            + (self.x_offset as usize + col) * BYTES_PER_PIXEL
    }

    /// Bytes needed to hold one visible scanline
    #[inline]
    pub fn visible_row_len(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.bits_per_pixel != 32 {
            return Err(Error::unsupported(format!(
                "{} bits per pixel, only 32 is supported",
                self.bits_per_pixel
            )));
        }

        if self.width == 0 || self.height == 0 {
            return Err(Error::unsupported(format!(
                "empty visible area {}x{}",
                self.width, self.height
            )));
        }

        if (self.line_length as usize) < self.visible_row_len() {
            return Err(Error::unsupported(format!(
                "line length {} is shorter than {} pixels",
                self.line_length, self.width
            )));
        }

        let row_end = (self.x_offset as usize + self.width as usize) * BYTES_PER_PIXEL;
        if row_end > self.line_length as usize {
            return Err(Error::unsupported(format!(
                "x offset {} with {} pixels runs past line length {}",
                self.x_offset, self.width, self.line_length
            )));
        }

        let end = self.pixel_offset(self.width as usize, self.height as usize - 1);
        if end > self.screen_size {
            return Err(Error::unsupported(format!(
                "visible area ends at byte {end} past screen size {}",
                self.screen_size
            )));
        }

        Ok(())
    }
}

/// Where the geometry of a device came from. Both variants normalize into [`DeviceInfo`],
/// nothing past `open` needs to know which one is in use.
#[derive(Debug, Clone)]
pub enum DeviceLayout {
    Real(RealDeviceLayout),
    Virtual(VirtualDeviceLayout),
}

impl DeviceLayout {
    #[inline]
    pub fn info(&self) -> DeviceInfo {
        match self {
            Self::Real(layout) => layout.info(),
            Self::Virtual(layout) => layout.info(),
        }
    }

    /// Offset of the first pixel byte in the mapping
    #[inline]
    pub fn pixel_data_offset(&self) -> usize {
        match self {
            Self::Real(_) => 0,
            Self::Virtual(layout) => layout.pixel_data_offset(),
        }
    }

    /// Number of bytes that have to be mapped
    #[inline]
    pub fn map_len(&self) -> usize {
        match self {
            Self::Real(layout) => layout.info().screen_size,
            Self::Virtual(layout) => layout.map_len(),
        }
    }
}
