//! Direct access to 32 bit BGRA pixel devices: Linux `fbdev` framebuffers and Xvfb screens
//! exported as XWD dumps (`Xvfb -fbdir`).

mod device;
pub mod error;
pub mod layout;
mod utils;

pub use device::FramebufferDevice;
pub use error::Error;
pub use layout::{DeviceInfo, DeviceLayout};

pub type Result<T> = core::result::Result<T, Error>;

/// The only supported pixel layout is BGRA32
pub const BYTES_PER_PIXEL: usize = 4;

/// Default path of the first Linux framebuffer
pub const DEFAULT_DEVICE_PATH: &str = "/dev/fb0";

/// Backing store format of a device file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Character device queried with `FBIOGET_FSCREENINFO`/`FBIOGET_VSCREENINFO`
    Framebuffer,
    /// Regular file starting with an XWD header, as written by `Xvfb -fbdir`
    Xwd,
}

/// Rectangular copy from a source bitmap to the visible device area, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Blit {
    pub src_x: usize,
    pub src_y: usize,
    pub dst_x: usize,
    pub dst_y: usize,
    pub cols: usize,
    pub rows: usize,
}

impl Blit {
    /// Copy where source and destination coordinates are the same, used for full-screen
    /// sized buffers like the saved background
    #[inline]
    pub fn in_place(x: usize, y: usize, cols: usize, rows: usize) -> Self {
        Self {
            src_x: x,
            src_y: y,
            dst_x: x,
            dst_y: y,
            cols,
            rows,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Shrink the destination so it stays inside `width` x `height`
    #[inline]
    pub(crate) fn fit(self, width: usize, height: usize) -> Self {
        Self {
            cols: self.cols.min(width.saturating_sub(self.dst_x)),
            rows: self.rows.min(height.saturating_sub(self.dst_y)),
            ..self
        }
    }
}
