//! Image windows drawn straight onto a Linux framebuffer or an Xvfb screen dump, with key
//! input read from the controlling terminal.
//!
//! ```no_run
//! use just_fbwindow::{Backend, Image, WindowFlags};
//!
//! let backend = Backend::new();
//! let mut window = backend.create_window("preview", WindowFlags::AUTOSIZE);
//! let image = Image::new(2, 1, 3, vec![255u8, 0, 0, 0, 0, 255])?;
//! window.show(&image);
//! backend.wait_key(0);
//! # Ok::<(), just_fbwindow::Error>(())
//! ```

use crate::utils::bitmask;

pub mod backend;
pub mod error;
pub mod geometry;
pub mod image;
mod utils;
pub mod window;

pub use backend::{Backend, Config, Mode};
pub use error::Error;
pub use geometry::Rect;
pub use crate::image::{Image, Samples};
pub use just_tty::KeyCode;
pub use window::Window;

pub type Result<T> = core::result::Result<T, Error>;

bitmask! {
    #[repr(u32)]
    bitmask WindowFlags {
        NORMAL = 0x0,
        /// Window takes the size of the shown image
        AUTOSIZE = 0x1,
        /// Images are stretched to the window size
        FREE_RATIO = 0x100,
        /// Images are scaled to fit the window with their aspect ratio, the default
        KEEP_RATIO = 0x0,
    }
}
