use crate::{
    error::Error,
    layout::{DeviceInfo, DeviceLayout, RealDeviceLayout, VirtualDeviceLayout},
    Blit, DeviceKind, Result, BYTES_PER_PIXEL,
};
use log::{debug, info, warn};
use memmap2::{MmapMut, MmapOptions};
use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

/// Memory mapped pixel device.
///
/// The screen contents found at open time are kept as the background and written back when
/// the device is dropped, before the mapping is released.
pub struct FramebufferDevice {
    path: PathBuf,
    layout: DeviceLayout,
    info: DeviceInfo,
    map: MmapMut,
    background: Vec<u8>,
    _file: File,
}

impl FramebufferDevice {
    pub fn open<P>(path: P, kind: DeviceKind) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Error::DeviceOpen {
                path: path.to_path_buf(),
                source,
            })?;

        let layout = match kind {
            DeviceKind::Framebuffer => DeviceLayout::Real(RealDeviceLayout::query(&file)?),
            DeviceKind::Xwd => DeviceLayout::Virtual(VirtualDeviceLayout::read(&file)?),
        };

        let info = layout.info();
        info.validate()?;

        let map_len = layout.map_len();
        if kind == DeviceKind::Xwd {
            let file_len = file.metadata().map_err(Error::DeviceInfo)?.len();
            if file_len < map_len as u64 {
                return Err(Error::Map(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("backing file has {file_len} bytes, {map_len} are needed"),
                )));
            }
        }

        // SAFETY: the device is the only writer of the mapping for its whole lifetime,
        // regular files were checked to be long enough above
        let map = unsafe { MmapOptions::new().len(map_len).map_mut(&file) }.map_err(Error::Map)?;

        info!(
            "Opened {}: {}x{} at +{}+{}, {} bpp, line length {}",
            path.display(),
            info.width,
            info.height,
            info.x_offset,
            info.y_offset,
            info.bits_per_pixel,
            info.line_length
        );

        let mut device = Self {
            path: path.to_path_buf(),
            layout,
            info,
            map,
            background: Vec::new(),
            _file: file,
        };
        device.background = device.capture_background();

        Ok(device)
    }

    #[inline]
    pub fn info(&self) -> DeviceInfo {
        self.info
    }

    #[inline]
    pub fn layout(&self) -> &DeviceLayout {
        &self.layout
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Visible screen contents saved at open time, tightly packed BGRA rows
    #[inline]
    pub fn background(&self) -> &[u8] {
        &self.background
    }

    /// Live pixel region of the mapping
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        let start = self.layout.pixel_data_offset();
        let end = (start + self.info.screen_size).min(self.map.len());
        self.map.get(start..end).unwrap_or(&[])
    }

    #[inline]
    fn pixels_mut(&mut self) -> &mut [u8] {
        let start = self.layout.pixel_data_offset();
        let end = (start + self.info.screen_size).min(self.map.len());
        self.map.get_mut(start..end).unwrap_or(&mut [])
    }

    fn capture_background(&self) -> Vec<u8> {
        let row_len = self.info.visible_row_len();
        let mut background = vec![0u8; row_len * self.info.height as usize];
        let pixels = self.pixels();

        for (row, dst) in background.chunks_exact_mut(row_len).enumerate() {
            let start = self.info.pixel_offset(0, row);
            match pixels.get(start..start + row_len) {
                Some(src) => dst.copy_from_slice(src),
                None => {
                    warn!("Background row {row} is outside the mapping");
                    break;
                }
            }
        }

        background
    }

    /// Copy `blit.cols` x `blit.rows` BGRA pixels from `pixels`, whose rows are `row_stride`
    /// bytes apart, to the visible area. Rows that would land outside the visible area or
    /// outside the pixel region are dropped. Returns the number of bytes written.
    pub fn write(&mut self, blit: &Blit, pixels: &[u8], row_stride: usize) -> usize {
        let info = self.info;
        let fitted = blit.fit(info.width as usize, info.height as usize);
        if fitted != *blit {
            warn!("Blit {blit:?} clipped to the {}x{} device", info.width, info.height);
        }
        if fitted.is_empty() {
            return 0;
        }

        let row_len = fitted.cols * BYTES_PER_PIXEL;
        let screen = self.pixels_mut();
        let mut written = 0;

        for row in 0..fitted.rows {
            let src_start = (fitted.src_y + row) * row_stride + fitted.src_x * BYTES_PER_PIXEL;
            let dst_start = info.pixel_offset(fitted.dst_x, fitted.dst_y + row);

            let (Some(src), Some(dst)) = (
                pixels.get(src_start..src_start + row_len),
                screen.get_mut(dst_start..dst_start + row_len),
            ) else {
                warn!("Blit row {row} is out of bounds, stopping");
                break;
            };

            dst.copy_from_slice(src);
            written += row_len;
        }

        written
    }

    /// Write the saved background back under the destination of `region`
    pub fn restore_background(&mut self, region: &Blit) -> usize {
        let region = Blit::in_place(region.dst_x, region.dst_y, region.cols, region.rows);
        let background = core::mem::take(&mut self.background);
        let written = self.write(&region, &background, self.info.visible_row_len());
        self.background = background;
        written
    }

    pub fn restore_all(&mut self) -> usize {
        let full = Blit::in_place(0, 0, self.info.width as usize, self.info.height as usize);
        self.restore_background(&full)
    }

    /// Restore the background, unmap and close the device
    #[inline]
    pub fn close(self) {
        drop(self)
    }
}

impl Drop for FramebufferDevice {
    fn drop(&mut self) {
        let restored = self.restore_all();
        if let Err(err) = self.map.flush() {
            warn!("Could not flush {}: {err}", self.path.display());
        }
        debug!("Closing {}, restored {restored} background bytes", self.path.display());
    }
}

impl core::fmt::Debug for FramebufferDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FramebufferDevice")
            .field("path", &self.path)
            .field("info", &self.info)
            .field("map_len", &self.map.len())
            .finish()
    }
}
