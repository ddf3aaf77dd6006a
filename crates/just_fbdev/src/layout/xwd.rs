use super::DeviceInfo;
use crate::{error::Error, utils::bin_parse, Result};
use log::debug;
use memmap2::MmapOptions;
use std::fs::File;

/// Size of the fixed part of `XWDFileHeader`, the window name follows it
pub const HEADER_LEN: usize = 100;

/// `sizeof(XWDColor)`
pub const COLOR_ENTRY_LEN: usize = 12;

pub const XWD_FILE_VERSION: u32 = 7;

/// `ZPixmap` image format
pub const Z_PIXMAP: u32 = 2;

pub const RED_MASK: u32 = 0x00ff_0000;
pub const GREEN_MASK: u32 = 0x0000_ff00;
pub const BLUE_MASK: u32 = 0x0000_00ff;

/// `XWDFileHeader`, all fields are stored most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XwdHeader {
    pub header_size: u32,
    pub file_version: u32,
    pub pixmap_format: u32,
    pub pixmap_depth: u32,
    pub pixmap_width: u32,
    pub pixmap_height: u32,
    pub xoffset: u32,
    pub byte_order: u32,
    pub bitmap_unit: u32,
    pub bitmap_bit_order: u32,
    pub bitmap_pad: u32,
    pub bits_per_pixel: u32,
    pub bytes_per_line: u32,
    pub visual_class: u32,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub bits_per_rgb: u32,
    pub colormap_entries: u32,
    pub ncolors: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub window_x: u32,
    pub window_y: u32,
    pub window_bdrwidth: u32,
}

impl XwdHeader {
    /// Header of a `width` x `height` 24 bit deep, 32 bits per pixel TrueColor screen,
    /// the layout Xvfb uses for `-screen 0 WxHx24`
    pub fn zpixmap_bgra32(width: u32, height: u32, bytes_per_line: u32) -> Self {
        Self {
            header_size: HEADER_LEN as u32,
            file_version: XWD_FILE_VERSION,
            pixmap_format: Z_PIXMAP,
            pixmap_depth: 24,
            pixmap_width: width,
            pixmap_height: height,
            xoffset: 0,
            byte_order: 0,
            bitmap_unit: 32,
            bitmap_bit_order: 0,
            bitmap_pad: 32,
            bits_per_pixel: 32,
            bytes_per_line,
            visual_class: 4, // TrueColor
            red_mask: RED_MASK,
            green_mask: GREEN_MASK,
            blue_mask: BLUE_MASK,
            bits_per_rgb: 8,
            colormap_entries: 256,
            ncolors: 0,
            window_width: width,
            window_height: height,
            window_x: 0,
            window_y: 0,
            window_bdrwidth: 0,
        }
    }

    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        let (header_size, raw) = bin_parse::u32_be(raw)?;
        let (file_version, raw) = bin_parse::u32_be(raw)?;
        let (pixmap_format, raw) = bin_parse::u32_be(raw)?;
        let (pixmap_depth, raw) = bin_parse::u32_be(raw)?;
        let (pixmap_width, raw) = bin_parse::u32_be(raw)?;
        let (pixmap_height, raw) = bin_parse::u32_be(raw)?;
        let (xoffset, raw) = bin_parse::u32_be(raw)?;
        let (byte_order, raw) = bin_parse::u32_be(raw)?;
        let (bitmap_unit, raw) = bin_parse::u32_be(raw)?;
        let (bitmap_bit_order, raw) = bin_parse::u32_be(raw)?;
        let (bitmap_pad, raw) = bin_parse::u32_be(raw)?;
        let (bits_per_pixel, raw) = bin_parse::u32_be(raw)?;
        let (bytes_per_line, raw) = bin_parse::u32_be(raw)?;
        let (visual_class, raw) = bin_parse::u32_be(raw)?;
        let (red_mask, raw) = bin_parse::u32_be(raw)?;
        let (green_mask, raw) = bin_parse::u32_be(raw)?;
        let (blue_mask, raw) = bin_parse::u32_be(raw)?;
        let (bits_per_rgb, raw) = bin_parse::u32_be(raw)?;
        let (colormap_entries, raw) = bin_parse::u32_be(raw)?;
        let (ncolors, raw) = bin_parse::u32_be(raw)?;
        let (window_width, raw) = bin_parse::u32_be(raw)?;
        let (window_height, raw) = bin_parse::u32_be(raw)?;
        let (window_x, raw) = bin_parse::u32_be(raw)?;
        let (window_y, raw) = bin_parse::u32_be(raw)?;
        let (window_bdrwidth, _raw) = bin_parse::u32_be(raw)?;

        Some(Self {
            header_size,
            file_version,
            pixmap_format,
            pixmap_depth,
            pixmap_width,
            pixmap_height,
            xoffset,
            byte_order,
            bitmap_unit,
            bitmap_bit_order,
            bitmap_pad,
            bits_per_pixel,
            bytes_per_line,
            visual_class,
            red_mask,
            green_mask,
            blue_mask,
            bits_per_rgb,
            colormap_entries,
            ncolors,
            window_width,
            window_height,
            window_x,
            window_y,
            window_bdrwidth,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let fields = [
            self.header_size,
            self.file_version,
            self.pixmap_format,
            self.pixmap_depth,
            self.pixmap_width,
            self.pixmap_height,
            self.xoffset,
            self.byte_order,
            self.bitmap_unit,
            self.bitmap_bit_order,
            self.bitmap_pad,
            self.bits_per_pixel,
            self.bytes_per_line,
            self.visual_class,
            self.red_mask,
            self.green_mask,
            self.blue_mask,
            self.bits_per_rgb,
            self.colormap_entries,
            self.ncolors,
            self.window_width,
            self.window_height,
            self.window_x,
            self.window_y,
            self.window_bdrwidth,
        ];

        let mut bytes = [0u8; HEADER_LEN];
        for (chunk, field) in bytes.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_be_bytes());
        }
        bytes
    }
}

/// Geometry of an Xvfb screen dump: header, color table, then pixels
#[derive(Debug, Clone)]
pub struct VirtualDeviceLayout {
    header: XwdHeader,
}

impl VirtualDeviceLayout {
    /// Parse the header of an XWD backing file. Only the fixed header region is mapped
    /// and it is unmapped again before returning.
    pub fn read(device: &File) -> Result<Self> {
        let file_len = device.metadata().map_err(Error::DeviceInfo)?.len();
        if file_len < HEADER_LEN as u64 {
            return Err(Error::unsupported(format!(
                "{file_len} bytes is too short for an XWD header"
            )));
        }

        // SAFETY: the file is at least `HEADER_LEN` long and the mapping is dropped before
        // anything else touches the file
        let header_map = unsafe { MmapOptions::new().len(HEADER_LEN).map(device) }
            .map_err(Error::Map)?;
        let header = XwdHeader::from_bytes(&header_map)
            .ok_or_else(|| Error::unsupported("truncated XWD header"))?;
        drop(header_map);

        debug!("XWD header: {header:?}");
        Self::from_header(header)
    }

    pub fn from_header(header: XwdHeader) -> Result<Self> {
        if header.pixmap_format != Z_PIXMAP {
            return Err(Error::unsupported(format!(
                "XWD pixmap format {}, only ZPixmap ({Z_PIXMAP}) is supported",
                header.pixmap_format
            )));
        }

        if header.xoffset != 0 {
            return Err(Error::unsupported(format!(
                "XWD x offset {}, expected 0",
                header.xoffset
            )));
        }

        if header.bits_per_pixel != 32 {
            return Err(Error::unsupported(format!(
                "{} bits per pixel, only 32 is supported",
                header.bits_per_pixel
            )));
        }

        if header.red_mask != RED_MASK
            || header.green_mask != GREEN_MASK
            || header.blue_mask != BLUE_MASK
        {
            return Err(Error::unsupported(format!(
                "channel masks {:#08x}/{:#08x}/{:#08x} are not BGRA32",
                header.red_mask, header.green_mask, header.blue_mask
            )));
        }

        if (header.header_size as usize) < HEADER_LEN {
            return Err(Error::unsupported(format!(
                "XWD header size {} is smaller than the fixed header",
                header.header_size
            )));
        }

        Ok(Self { header })
    }

    #[inline]
    pub fn header(&self) -> &XwdHeader {
        &self.header
    }

    #[inline]
    pub fn header_len(&self) -> usize {
        self.header.header_size as usize
    }

    #[inline]
    pub fn color_table_len(&self) -> usize {
        self.header.ncolors as usize * COLOR_ENTRY_LEN
    }

    #[inline]
    pub fn pixel_data_len(&self) -> usize {
        self.header.bytes_per_line as usize * self.header.pixmap_height as usize
    }

    #[inline]
    pub fn pixel_data_offset(&self) -> usize {
        self.header_len() + self.color_table_len()
    }

    #[inline]
    pub fn map_len(&self) -> usize {
        self.pixel_data_offset() + self.pixel_data_len()
    }

    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            width: self.header.pixmap_width,
            height: self.header.pixmap_height,
            x_offset: 0,
            y_offset: 0,
            bits_per_pixel: self.header.bits_per_pixel,
            line_length: self.header.bytes_per_line,
            screen_size: self.pixel_data_len(),
        }
    }
}
