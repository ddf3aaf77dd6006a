use super::DeviceInfo;
use crate::{error::Error, Result};
use std::{fs::File, io, os::fd::AsRawFd};

const FBIOGET_VSCREENINFO: u32 = 0x4600;
const FBIOGET_FSCREENINFO: u32 = 0x4602;

/// `struct fb_bitfield`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

impl Bitfield {
    #[inline]
    pub const fn new(offset: u32, length: u32) -> Self {
        Self {
            offset,
            length,
            msb_right: 0,
        }
    }
}

/// `struct fb_fix_screeninfo`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FixScreenInfo {
    pub id: [u8; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

/// `struct fb_var_screeninfo`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: Bitfield,
    pub green: Bitfield,
    pub blue: Bitfield,
    pub transp: Bitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

const RED: Bitfield = Bitfield::new(16, 8);
const GREEN: Bitfield = Bitfield::new(8, 8);
const BLUE: Bitfield = Bitfield::new(0, 8);

/// Geometry of a Linux framebuffer character device
#[derive(Debug, Clone)]
pub struct RealDeviceLayout {
    fix: FixScreenInfo,
    var: VarScreenInfo,
}

impl RealDeviceLayout {
    /// Query both screen info structs of an open framebuffer
    pub fn query(device: &File) -> Result<Self> {
        let fd = device.as_raw_fd();

        let mut fix = FixScreenInfo::default();
        // SAFETY: `fix` is a `repr(C)` mirror of `fb_fix_screeninfo` and outlives the call
        if unsafe { libc::ioctl(fd, FBIOGET_FSCREENINFO as _, &mut fix as *mut FixScreenInfo) } != 0
        {
            return Err(Error::DeviceInfo(io::Error::last_os_error()));
        }

        let mut var = VarScreenInfo::default();
        // SAFETY: same as above for `fb_var_screeninfo`
        if unsafe { libc::ioctl(fd, FBIOGET_VSCREENINFO as _, &mut var as *mut VarScreenInfo) } != 0
        {
            return Err(Error::DeviceInfo(io::Error::last_os_error()));
        }

        Self::from_screen_info(fix, var)
    }

    /// Accept only BGRA32, i.e. red at bit 16, green at 8 and blue at 0, eight bits each.
    /// Any single deviation rejects the device.
    pub fn from_screen_info(fix: FixScreenInfo, var: VarScreenInfo) -> Result<Self> {
        if var.bits_per_pixel != 32 {
            return Err(Error::unsupported(format!(
                "{} bits per pixel, only 32 is supported",
                var.bits_per_pixel
            )));
        }

        for (name, actual, expected) in [
            ("red", var.red, RED),
            ("green", var.green, GREEN),
            ("blue", var.blue, BLUE),
        ] {
            if actual.offset != expected.offset || actual.length != expected.length {
                return Err(Error::unsupported(format!(
                    "{name} channel at offset {} length {}, expected offset {} length {}",
                    actual.offset, actual.length, expected.offset, expected.length
                )));
            }
        }

        Ok(Self { fix, var })
    }

    pub fn info(&self) -> DeviceInfo {
        let virtual_width = self.var.xres.max(self.var.xres_virtual) as usize;
        let virtual_height = self.var.yres.max(self.var.yres_virtual) as usize;
        let bytes_per_pixel = self.var.bits_per_pixel as usize / 8;

        // Padded scanlines make the stride based size larger than the packed one
        let screen_size = (virtual_width * virtual_height * bytes_per_pixel)
            .max(self.fix.line_length as usize * virtual_height);

        DeviceInfo {
            width: self.var.xres,
            height: self.var.yres,
            x_offset: self.var.xoffset,
            y_offset: self.var.yoffset,
            bits_per_pixel: self.var.bits_per_pixel,
            line_length: self.fix.line_length,
            screen_size,
        }
    }
}
