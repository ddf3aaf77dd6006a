use just_fbdev::{
    error::Error,
    layout::xwd::{XwdHeader, COLOR_ENTRY_LEN, HEADER_LEN},
    Blit, DeviceKind, FramebufferDevice,
};
use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

/// XWD dump in the system temp directory, removed on drop
struct DumpFile {
    path: PathBuf,
}

impl DumpFile {
    fn create(name: &str, contents: &[u8]) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "just_fbdev-{}-{}-{name}.xwd",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&path, contents).unwrap();
        Self { path }
    }

    fn read(&self) -> Vec<u8> {
        fs::read(&self.path).unwrap()
    }
}

impl Drop for DumpFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Header, optional window name and color table, then a pixel pattern where every byte
/// depends on its position
fn dump(header: XwdHeader) -> (Vec<u8>, usize) {
    let mut raw = header.to_bytes().to_vec();
    raw.resize(header.header_size as usize, b'x');
    raw.resize(raw.len() + header.ncolors as usize * COLOR_ENTRY_LEN, 0xcc);
    let pixel_offset = raw.len();
    let pixel_len = header.bytes_per_line as usize * header.pixmap_height as usize;
    raw.extend((0..pixel_len).map(|i| (i * 7 % 251) as u8));
    (raw, pixel_offset)
}

#[test]
fn open_reads_geometry_and_background() {
    let header = XwdHeader::zpixmap_bgra32(16, 8, 64);
    let (raw, pixel_offset) = dump(header);
    let file = DumpFile::create("geometry", &raw);

    let device = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap();
    let info = device.info();
    assert_eq!((info.width, info.height), (16, 8));
    assert_eq!(info.line_length, 64);
    assert_eq!(device.layout().pixel_data_offset(), pixel_offset);
    assert_eq!(device.background(), &raw[pixel_offset..]);
    assert_eq!(device.pixels(), &raw[pixel_offset..]);
}

#[test]
fn close_restores_background_exactly() {
    let header = XwdHeader {
        header_size: HEADER_LEN as u32 + 9,
        ncolors: 2,
        ..XwdHeader::zpixmap_bgra32(10, 6, 48)
    };
    let (raw, _) = dump(header);
    let file = DumpFile::create("restore", &raw);

    let mut device = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap();
    let red = [0x00, 0x00, 0xff, 0xff].repeat(10 * 6);
    let written = device.write(&Blit::in_place(0, 0, 10, 6), &red, 40);
    assert_eq!(written, 10 * 6 * 4);
    assert_ne!(file.read(), raw);

    device.close();
    assert_eq!(file.read(), raw);
}

#[test]
fn write_lands_at_stride_offsets() {
    let header = XwdHeader {
        header_size: HEADER_LEN as u32 + 4,
        ncolors: 1,
        ..XwdHeader::zpixmap_bgra32(4, 4, 24)
    };
    let (raw, pixel_offset) = dump(header);
    let file = DumpFile::create("stride", &raw);

    let mut device = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap();
    // 2x2 source, only the bottom right pixel goes to device pixel (3, 2)
    let src = [[1u8; 4], [2; 4], [3; 4], [9; 4]].concat();
    let blit = Blit {
        src_x: 1,
        src_y: 1,
        dst_x: 3,
        dst_y: 2,
        cols: 1,
        rows: 1,
    };
    assert_eq!(device.write(&blit, &src, 8), 4);

    let on_disk = file.read();
    let at = pixel_offset + 2 * 24 + 3 * 4;
    assert_eq!(&on_disk[at..at + 4], &[9; 4]);
    assert_eq!(&on_disk[..at], &raw[..at]);
    assert_eq!(&on_disk[at + 4..], &raw[at + 4..]);
    drop(device);
}

#[test]
fn oversized_blit_is_clipped_to_device() {
    let header = XwdHeader::zpixmap_bgra32(4, 3, 16);
    let (raw, pixel_offset) = dump(header);
    let file = DumpFile::create("clip", &raw);

    let mut device = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap();
    let src = vec![0xee; 10 * 10 * 4];
    let written = device.write(&Blit::in_place(2, 1, 10, 10), &src, 40);
    assert_eq!(written, 2 * 2 * 4);

    let on_disk = file.read();
    let fill = [0xeeu8; 4];
    assert_eq!(on_disk.len(), raw.len());
    for row in 0..3 {
        for col in 0..4 {
            let at = pixel_offset + row * 16 + col * 4;
            let expected = if row >= 1 && col >= 2 {
                fill.as_slice()
            } else {
                &raw[at..at + 4]
            };
            assert_eq!(&on_disk[at..at + 4], expected, "pixel ({col}, {row})");
        }
    }
    drop(device);
}

#[test]
fn restore_background_only_touches_region() {
    let header = XwdHeader::zpixmap_bgra32(6, 6, 24);
    let (raw, pixel_offset) = dump(header);
    let file = DumpFile::create("region", &raw);

    let mut device = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap();
    let white = vec![0xff; 6 * 6 * 4];
    device.write(&Blit::in_place(0, 0, 6, 6), &white, 24);
    device.restore_background(&Blit::in_place(1, 1, 2, 2));

    let pixels = device.pixels();
    let white_pixel = [0xffu8; 4];
    for row in 0..6 {
        for col in 0..6 {
            let at = row * 24 + col * 4;
            let inside = (1..3).contains(&row) && (1..3).contains(&col);
            let expected = if inside {
                &raw[pixel_offset + at..pixel_offset + at + 4]
            } else {
                white_pixel.as_slice()
            };
            assert_eq!(&pixels[at..at + 4], expected, "pixel ({col}, {row})");
        }
    }
}

#[test]
fn xy_pixmap_is_rejected_without_touching_the_file() {
    let header = XwdHeader {
        pixmap_format: 1,
        ..XwdHeader::zpixmap_bgra32(4, 4, 16)
    };
    let (raw, _) = dump(header);
    let file = DumpFile::create("xypixmap", &raw);

    let err = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)), "{err}");
    assert_eq!(file.read(), raw);
}

#[test]
fn zero_sized_screen_is_rejected() {
    for (width, height, bytes_per_line) in [(0, 4, 0), (4, 0, 16)] {
        let (raw, _) = dump(XwdHeader::zpixmap_bgra32(width, height, bytes_per_line));
        let file = DumpFile::create("empty", &raw);

        let err = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)), "{err}");
        assert_eq!(file.read(), raw);
    }
}

#[test]
fn truncated_pixel_data_is_a_map_error() {
    let header = XwdHeader::zpixmap_bgra32(32, 32, 128);
    let (raw, pixel_offset) = dump(header);
    let file = DumpFile::create("truncated", &raw[..pixel_offset + 100]);

    let err = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap_err();
    assert!(err.is_map_error(), "{err}");
}

#[test]
fn short_file_is_not_an_xwd_dump() {
    let file = DumpFile::create("short", b"not a screen");
    let err = FramebufferDevice::open(&file.path, DeviceKind::Xwd).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

#[test]
fn missing_device_is_an_open_error() {
    let err = FramebufferDevice::open("/nonexistent/fb9", DeviceKind::Framebuffer).unwrap_err();
    assert!(matches!(err, Error::DeviceOpen { .. }));
}

#[test]
fn regular_file_is_not_a_framebuffer() {
    let (raw, _) = dump(XwdHeader::zpixmap_bgra32(2, 2, 8));
    let file = DumpFile::create("notfb", &raw);
    let err = FramebufferDevice::open(&file.path, DeviceKind::Framebuffer).unwrap_err();
    assert!(matches!(err, Error::DeviceInfo(_)));
}
