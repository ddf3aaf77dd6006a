#![allow(dead_code)]

use just_fbdev::layout::xwd::XwdHeader;
use just_fbwindow::{backend::Config, Backend, Mode};
use just_tty::{KeyCode, KeyInput};
use std::{
    collections::VecDeque,
    fs, io,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

pub const BACKGROUND: u8 = 0x11;

/// XWD screen dump in the system temp directory, removed on drop
pub struct DumpFile {
    pub path: PathBuf,
}

impl DumpFile {
    pub fn create(name: &str, contents: &[u8]) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "just_fbwindow-{}-{}-{name}.xwd",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&path, contents).unwrap();
        Self { path }
    }

    /// Screen of `width` x `height` pixels filled with [`BACKGROUND`]
    pub fn screen(name: &str, width: u32, height: u32, bytes_per_line: u32) -> Self {
        Self::create(name, &dump(XwdHeader::zpixmap_bgra32(width, height, bytes_per_line)))
    }

    pub fn read(&self) -> Vec<u8> {
        fs::read(&self.path).unwrap()
    }
}

impl Drop for DumpFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub fn dump(header: XwdHeader) -> Vec<u8> {
    let mut raw = header.to_bytes().to_vec();
    raw.resize(header.header_size as usize, 0);
    let pixel_len = header.bytes_per_line as usize * header.pixmap_height as usize;
    raw.resize(raw.len() + pixel_len, BACKGROUND);
    raw
}

/// Keys already waiting in the terminal queue
#[derive(Default)]
pub struct ScriptedKeys {
    queued: VecDeque<u8>,
}

impl ScriptedKeys {
    pub fn new(keys: &[u8]) -> Box<Self> {
        Box::new(Self {
            queued: keys.iter().copied().collect(),
        })
    }
}

impl KeyInput for ScriptedKeys {
    fn pending(&mut self) -> io::Result<usize> {
        Ok(self.queued.len())
    }

    fn read_key(&mut self, _wait: bool) -> io::Result<Option<KeyCode>> {
        Ok(self.queued.pop_front().map(KeyCode::from_byte))
    }
}

pub fn xvfb_backend(file: &DumpFile) -> Backend {
    let backend = Backend::with_input(&Config::new(Mode::Xvfb, &file.path), ScriptedKeys::new(&[]));
    assert_eq!(backend.mode(), Mode::Xvfb);
    backend
}

/// BGRA bytes of visible pixel `(col, row)`
pub fn pixel(backend: &Backend, col: usize, row: usize) -> [u8; 4] {
    backend
        .with_device(|device| {
            let offset = device.info().pixel_offset(col, row);
            let mut pixel = [0u8; 4];
            pixel.copy_from_slice(&device.pixels()[offset..offset + 4]);
            pixel
        })
        .unwrap()
}
