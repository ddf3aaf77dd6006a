use crate::{
    backend::{Backend, Mode},
    error::Error,
    geometry::{keep_ratio, visible_blit, Rect},
    image::{BgraImage, Image},
    Result, WindowFlags,
};
use image::imageops::{self, FilterType};
use just_fbdev::{Blit, BYTES_PER_PIXEL};
use log::{debug, trace, warn};

/// Mouse handler signature of windowing front-ends: event, x, y, flags
pub type MouseCallback = Box<dyn FnMut(i32, i32, i32, i32)>;

/// Trackbar handler signature of windowing front-ends: new position
pub type TrackbarCallback = Box<dyn FnMut(i32)>;

/// Trackbars cannot be created on a framebuffer, so no value of this type exists
#[derive(Debug)]
pub enum Trackbar {}

/// Image surface drawn onto the backend's device. Showing an image replaces the previous
/// one, the background under the previous image is restored first.
#[derive(Debug)]
pub struct Window<'b> {
    backend: &'b Backend,
    name: String,
    flags: WindowFlags,
    rect: Rect,
    current: Option<Image>,
    drawn: Option<Blit>,
}

impl<'b> Window<'b> {
    pub(crate) fn new(backend: &'b Backend, name: String, flags: WindowFlags) -> Self {
        let rect = Rect::new(0, 0, backend.width(), backend.height());
        debug!("Created window '{name}' with {flags:?} at {rect:?}");

        Self {
            backend,
            name,
            flags,
            rect,
            current: None,
            drawn: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn flags(&self) -> WindowFlags {
        self.flags
    }

    #[inline]
    pub fn backend(&self) -> &'b Backend {
        self.backend
    }

    /// Area currently used for drawing
    #[inline]
    pub fn image_rect(&self) -> Rect {
        self.rect
    }

    /// Last shown image
    #[inline]
    pub fn image(&self) -> Option<&Image> {
        self.current.as_ref()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        true
    }

    pub fn destroy(&mut self) {
        debug!("Window '{}' stays on screen until the backend closes", self.name);
    }

    /// Draw `image`, empty images are ignored
    pub fn show(&mut self, image: &Image) {
        if image.is_empty() {
            debug!("Ignoring empty image in window '{}'", self.name);
            return;
        }

        self.current = Some(image.clone());
        self.redraw();
    }

    /// Change the window size. Only windows with [`WindowFlags::AUTOSIZE`] follow the request,
    /// until the next image snaps them back to its size.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        let (Ok(width @ 1..), Ok(height @ 1..)) = (u32::try_from(width), u32::try_from(height))
        else {
            return Err(Error::InvalidArgument("window size must be positive"));
        };

        if !self.flags.contains(WindowFlags::AUTOSIZE) {
            debug!("Window '{}' is not resizable, keeping {:?}", self.name, self.rect);
            return Ok(());
        }

        self.rect.width = width;
        self.rect.height = height;
        self.redraw();
        Ok(())
    }

    /// Move the window origin, it may lie outside the device
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.rect.x = x;
        self.rect.y = y;
        self.redraw();
    }

    fn redraw(&mut self) {
        let Some(image) = &self.current else {
            return;
        };
        let Some(bgra) = image.to_bgra() else {
            warn!("Could not convert image for window '{}'", self.name);
            return;
        };

        if self.flags.contains(WindowFlags::AUTOSIZE) {
            self.rect.width = bgra.width();
            self.rect.height = bgra.height();
        }
        if self.rect.is_empty() {
            debug!("Window '{}' has no area to draw in", self.name);
            return;
        }

        let bgra = self.fit_to_rect(bgra);

        if self.backend.mode() == Mode::Emulated {
            debug!(
                "Emulated window '{}' would draw {}x{} at ({}, {})",
                self.name,
                bgra.width(),
                bgra.height(),
                self.rect.x,
                self.rect.y
            );
            return;
        }

        if let Some(previous) = self.drawn.take() {
            self.backend.restore_background(&previous);
        }

        let device = (self.backend.width(), self.backend.height());
        let Some(blit) = visible_blit((self.rect.x, self.rect.y), bgra.dimensions(), device)
        else {
            debug!("Window '{}' at {:?} is off screen", self.name, self.rect);
            return;
        };

        let row_stride = bgra.width() as usize * BYTES_PER_PIXEL;
        let written = self.backend.write(&blit, bgra.as_raw(), row_stride);
        trace!("Window '{}' wrote {written} bytes for {blit:?}", self.name);
        self.drawn = Some(blit);
    }

    fn fit_to_rect(&self, bgra: BgraImage) -> BgraImage {
        let bounds = (self.rect.width, self.rect.height);
        let (width, height) = if self.flags.contains(WindowFlags::FREE_RATIO) {
            bounds
        } else {
            keep_ratio(bgra.dimensions(), bounds)
        };

        if (width, height) == bgra.dimensions() {
            return bgra;
        }

        trace!(
            "Scaling {}x{} to {width}x{height} for window '{}'",
            bgra.width(),
            bgra.height(),
            self.name
        );
        imageops::resize(&bgra, width, height, FilterType::Triangle)
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        warn!("Window titles are not supported, '{}' keeps no title '{title}'", self.name);
        false
    }

    pub fn set_mouse_callback(&mut self, _callback: Option<MouseCallback>) -> bool {
        warn!("Mouse input is not supported in window '{}'", self.name);
        false
    }

    pub fn create_trackbar(
        &mut self,
        name: &str,
        _value: i32,
        _count: i32,
        _callback: Option<TrackbarCallback>,
    ) -> Option<&mut Trackbar> {
        warn!("Trackbars are not supported, '{name}' was not created");
        None
    }

    pub fn find_trackbar(&mut self, name: &str) -> Option<&mut Trackbar> {
        warn!("Trackbars are not supported, '{name}' does not exist");
        None
    }

    pub fn get_property(&self, property: i32) -> f64 {
        warn!("Window properties are not supported, {property} reads as 0");
        0.0
    }

    pub fn set_property(&mut self, property: i32, value: f64) -> bool {
        warn!("Window properties are not supported, {property} stays unset instead of {value}");
        false
    }
}
