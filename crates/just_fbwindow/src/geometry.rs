use just_fbdev::Blit;

/// Window area in device pixels, the origin may lie outside the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Largest size with the aspect ratio of `image` that fits in `bounds`. The width follows
/// the bounds first, if the derived height does not fit the height is used instead.
pub fn keep_ratio((width, height): (u32, u32), (max_width, max_height): (u32, u32)) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_width, max_height);
    }

    let (width, height) = (u64::from(width), u64::from(height));
    let mut new_width = u64::from(max_width);
    let mut new_height = new_width * height / width;
    if new_height > u64::from(max_height) {
        new_height = u64::from(max_height);
        new_width = new_height * width / height;
    }

    (new_width.max(1) as u32, new_height.max(1) as u32)
}

/// Part of an image placed at `(x, y)` that lands on a `device_width` x `device_height`
/// screen, `None` when nothing is visible
pub fn visible_blit(
    (x, y): (i32, i32),
    (image_width, image_height): (u32, u32),
    (device_width, device_height): (u32, u32),
) -> Option<Blit> {
    let (src_x, dst_x, cols) = visible_span(x, image_width, device_width)?;
    let (src_y, dst_y, rows) = visible_span(y, image_height, device_height)?;

    Some(Blit {
        src_x,
        src_y,
        dst_x,
        dst_y,
        cols,
        rows,
    })
}

/// Intersect `[origin, origin + len)` with `[0, limit)`
fn visible_span(origin: i32, len: u32, limit: u32) -> Option<(usize, usize, usize)> {
    let start = i64::from(origin);
    let end = start + i64::from(len);

    let visible_start = start.max(0);
    let visible_end = end.min(i64::from(limit));
    if visible_end <= visible_start {
        return None;
    }

    Some((
        (visible_start - start) as usize,
        visible_start as usize,
        (visible_end - visible_start) as usize,
    ))
}
