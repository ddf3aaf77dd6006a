use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Image of {width}x{height}x{channels} needs {expected} samples, got {actual}")]
    InvalidImage {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Images with {0} channels are not supported, expected 1, 3 or 4")]
    UnsupportedChannels(u8),
}
