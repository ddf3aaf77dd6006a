use clap::{Parser, ValueEnum};
use just_fbwindow::{backend::Config, Backend, Image, KeyCode, Mode, WindowFlags};
use log::{error, info};
use std::{error::Error, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Sizing {
    /// Window takes the image size
    Auto,
    /// Scale to fit the window, keeping the aspect ratio
    Keep,
    /// Stretch to fill the window
    Free,
}

impl From<Sizing> for WindowFlags {
    fn from(sizing: Sizing) -> Self {
        match sizing {
            Sizing::Auto => WindowFlags::AUTOSIZE,
            Sizing::Keep => WindowFlags::KEEP_RATIO,
            Sizing::Free => WindowFlags::FREE_RATIO,
        }
    }
}

/// Show images on a framebuffer, one per key press. Escape or `q` quits.
#[derive(Debug, Parser)]
#[command(name = "justfb", version, about, long_about = None)]
struct Cli {
    /// Images to show, in order
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// Backend mode (FB, XVFB or EMU), defaults to $JUSTFB_MODE
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<Mode>,

    /// Device or XWD file, defaults to $JUSTFB_DEVICE, $FRAMEBUFFER or /dev/fb0
    #[arg(short, long, value_name = "PATH")]
    device: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Sizing::Keep)]
    sizing: Sizing,

    /// Window origin, may be negative
    #[arg(short = 'x', long, default_value_t = 0, allow_hyphen_values = true)]
    left: i32,

    #[arg(short = 'y', long, default_value_t = 0, allow_hyphen_values = true)]
    top: i32,

    /// Milliseconds to wait for a key before the next image, 0 waits forever
    #[arg(long, default_value_t = 0)]
    delay: i32,
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    Mode::parse(value).ok_or_else(|| format!("unknown mode '{value}', expected FB, XVFB or EMU"))
}

fn is_quit(key: Option<KeyCode>) -> bool {
    matches!(key, Some(key) if key == KeyCode::ESCAPE || char::from(key) == 'q')
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(device) = cli.device {
        config.device_path = device;
    }

    let backend = Backend::with_config(&config);
    let mut window = backend.create_window("justfb", cli.sizing.into());
    window.move_to(cli.left, cli.top);

    for path in &cli.images {
        let image = match image::open(path) {
            Ok(image) => Image::from(image),
            Err(err) => {
                error!("Could not load '{}': {err}", path.display());
                continue;
            }
        };

        info!(
            "Showing '{}' ({}x{}, {} channels)",
            path.display(),
            image.width(),
            image.height(),
            image.channels()
        );
        window.show(&image);

        if is_quit(backend.wait_key(cli.delay)) {
            break;
        }
    }

    Ok(())
}
