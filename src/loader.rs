// loader.rs: background panorama loading
//
// Every request carries a generation number. The viewer only applies the
// result whose generation matches its latest request, so a slow earlier load
// can never overwrite a newer scene.

use crate::error::LoadError;
use image::io::Reader as ImageReader;
use image::GenericImageView;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub source: String,
}

#[derive(Debug)]
pub struct LoadOutcome<I> {
    pub generation: u64,
    pub source: String,
    pub result: Result<I, LoadError>,
}

/// Something that turns image references into decoded images, asynchronously.
pub trait PanoramaSource {
    type Image;

    /// Starts loading; must not block.
    fn request(&mut self, ticket: LoadTicket);

    /// Next finished load, if any; must not block.
    fn poll(&mut self) -> Option<LoadOutcome<Self::Image>>;
}

/// Decodes images from disk on short-lived worker threads.
pub struct ThreadedLoader {
    base_dir: PathBuf,
    tx: Sender<LoadOutcome<image::RgbaImage>>,
    rx: Receiver<LoadOutcome<image::RgbaImage>>,
}

impl ThreadedLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = channel();
        Self {
            base_dir: base_dir.into(),
            tx,
            rx,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl PanoramaSource for ThreadedLoader {
    type Image = image::RgbaImage;

    fn request(&mut self, ticket: LoadTicket) {
        let path = resolve_image_path(&self.base_dir, &ticket.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            log::info!("loading panorama {} (generation {})", path.display(), ticket.generation);
            let result = decode_rgba(&path);
            let outcome = LoadOutcome {
                generation: ticket.generation,
                source: ticket.source,
                result,
            };
            if tx.send(outcome).is_err() {
                log::debug!("viewer gone, dropping panorama {}", path.display());
            }
        });
    }

    fn poll(&mut self) -> Option<LoadOutcome<Self::Image>> {
        // the loader keeps its own sender, so the channel never disconnects
        self.rx.try_recv().ok()
    }
}

/// Image references look like `/images/tours/x.jpg`, relative to the asset
/// root. Absolute filesystem paths that exist are used as given.
pub fn resolve_image_path(base_dir: &Path, source: &str) -> PathBuf {
    let as_given = Path::new(source);
    if as_given.is_absolute() && as_given.exists() {
        return as_given.to_path_buf();
    }
    base_dir.join(source.trim_start_matches(['/', '\\']))
}

fn decode_rgba(path: &Path) -> Result<image::RgbaImage, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let img = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|e| LoadError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let (w, h) = img.dimensions();
    log::info!("decoded {} ({w}x{h})", path.display());
    Ok(img.to_rgba8())
}
