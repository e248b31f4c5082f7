//! Background decoding of planet surface textures.
//!
//! The render thread submits paths with [`TextureLoader::request`] and picks
//! up decoded pixels with [`TextureLoader::drain`] once per frame. Neither
//! call blocks on file IO or decoding.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crate::planet::PlanetId;

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to load texture {path}: {source}")]
pub struct TextureLoadError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

struct TextureRequest {
    planet: PlanetId,
    path: PathBuf,
}

/// A finished load, successful or not.
pub struct LoadedTexture {
    pub planet: PlanetId,
    pub path: PathBuf,
    pub result: Result<DecodedImage, TextureLoadError>,
}

/// Decode an image file into RGBA8.
pub fn decode_texture(path: &Path) -> Result<DecodedImage, TextureLoadError> {
    let image = image::open(path)
        .map_err(|source| TextureLoadError {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(DecodedImage {
        rgba: image.into_raw(),
        width,
        height,
    })
}

/// One worker thread that decodes texture files off the render thread.
pub struct TextureLoader {
    request_sender: Option<crossbeam_channel::Sender<TextureRequest>>,
    result_receiver: crossbeam_channel::Receiver<LoadedTexture>,
    worker: Option<JoinHandle<()>>,
    pending: usize,
}

impl TextureLoader {
    pub fn new() -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<TextureRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let worker = std::thread::spawn(move || {
            while let Ok(request) = request_rx.recv() {
                let result = decode_texture(&request.path);
                let loaded = LoadedTexture {
                    planet: request.planet,
                    path: request.path,
                    result,
                };
                if result_tx.send(loaded).is_err() {
                    break;
                }
            }
        });

        Self {
            request_sender: Some(request_tx),
            result_receiver: result_rx,
            worker: Some(worker),
            pending: 0,
        }
    }

    /// Queue a texture for decoding. Returns `false` once the loader is shut down.
    pub fn request(&mut self, planet: PlanetId, path: PathBuf) -> bool {
        let Some(sender) = &self.request_sender else {
            return false;
        };
        tracing::debug!(%planet, path = %path.display(), "Queued texture load");
        if sender.send(TextureRequest { planet, path }).is_err() {
            return false;
        }
        self.pending += 1;
        true
    }

    /// Collect every finished load without waiting.
    pub fn drain(&mut self) -> Vec<LoadedTexture> {
        let loaded: Vec<_> = self.result_receiver.try_iter().collect();
        self.pending = self.pending.saturating_sub(loaded.len());
        loaded
    }

    /// Requests submitted but not yet drained.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Close the request channel and join the worker.
    pub fn shutdown(&mut self) {
        self.request_sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
