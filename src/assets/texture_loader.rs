//! Asynchronous texture decoding.
//!
//! Requests return a texture handle immediately, bound to a 1x1 white
//! placeholder. Decoding runs on a background `tokio` blocking pool; results
//! travel back over a `flume` channel and are uploaded on the render thread
//! by [`TextureLoader::poll`]. Nothing is uploaded from a worker thread.

use std::path::PathBuf;

use image::ImageFormat;
use tokio::runtime::{Builder, Runtime};

use crate::errors::{EngineError, Result};
use crate::render::backend::{GpuBackend, TextureHandle};

const PLACEHOLDER_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// Where encoded image bytes come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Encoded bytes already in memory, e.g. from a buffer view or data URI.
    Bytes {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    /// An image file on disk.
    Path(PathBuf),
}

impl TextureSource {
    fn label(&self) -> String {
        match self {
            TextureSource::Bytes { mime_type, bytes } => format!(
                "<{} bytes {}>",
                bytes.len(),
                mime_type.as_deref().unwrap_or("image")
            ),
            TextureSource::Path(path) => path.display().to_string(),
        }
    }
}

/// Outcome of a finished request, reported by [`TextureLoader::poll`].
#[derive(Debug)]
pub enum TextureLoadEvent {
    Loaded {
        texture: TextureHandle,
        width: u32,
        height: u32,
    },
    /// Decoding failed; the placeholder stays bound.
    Failed {
        texture: TextureHandle,
        error: EngineError,
    },
}

impl TextureLoadEvent {
    #[must_use]
    pub fn texture(&self) -> TextureHandle {
        match self {
            TextureLoadEvent::Loaded { texture, .. } | TextureLoadEvent::Failed { texture, .. } => {
                *texture
            }
        }
    }
}

enum DecodedImage {
    Flat {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    Cube {
        size: u32,
        faces: Vec<Vec<u8>>,
    },
}

struct Completion {
    texture: TextureHandle,
    result: Result<DecodedImage>,
}

pub struct TextureLoader {
    runtime: Runtime,
    sender: flume::Sender<Completion>,
    receiver: flume::Receiver<Completion>,
    pending: usize,
}

impl std::fmt::Debug for TextureLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureLoader")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl TextureLoader {
    /// Starts the background decode runtime.
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(4)
            .thread_name("arbor-texture-decode")
            .build()?;
        let (sender, receiver) = flume::unbounded();

        Ok(Self {
            runtime,
            sender,
            receiver,
            pending: 0,
        })
    }

    /// Number of requests whose result has not been polled yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Requests a 2D texture. The returned handle is usable at once.
    pub fn request_2d(&mut self, gpu: &mut dyn GpuBackend, source: TextureSource) -> TextureHandle {
        let texture = gpu.create_texture();
        gpu.upload_texture_rgba8(texture, 1, 1, &PLACEHOLDER_PIXEL, false);

        self.spawn(texture, move || {
            let (width, height, pixels) = decode_rgba8(&source)?;
            Ok(DecodedImage::Flat {
                width,
                height,
                pixels,
            })
        });
        texture
    }

    /// Requests a cube texture from faces ordered +X, -X, +Y, -Y, +Z, -Z.
    ///
    /// Every face must be square and the same size.
    pub fn request_cube(&mut self, gpu: &mut dyn GpuBackend, faces: [TextureSource; 6]) -> TextureHandle {
        let texture = gpu.create_texture();
        let placeholder = vec![PLACEHOLDER_PIXEL.to_vec(); 6];
        gpu.upload_cube_texture_rgba8(texture, 1, &placeholder);

        self.spawn(texture, move || {
            let mut size = None;
            let mut pixels = Vec::with_capacity(6);
            for face in &faces {
                let (width, height, data) = decode_rgba8(face)?;
                if width != height || size.is_some_and(|s| s != width) {
                    return Err(EngineError::ImageDecode(format!(
                        "cube face {} is {width}x{height}, faces must be square and equal",
                        face.label()
                    )));
                }
                size = Some(width);
                pixels.push(data);
            }
            Ok(DecodedImage::Cube {
                size: size.unwrap_or(1),
                faces: pixels,
            })
        });
        texture
    }

    fn spawn(&mut self, texture: TextureHandle, job: impl FnOnce() -> Result<DecodedImage> + Send + 'static) {
        let sender = self.sender.clone();
        self.pending += 1;
        self.runtime.spawn_blocking(move || {
            let result = job();
            // The loader may already be gone; nothing left to upload to.
            let _ = sender.send(Completion { texture, result });
        });
    }

    /// Uploads every decode that has finished and reports the outcomes.
    pub fn poll(&mut self, gpu: &mut dyn GpuBackend) -> Vec<TextureLoadEvent> {
        let completions: Vec<Completion> = self.receiver.try_iter().collect();
        completions
            .into_iter()
            .map(|completion| self.finish(gpu, completion))
            .collect()
    }

    /// Blocks until all outstanding requests have finished, then uploads them.
    pub fn wait_all(&mut self, gpu: &mut dyn GpuBackend) -> Vec<TextureLoadEvent> {
        let mut events = Vec::with_capacity(self.pending);
        while self.pending > 0 {
            let Ok(completion) = self.receiver.recv() else {
                break;
            };
            events.push(self.finish(gpu, completion));
        }
        events
    }

    fn finish(&mut self, gpu: &mut dyn GpuBackend, completion: Completion) -> TextureLoadEvent {
        self.pending = self.pending.saturating_sub(1);
        let Completion { texture, result } = completion;

        match result {
            Ok(DecodedImage::Flat {
                width,
                height,
                pixels,
            }) => {
                gpu.upload_texture_rgba8(texture, width, height, &pixels, true);
                TextureLoadEvent::Loaded {
                    texture,
                    width,
                    height,
                }
            }
            Ok(DecodedImage::Cube { size, faces }) => {
                gpu.upload_cube_texture_rgba8(texture, size, &faces);
                TextureLoadEvent::Loaded {
                    texture,
                    width: size,
                    height: size,
                }
            }
            Err(error) => {
                log::warn!("Texture {texture:?} failed to load, keeping placeholder: {error}");
                TextureLoadEvent::Failed { texture, error }
            }
        }
    }
}

/// Decodes `source` into tightly packed RGBA8 pixels.
fn decode_rgba8(source: &TextureSource) -> Result<(u32, u32, Vec<u8>)> {
    let image = match source {
        TextureSource::Bytes { bytes, mime_type } => {
            match mime_type.as_deref().and_then(ImageFormat::from_mime_type) {
                Some(format) => image::load_from_memory_with_format(bytes, format)?,
                None => image::load_from_memory(bytes)?,
            }
        }
        TextureSource::Path(path) => {
            let bytes = std::fs::read(path)?;
            match ImageFormat::from_path(path) {
                Ok(format) => image::load_from_memory_with_format(&bytes, format)?,
                Err(_) => image::load_from_memory(&bytes)?,
            }
        }
    };

    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}
