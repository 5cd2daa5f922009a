use crate::scene::Handle;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset {0} is empty")]
    Empty(PathBuf),
    #[error("asset loader has been shut down")]
    ShutDown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Completion of a texture request. `owner` is the scene node that asked
/// for the texture; it may have been released by the time this arrives.
#[derive(Debug)]
pub struct TextureLoadEvent {
    pub owner: Handle,
    pub path: PathBuf,
    pub result: Result<TextureData, AssetError>,
}

pub trait AssetLoader: Send {
    fn label(&self) -> &'static str;

    fn request_texture(&mut self, owner: Handle, path: &Path) -> Result<(), AssetError>;

    /// Returns the completions that arrived since the last poll, in
    /// arrival order.
    fn poll_completed(&mut self) -> Vec<TextureLoadEvent>;

    fn shutdown(&mut self) {}
}

fn read_texture(path: &Path) -> Result<TextureData, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }
    Ok(TextureData {
        path: path.to_path_buf(),
        bytes,
    })
}

/// Reads each texture on a background thread and hands completions back
/// through a channel drained by [`AssetLoader::poll_completed`].
pub struct ThreadedAssetLoader {
    sender: Option<Sender<TextureLoadEvent>>,
    receiver: Receiver<TextureLoadEvent>,
    in_flight: usize,
}

impl ThreadedAssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender: Some(sender),
            receiver,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Default for ThreadedAssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader for ThreadedAssetLoader {
    fn label(&self) -> &'static str {
        "Threaded Asset Loader"
    }

    fn request_texture(&mut self, owner: Handle, path: &Path) -> Result<(), AssetError> {
        let sender = self.sender.clone().ok_or(AssetError::ShutDown)?;
        let path = path.to_path_buf();
        log::debug!("[assets] loading texture {}", path.display());

        thread::Builder::new()
            .name("texture-loader".to_string())
            .spawn(move || {
                let result = read_texture(&path);
                if sender.send(TextureLoadEvent { owner, path, result }).is_err() {
                    log::debug!("[assets] loader dropped before texture completion was delivered");
                }
            })
            .map_err(|source| AssetError::Io {
                path: PathBuf::from("<texture-loader thread>"),
                source,
            })?;

        self.in_flight += 1;
        Ok(())
    }

    fn poll_completed(&mut self) -> Vec<TextureLoadEvent> {
        let completed: Vec<TextureLoadEvent> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(completed.len());
        completed
    }

    fn shutdown(&mut self) {
        if self.sender.take().is_some() {
            log::debug!(
                "[assets] loader shut down with {} request(s) in flight",
                self.in_flight
            );
        }
    }
}

/// Reads synchronously at request time but only delivers on the next poll,
/// which keeps completion ordering deterministic for headless sessions.
#[derive(Default)]
pub struct DeferredAssetLoader {
    ready: VecDeque<TextureLoadEvent>,
    shut_down: bool,
}

impl DeferredAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.ready.len()
    }
}

impl AssetLoader for DeferredAssetLoader {
    fn label(&self) -> &'static str {
        "Deferred Asset Loader"
    }

    fn request_texture(&mut self, owner: Handle, path: &Path) -> Result<(), AssetError> {
        if self.shut_down {
            return Err(AssetError::ShutDown);
        }
        self.ready.push_back(TextureLoadEvent {
            owner,
            path: path.to_path_buf(),
            result: read_texture(path),
        });
        Ok(())
    }

    fn poll_completed(&mut self) -> Vec<TextureLoadEvent> {
        self.ready.drain(..).collect()
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        self.ready.clear();
    }
}
