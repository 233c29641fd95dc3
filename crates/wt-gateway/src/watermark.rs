use std::collections::HashMap;
use std::sync::mpsc::{channel, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use image::{Rgba, RgbaImage};
use log::{info, warn};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;
use crate::error::GatewayError;

const BAND_WIDTH: u32 = 24;
const BAND_ALPHA: f32 = 0.35;

enum WorkerCommand {
    Apply { id: Uuid, image: RgbaImage },
    Shutdown,
}

type Reply = Result<RgbaImage, String>;

enum RouterMessage {
    Register { id: Uuid, reply: oneshot::Sender<Reply> },
    Completed { id: Uuid, result: Reply },
}

struct Running {
    command_tx: Sender<WorkerCommand>,
    router_tx: mpsc::UnboundedSender<RouterMessage>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Background watermark compositor.
///
/// The compute thread and its router task are started on first use. The
/// router owns the map from request id to waiting caller, so any number of
/// callers can have work outstanding at once and each gets its own image
/// back. Callers and the worker talk to the router over one channel, which
/// keeps a caller's registration ahead of its completion.
pub struct WatermarkWorker {
    running: OnceLock<Running>,
    stopped: AtomicBool,
}

impl Default for WatermarkWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl WatermarkWorker {
    pub fn new() -> Self {
        Self {
            running: OnceLock::new(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn is_started(&self) -> bool {
        self.running.get().is_some()
    }

    /// Must be called from within a tokio runtime.
    pub async fn apply(&self, image: RgbaImage) -> Result<RgbaImage, GatewayError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(GatewayError::WorkerUnavailable);
        }
        let running = self.running.get_or_init(Running::start);
        let id = Uuid::new_v4();
        let (reply, rx) = oneshot::channel();

        running
            .router_tx
            .send(RouterMessage::Register { id, reply })
            .map_err(|_| GatewayError::WorkerUnavailable)?;
        running
            .command_tx
            .send(WorkerCommand::Apply { id, image })
            .map_err(|_| GatewayError::WorkerUnavailable)?;

        rx.await
            .map_err(|_| GatewayError::WorkerUnavailable)?
            .map_err(GatewayError::Render)
    }

    /// Stop the compute thread. Later calls to [`apply`](Self::apply) fail
    /// with [`GatewayError::WorkerUnavailable`].
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(running) = self.running.get() {
            let _ = running.command_tx.send(WorkerCommand::Shutdown);
            let handle = running.thread_handle.lock().ok().and_then(|mut h| h.take());
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for WatermarkWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Running {
    fn start() -> Self {
        let (command_tx, command_rx) = channel::<WorkerCommand>();
        let (router_tx, mut router_rx) = mpsc::unbounded_channel::<RouterMessage>();

        tokio::spawn(async move {
            let mut pending: HashMap<Uuid, oneshot::Sender<Reply>> = HashMap::new();
            while let Some(message) = router_rx.recv().await {
                match message {
                    RouterMessage::Register { id, reply } => {
                        pending.insert(id, reply);
                    }
                    RouterMessage::Completed { id, result } => match pending.remove(&id) {
                        Some(reply) => {
                            let _ = reply.send(result);
                        }
                        None => warn!("watermark result {} has no waiting caller", id),
                    },
                }
            }
        });

        let completions = router_tx.clone();
        let thread_handle = thread::spawn(move || {
            info!("watermark worker started");
            loop {
                match command_rx.recv() {
                    Ok(WorkerCommand::Apply { id, mut image }) => {
                        let result = if image.width() == 0 || image.height() == 0 {
                            Err("cannot watermark an empty image".to_string())
                        } else {
                            apply_watermark(&mut image);
                            Ok(image)
                        };
                        if completions.send(RouterMessage::Completed { id, result }).is_err() {
                            break;
                        }
                    }
                    Ok(WorkerCommand::Shutdown) => break,
                    Err(_) => break,
                }
            }
            info!("watermark worker stopped");
        });

        Self {
            command_tx,
            router_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        }
    }
}

/// Lightens diagonal bands across the whole image. Coverage is uniform so
/// cropping cannot remove it.
pub fn apply_watermark(image: &mut RgbaImage) {
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if is_band(x, y) {
            *pixel = blend_white(*pixel);
        }
    }
}

fn is_band(x: u32, y: u32) -> bool {
    ((x + y) / BAND_WIDTH) % 4 == 0
}

fn blend_white(pixel: Rgba<u8>) -> Rgba<u8> {
    let mix = |c: u8| (c as f32 + (255.0 - c as f32) * BAND_ALPHA).round() as u8;
    Rgba([mix(pixel[0]), mix(pixel[1]), mix(pixel[2]), pixel[3]])
}
