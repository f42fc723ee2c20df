//! Background worker for asset loading.
//!
//! Separates glTF parsing and HDR decoding from the UI thread to keep
//! the interface responsive. GPU uploads still happen on the UI thread;
//! the worker only produces CPU-side data.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::environment::{self, EnvironmentImage};
use crate::scene::{self, SceneData};

/// Commands sent from UI to worker.
#[derive(Debug)]
pub enum WorkerCommand {
    /// Parse a .gltf/.glb file into mesh data.
    LoadModel(PathBuf),
    /// Decode an .hdr/.exr environment map.
    LoadEnvironment(PathBuf),
    /// Stop the worker thread.
    Stop,
}

/// Results sent from worker back to UI.
pub enum WorkerResult {
    ModelReady { path: PathBuf, scene: SceneData },
    EnvironmentReady { path: PathBuf, image: EnvironmentImage },
    LoadFailed { path: PathBuf, error: String },
}

/// Handle to communicate with the background worker.
pub struct WorkerHandle {
    tx: Sender<WorkerCommand>,
    rx: Receiver<WorkerResult>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn the loader thread.
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = channel::<WorkerCommand>();
        let (res_tx, res_rx) = channel::<WorkerResult>();

        let handle = thread::Builder::new()
            .name("turntable-loader".into())
            .spawn(move || worker_loop(cmd_rx, res_tx))
            .expect("spawn loader thread");

        Self {
            tx: cmd_tx,
            rx: res_rx,
            handle: Some(handle),
        }
    }

    pub fn request_model(&self, path: PathBuf) {
        let _ = self.tx.send(WorkerCommand::LoadModel(path));
    }

    pub fn request_environment(&self, path: PathBuf) {
        let _ = self.tx.send(WorkerCommand::LoadEnvironment(path));
    }

    /// Check for ready results (non-blocking).
    pub fn try_recv(&self) -> Option<WorkerResult> {
        self.rx.try_recv().ok()
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop(&mut self) {
        let _ = self.tx.send(WorkerCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main worker loop - runs in the background thread.
fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResult>) {
    loop {
        let cmd = match rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => break, // channel closed
        };

        // Rapid re-opens only cost one load: keep the newest request of
        // each kind and drop the rest.
        let (model, env, stop) = drain_to_latest(&rx, cmd);

        if let Some(path) = model {
            if tx.send(load_model(path)).is_err() {
                break; // UI disconnected
            }
        }
        if let Some(path) = env {
            if tx.send(load_environment(path)).is_err() {
                break;
            }
        }
        if stop {
            break;
        }
    }
}

fn load_model(path: PathBuf) -> WorkerResult {
    tracing::debug!("loading model {}", path.display());
    match scene::load_gltf(&path) {
        Ok(scene) => WorkerResult::ModelReady { path, scene },
        Err(e) => {
            tracing::error!("failed to load {}: {e}", path.display());
            WorkerResult::LoadFailed {
                path,
                error: e.to_string(),
            }
        }
    }
}

fn load_environment(path: PathBuf) -> WorkerResult {
    tracing::debug!("loading environment {}", path.display());
    match environment::decode(&path) {
        Ok(image) => WorkerResult::EnvironmentReady { path, image },
        Err(e) => {
            tracing::error!("failed to load {}: {e}", path.display());
            WorkerResult::LoadFailed {
                path,
                error: e.to_string(),
            }
        }
    }
}

/// Fold the first command plus everything queued behind it into the
/// newest request per kind.
fn drain_to_latest(
    rx: &Receiver<WorkerCommand>,
    first: WorkerCommand,
) -> (Option<PathBuf>, Option<PathBuf>, bool) {
    let mut model = None;
    let mut env = None;

    let mut absorb = |cmd: WorkerCommand| match cmd {
        WorkerCommand::LoadModel(p) => {
            model = Some(p);
            false
        }
        WorkerCommand::LoadEnvironment(p) => {
            env = Some(p);
            false
        }
        WorkerCommand::Stop => true,
    };

    if absorb(first) {
        return (model, env, true);
    }
    while let Ok(cmd) = rx.try_recv() {
        if absorb(cmd) {
            return (model, env, true);
        }
    }
    (model, env, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_reports_path() {
        let mut worker = WorkerHandle::spawn();
        worker.request_model(PathBuf::from("/nonexistent/pump.gltf"));

        let result = loop {
            if let Some(r) = worker.try_recv() {
                break r;
            }
            thread::yield_now();
        };

        match result {
            WorkerResult::LoadFailed { path, error } => {
                assert_eq!(path, PathBuf::from("/nonexistent/pump.gltf"));
                assert!(!error.is_empty());
            }
            _ => panic!("expected LoadFailed"),
        }
        worker.stop();
    }

    #[test]
    fn test_drain_keeps_newest_of_each_kind() {
        let (tx, rx) = channel();
        tx.send(WorkerCommand::LoadModel(PathBuf::from("b.gltf"))).unwrap();
        tx.send(WorkerCommand::LoadEnvironment(PathBuf::from("sky.hdr"))).unwrap();
        tx.send(WorkerCommand::LoadModel(PathBuf::from("c.gltf"))).unwrap();

        let (model, env, stop) =
            drain_to_latest(&rx, WorkerCommand::LoadModel(PathBuf::from("a.gltf")));
        assert_eq!(model, Some(PathBuf::from("c.gltf")));
        assert_eq!(env, Some(PathBuf::from("sky.hdr")));
        assert!(!stop);
    }

    #[test]
    fn test_drain_stops_at_stop() {
        let (tx, rx) = channel();
        tx.send(WorkerCommand::Stop).unwrap();
        tx.send(WorkerCommand::LoadModel(PathBuf::from("late.gltf"))).unwrap();

        let (model, _env, stop) =
            drain_to_latest(&rx, WorkerCommand::LoadModel(PathBuf::from("a.gltf")));
        // The queued command behind Stop is never absorbed.
        assert_eq!(model, Some(PathBuf::from("a.gltf")));
        assert!(stop);
    }
}
