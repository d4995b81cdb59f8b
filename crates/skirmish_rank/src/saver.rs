//! # Background Rank Saver
//!
//! Moves rank file writes off the game thread.
//!
//! ## Architecture
//!
//! ```text
//! Game Thread                      Saver Thread
//! ┌─────────────────┐              ┌──────────────────┐
//! │ store.encode()  │──SaveJob────►│ write tmp        │
//! │ (under &store)  │  (channel)   │ fsync + rename   │
//! └─────────────────┘              │ update stats     │
//!                                  └──────────────────┘
//! ```
//!
//! The snapshot is taken while the caller holds the store, so the writer
//! never touches `RankStore` itself. Dropping the saver drains queued
//! jobs before the thread exits.

use crate::error::{RankError, RankResult};
use crate::format;
use crate::store::RankStore;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// One queued write.
#[derive(Debug)]
struct SaveJob {
    path: PathBuf,
    bytes: Vec<u8>,
}

/// Saver statistics.
#[derive(Clone, Debug, Default)]
pub struct SaverStats {
    /// Files written successfully.
    pub saves_completed: u64,
    /// Writes that failed.
    pub saves_failed: u64,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Total time spent writing in microseconds.
    pub total_write_us: u64,
    /// Most recent failure.
    pub last_error: Option<RankError>,
}

/// Background writer for rank snapshots.
pub struct RankSaver {
    sender: Option<Sender<SaveJob>>,
    stats: Arc<Mutex<SaverStats>>,
    writer_handle: Option<JoinHandle<()>>,
}

impl RankSaver {
    /// Starts the writer thread.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn spawn() -> RankResult<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let stats = Arc::new(Mutex::new(SaverStats::default()));

        let writer_stats = Arc::clone(&stats);
        let writer_handle = thread::Builder::new()
            .name("rank-saver".into())
            .spawn(move || Self::writer_loop(&receiver, &writer_stats))
            .map_err(|e| RankError::Io(e.to_string()))?;

        Ok(Self {
            sender: Some(sender),
            stats,
            writer_handle: Some(writer_handle),
        })
    }

    fn writer_loop(receiver: &Receiver<SaveJob>, stats: &Mutex<SaverStats>) {
        for job in receiver {
            let start = Instant::now();
            let result = format::write_atomic(&job.path, &job.bytes);
            let elapsed = start.elapsed();

            let mut s = stats.lock();
            s.total_write_us += elapsed.as_micros() as u64;
            match result {
                Ok(()) => {
                    s.saves_completed += 1;
                    s.bytes_written += job.bytes.len() as u64;
                    tracing::debug!("rank snapshot written to {}", job.path.display());
                }
                Err(e) => {
                    s.saves_failed += 1;
                    tracing::warn!("rank snapshot failed: {}", e);
                    s.last_error = Some(e);
                }
            }
        }
    }

    /// Snapshots `store` and queues it for writing to `path`.
    ///
    /// # Errors
    ///
    /// Returns `SaverClosed` if the writer thread has exited.
    pub fn submit(&self, store: &RankStore, path: impl AsRef<Path>) -> RankResult<()> {
        let job = SaveJob {
            path: path.as_ref().to_path_buf(),
            bytes: store.encode(),
        };
        self.sender
            .as_ref()
            .ok_or(RankError::SaverClosed)?
            .send(job)
            .map_err(|_| RankError::SaverClosed)
    }

    /// Returns current statistics.
    #[must_use]
    pub fn stats(&self) -> SaverStats {
        self.stats.lock().clone()
    }

    /// Drains queued jobs, stops the thread, and returns final statistics.
    #[must_use]
    pub fn shutdown(mut self) -> SaverStats {
        self.stop();
        self.stats()
    }

    fn stop(&mut self) {
        // Closing the channel ends the writer's receive loop.
        self.sender.take();
        if let Some(handle) = self.writer_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RankSaver {
    fn drop(&mut self) {
        self.stop();
    }
}
