// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background jobs.
//!
//! Blocking work (file probing, HTTP calls, image decoding) runs on a
//! spawned thread and reports back over a channel that the UI polls once per
//! frame. Each slot runs at most one job at a time. Results are tagged with
//! the generation they were started under, and anything from an older
//! generation is dropped when polled.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

struct Running {
    label: &'static str,
    started: Instant,
}

/// One kind of background work (e.g. "analyze frame").
pub struct JobSlot<T> {
    sender: Sender<(u64, T)>,
    receiver: Receiver<(u64, T)>,
    generation: u64,
    running: Option<Running>,
}

impl<T: Send + 'static> Default for JobSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> JobSlot<T> {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            generation: 0,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// How long the current job has been running.
    pub fn elapsed(&self) -> Option<Duration> {
        self.running.as_ref().map(|r| r.started.elapsed())
    }

    /// Start `work` on a new thread. Returns the job's generation, or `None`
    /// if a job is already in flight in this slot.
    pub fn start<F>(&mut self, label: &'static str, work: F) -> Option<u64>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if let Some(running) = &self.running {
            log::warn!("Not starting {}: {} is still in flight", label, running.label);
            return None;
        }

        self.generation += 1;
        let generation = self.generation;
        let sender = self.sender.clone();
        self.running = Some(Running {
            label,
            started: Instant::now(),
        });
        log::debug!("Starting {} (generation {})", label, generation);

        std::thread::spawn(move || {
            let result = work();
            // The slot may have been dropped with the app; nothing to do then
            let _ = sender.send((generation, result));
        });

        Some(generation)
    }

    /// Forget the in-flight job. Its eventual result will be discarded.
    pub fn invalidate(&mut self) {
        if let Some(running) = self.running.take() {
            log::debug!(
                "Abandoning {} (generation {}) after {:.1}s",
                running.label,
                self.generation,
                running.started.elapsed().as_secs_f32()
            );
        }
        self.generation += 1;
    }

    /// Return the current job's result if it has finished.
    pub fn poll(&mut self) -> Option<T> {
        loop {
            match self.receiver.try_recv() {
                Ok((generation, result)) if generation == self.generation => {
                    if let Some(running) = self.running.take() {
                        log::debug!(
                            "{} finished in {:.1}s",
                            running.label,
                            running.started.elapsed().as_secs_f32()
                        );
                    }
                    return Some(result);
                }
                Ok((generation, _)) => {
                    log::debug!("Dropping stale result from generation {}", generation);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }
}
