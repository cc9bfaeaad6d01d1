//! Background batch worker
//!
//! Drains the bounded event queue into a [`BatchAssembler`] and uploads a
//! batch when it fills up, when the batch interval elapses, or when a flush
//! is requested. Upload errors are parked in a shared slot for the write
//! path to report; nothing is retried.

use super::batch::{Batch, BatchAssembler, BatchLimits};
use super::event::LogEvent;
use super::uploader::Uploader;
use crate::core::{FlushReason, LoggerError, Result, UploadMetrics};
use crossbeam_channel::{bounded, select, tick, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Capacity of the queue between the write path and the worker
pub const QUEUE_CAPACITY: usize = 10_000;

pub(crate) enum Command {
    Event(LogEvent),
    Flush(Sender<()>),
}

/// Last failed upload, reported once by the next write
pub(crate) type ErrorSlot = Arc<Mutex<Option<LoggerError>>>;

pub(crate) struct BatchWorker {
    sender: Option<Sender<Command>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl BatchWorker {
    pub(crate) fn spawn(
        interval: Duration,
        limits: BatchLimits,
        uploader: Arc<Uploader>,
        last_error: ErrorSlot,
        metrics: Arc<UploadMetrics>,
    ) -> Result<Self> {
        let (sender, receiver) = bounded(QUEUE_CAPACITY);

        let handle = thread::Builder::new()
            .name("cloudwatch-batch".to_string())
            .spawn(move || {
                let mut worker = WorkerLoop {
                    receiver,
                    assembler: BatchAssembler::new(limits),
                    uploader,
                    last_error,
                    metrics,
                };
                worker.run(interval);
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue an event, blocking while the queue is full
    pub(crate) fn send(&self, event: LogEvent) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(LoggerError::HookStopped)?;
        sender
            .send(Command::Event(event))
            .map_err(|_| LoggerError::ChannelSendError)
    }

    /// Upload everything queued so far and wait for the worker to confirm
    ///
    /// Returns `false` if the worker did not confirm within `timeout`.
    pub(crate) fn flush(&self, timeout: Duration) -> Result<bool> {
        let sender = self.sender.as_ref().ok_or(LoggerError::HookStopped)?;
        let (ack_tx, ack_rx) = bounded(1);
        sender
            .send(Command::Flush(ack_tx))
            .map_err(|_| LoggerError::ChannelSendError)?;

        match ack_rx.recv_timeout(timeout) {
            Ok(()) => Ok(true),
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(LoggerError::HookStopped),
        }
    }

    /// Close the queue and wait for the worker to upload what is left
    ///
    /// Returns `true` if the worker finished within `timeout`.
    pub(crate) fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[LOGGER ERROR] CloudWatch batch worker panicked: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] CloudWatch batch worker did not finish within {:?}. \
                     Queued events may be lost.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.sender.is_some()
    }
}

struct WorkerLoop {
    receiver: Receiver<Command>,
    assembler: BatchAssembler,
    uploader: Arc<Uploader>,
    last_error: ErrorSlot,
    metrics: Arc<UploadMetrics>,
}

impl WorkerLoop {
    fn run(&mut self, interval: Duration) {
        let ticker = tick(interval);
        let receiver = self.receiver.clone();
        let mut open = true;

        while open {
            select! {
                recv(receiver) -> command => match command {
                    Ok(Command::Event(event)) => {
                        if let Some(batch) = self.assembler.push(event) {
                            self.send(batch, FlushReason::Full);
                        }
                    }
                    Ok(Command::Flush(ack)) => {
                        let batch = self.assembler.take();
                        self.send(batch, FlushReason::Requested);
                        let _ = ack.send(());
                    }
                    Err(_) => {
                        // Queue closed: everything sent before the close has
                        // already been received
                        let batch = self.assembler.take();
                        self.send(batch, FlushReason::Shutdown);
                        open = false;
                    }
                },
                recv(ticker) -> _ => {
                    let batch = self.assembler.take();
                    self.send(batch, FlushReason::Timer);
                }
            }
        }
    }

    fn send(&self, batch: Batch, reason: FlushReason) {
        if batch.is_empty() {
            return;
        }
        self.metrics.record_flush(reason);

        if let Err(e) = self.uploader.put_log_events(batch.into_events()) {
            *self.last_error.lock() = Some(e);
        }
    }
}
