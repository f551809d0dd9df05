//! Read session runner
//!
//! Synchronous bounded reads block the caller and leave the session
//! externally idle. Background reading spawns exactly one task that
//! polls the driver under the active plan and feeds a bounded channel;
//! stopping signals the task between searches (a dispatched search
//! always completes), joins it, and drains whatever was still in
//! flight - after `stop_reading` returns there is no path left for a
//! record to arrive on.

use std::sync::Arc;
use std::time::Duration;

use tag_protocol::TagReadRecord;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::ReaderSession;

/// Capacity of the delivery channel between the background task and the
/// consumer
pub const DELIVERY_BUFFER: usize = 64;

/// Read-session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadState {
    /// No background read has run
    #[default]
    Idle,
    /// A background read is delivering records
    Reading,
    /// The background read was stopped; terminal
    Stopped,
}

/// Live background read: a bounded stream of records plus the handles
/// needed to wind it down
///
/// Obtain with [`ReaderSession::start_reading`], consume with
/// [`ReadStream::recv`], and always hand it back to
/// [`ReaderSession::stop_reading`].
pub struct ReadStream {
    rx: mpsc::Receiver<TagReadRecord>,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<Result<(), tag_protocol::DriverError>>,
}

impl ReadStream {
    /// Receive the next record; `None` once the stream has ended
    pub async fn recv(&mut self) -> Option<TagReadRecord> {
        self.rx.recv().await
    }
}

impl ReaderSession {
    /// Search for tags under the active plan for up to `duration`,
    /// blocking the caller; the session stays externally idle
    pub async fn read_for(
        &mut self,
        duration: Duration,
    ) -> Result<Vec<TagReadRecord>, SessionError> {
        if self.state == ReadState::Reading {
            return Err(SessionError::State(
                "synchronous read while a background read is active",
            ));
        }
        if self.active_plan.is_none() {
            return Err(SessionError::State("no read plan applied"));
        }
        Ok(self.driver.read(duration).await?)
    }

    /// Start background reading under the active plan
    ///
    /// Every record is delivered exactly once, in arrival order, to the
    /// returned stream. Each `start_reading` must be paired with exactly
    /// one [`ReaderSession::stop_reading`].
    pub async fn start_reading(&mut self) -> Result<ReadStream, SessionError> {
        match self.state {
            ReadState::Idle => {}
            ReadState::Reading => {
                return Err(SessionError::State("background read already running"))
            }
            ReadState::Stopped => {
                return Err(SessionError::State("read session already stopped"))
            }
        }
        let plan = self
            .active_plan
            .clone()
            .ok_or(SessionError::State("no read plan applied"))?;

        let driver = Arc::clone(&self.driver);
        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let search_timeout = plan.timeout();

        let task = tokio::spawn(async move {
            loop {
                // Stop is checked between searches only: a search
                // already dispatched to the device runs to completion
                match stop_rx.try_recv() {
                    Err(oneshot::error::TryRecvError::Empty) => {}
                    _ => break,
                }
                let records = driver.read(search_timeout).await?;
                for record in records {
                    if tx.send(record).await.is_err() {
                        // Consumer went away; nothing left to deliver to
                        return Ok(());
                    }
                }
            }
            Ok(())
        });

        self.state = ReadState::Reading;
        debug!("{}: background read started", self.label);
        Ok(ReadStream { rx, stop_tx, task })
    }

    /// Stop background reading
    ///
    /// Blocks until the in-flight search completes and delivery has
    /// drained, then returns the records that were produced but not yet
    /// consumed through [`ReadStream::recv`]. After this returns no
    /// further records can arrive anywhere.
    pub async fn stop_reading(
        &mut self,
        stream: ReadStream,
    ) -> Result<Vec<TagReadRecord>, SessionError> {
        if self.state != ReadState::Reading {
            return Err(SessionError::State("no background read to stop"));
        }
        let ReadStream {
            mut rx,
            stop_tx,
            task,
        } = stream;

        let _ = stop_tx.send(());

        // Drain while the task winds down so a full channel can never
        // wedge the join below
        let mut drained = Vec::new();
        while let Some(record) = rx.recv().await {
            drained.push(record);
        }

        let task_result = task.await;
        self.state = ReadState::Stopped;

        match task_result {
            Ok(Ok(())) => {
                debug!(
                    "{}: background read stopped, {} undelivered record(s)",
                    self.label,
                    drained.len()
                );
                Ok(drained)
            }
            Ok(Err(e)) => {
                warn!("{}: background read failed: {}", self.label, e);
                Err(e.into())
            }
            Err(_) => Err(SessionError::State("background read task panicked")),
        }
    }
}
