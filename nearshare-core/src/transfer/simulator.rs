//! Transfer Simulator
//!
//! Runs one task per session. Every state change happens under the sessions
//! write lock after re-checking the session status, so a cancelled session
//! never moves again.

use super::events::TransferEvent;
use super::{TransferConfig, TransferSession, TransferStatus};
use crate::delay::{DelaySource, RandomDelays};
use crate::item::ShareableItem;
use crate::selection::SelectionState;
use crate::{Result, SimError, SimulatedDevice};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capacity of the transfer event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

type Sessions = Arc<RwLock<HashMap<String, TransferSession>>>;

type Tasks = Arc<Mutex<HashMap<String, JoinHandle<()>>>>;

/// Simulates transfers to simulated devices
pub struct TransferSimulator {
    config: TransferConfig,

    delays: Arc<dyn DelaySource>,

    /// All sessions, finished ones included until `remove_finished`
    sessions: Sessions,

    /// Tasks of unfinished sessions (session_id -> task)
    tasks: Tasks,

    /// Selection cleared when a session completes
    selection: Option<Arc<RwLock<SelectionState>>>,

    event_tx: broadcast::Sender<TransferEvent>,
}

impl Default for TransferSimulator {
    fn default() -> Self {
        Self::new(TransferConfig::default())
    }
}

impl TransferSimulator {
    /// Create a simulator with random timing
    pub fn new(config: TransferConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            config,
            delays: Arc::new(RandomDelays),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            selection: None,
            event_tx,
        }
    }

    /// Replace the delay source
    pub fn with_delays(mut self, delays: Arc<dyn DelaySource>) -> Self {
        self.delays = delays;
        self
    }

    /// Clear `selection` whenever a session completes
    pub fn with_selection(mut self, selection: Arc<RwLock<SelectionState>>) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Subscribe to transfer events
    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.event_tx.subscribe()
    }

    /// Start sending `payload` to `device`
    ///
    /// Returns the new session id. Fails with `EmptyPayload` if nothing is
    /// being sent.
    pub async fn start_transfer(
        &self,
        device: SimulatedDevice,
        payload: Vec<ShareableItem>,
    ) -> Result<String> {
        if payload.is_empty() {
            return Err(SimError::EmptyPayload);
        }

        let session_id = Uuid::new_v4().to_string();
        let session = TransferSession::new(session_id.clone(), device, payload);

        info!(
            "Starting transfer {} of {} item(s), {} bytes to {}",
            session_id,
            session.items.len(),
            session.total_bytes(),
            session.device.name
        );

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session);
        let _ = self.event_tx.send(TransferEvent::StatusChanged {
            session_id: session_id.clone(),
            status: TransferStatus::Preparing,
        });

        // Held across the spawn so a session that finishes at once cannot
        // release its handle before it is stored
        let mut tasks = self.tasks.lock().await;
        let task = tokio::spawn(run_session(
            session_id.clone(),
            self.sessions.clone(),
            self.tasks.clone(),
            self.selection.clone(),
            self.delays.clone(),
            self.config.clone(),
            self.event_tx.clone(),
        ));
        tasks.insert(session_id.clone(), task);
        drop(tasks);

        Ok(session_id)
    }

    /// Cancel a running session
    ///
    /// No progress update lands after this returns.
    pub async fn cancel_transfer(&self, session_id: &str) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| SimError::SessionNotFound(session_id.to_string()))?;

            if session.status.is_terminal() {
                return Err(SimError::invalid_state(format!(
                    "transfer {} already {}",
                    session_id, session.status
                )));
            }

            session.set_status(TransferStatus::Cancelled);
            info!(
                "Cancelled transfer {} at {}%",
                session_id, session.progress
            );
            let _ = self.event_tx.send(TransferEvent::StatusChanged {
                session_id: session_id.to_string(),
                status: TransferStatus::Cancelled,
            });
            let _ = self.event_tx.send(TransferEvent::Cancelled {
                session_id: session_id.to_string(),
            });
        }

        if let Some(task) = self.tasks.lock().await.remove(session_id) {
            task.abort();
        }

        Ok(())
    }

    /// Wait for a session's task to finish and return its final state
    pub async fn wait(&self, session_id: &str) -> Result<TransferSession> {
        let task = self.tasks.lock().await.remove(session_id);
        if let Some(task) = task {
            let _ = task.await;
        }
        self.session(session_id)
            .await
            .ok_or_else(|| SimError::SessionNotFound(session_id.to_string()))
    }

    /// Snapshot of one session
    pub async fn session(&self, session_id: &str) -> Option<TransferSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Snapshot of all sessions, oldest first
    pub async fn sessions(&self) -> Vec<TransferSession> {
        let mut sessions: Vec<TransferSession> =
            self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    /// Number of sessions that have not finished
    pub async fn active_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| !s.status.is_terminal())
            .count()
    }

    /// Number of session tasks still held
    pub(crate) async fn tracked_tasks(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Discard finished sessions; returns how many were removed
    pub async fn remove_finished(&self) -> usize {
        let finished: Vec<String> = {
            let mut sessions = self.sessions.write().await;
            let finished: Vec<String> = sessions
                .values()
                .filter(|s| s.status.is_terminal())
                .map(|s| s.id.clone())
                .collect();
            for id in &finished {
                sessions.remove(id);
            }
            finished
        };

        let mut tasks = self.tasks.lock().await;
        for id in &finished {
            tasks.remove(id);
        }

        debug!("Removed {} finished transfers", finished.len());
        finished.len()
    }
}

impl Drop for TransferSimulator {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.try_lock() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }
}

/// Move a session from `from` to `to`; false if it is no longer in `from`
async fn transition(
    sessions: &Sessions,
    session_id: &str,
    from: TransferStatus,
    to: TransferStatus,
    event_tx: &broadcast::Sender<TransferEvent>,
) -> bool {
    let mut sessions = sessions.write().await;
    match sessions.get_mut(session_id) {
        Some(session) if session.status == from => {
            session.set_status(to);
            debug!("Transfer {} is {}", session_id, to);
            let _ = event_tx.send(TransferEvent::StatusChanged {
                session_id: session_id.to_string(),
                status: to,
            });
            true
        }
        _ => false,
    }
}

/// Forget the task of a session that reached a terminal status
async fn release_task(tasks: &Tasks, session_id: &str) {
    if tasks.lock().await.remove(session_id).is_some() {
        debug!("Released task of transfer {}", session_id);
    }
}

async fn run_session(
    session_id: String,
    sessions: Sessions,
    tasks: Tasks,
    selection: Option<Arc<RwLock<SelectionState>>>,
    delays: Arc<dyn DelaySource>,
    config: TransferConfig,
    event_tx: broadcast::Sender<TransferEvent>,
) {
    sleep(delays.connect_delay(config.connect_delay_min, config.connect_delay_max)).await;
    if !transition(
        &sessions,
        &session_id,
        TransferStatus::Preparing,
        TransferStatus::Connecting,
        &event_tx,
    )
    .await
    {
        return;
    }

    sleep(delays.tick_interval(config.tick_min, config.tick_max)).await;
    {
        let mut guard = sessions.write().await;
        let Some(session) = guard.get_mut(&session_id) else {
            return;
        };
        if session.status != TransferStatus::Connecting {
            return;
        }
        if !session.device.status.is_reachable() {
            let reason = format!("{} is offline", session.device.name);
            warn!("Transfer {} failed: {}", session_id, reason);
            session.fail(reason.clone());
            let _ = event_tx.send(TransferEvent::StatusChanged {
                session_id: session_id.clone(),
                status: TransferStatus::Failed,
            });
            let _ = event_tx.send(TransferEvent::Failed {
                session_id: session_id.clone(),
                reason,
            });
            drop(guard);
            release_task(&tasks, &session_id).await;
            return;
        }
    }

    if !transition(
        &sessions,
        &session_id,
        TransferStatus::Connecting,
        TransferStatus::Transferring,
        &event_tx,
    )
    .await
    {
        return;
    }

    loop {
        sleep(delays.tick_interval(config.tick_min, config.tick_max)).await;

        let mut guard = sessions.write().await;
        let Some(session) = guard.get_mut(&session_id) else {
            return;
        };
        if session.status != TransferStatus::Transferring {
            return;
        }

        let step = delays.progress_step(config.max_step_for(&session.device));
        let progress = session.advance(step);
        let _ = event_tx.send(TransferEvent::Progress {
            session_id: session_id.clone(),
            progress,
        });

        if progress < 100 {
            continue;
        }

        session.set_status(TransferStatus::Completed);
        let device_id = session.device.id.clone();
        info!(
            "Transfer {} completed in {:?}",
            session_id,
            session.elapsed()
        );
        let _ = event_tx.send(TransferEvent::StatusChanged {
            session_id: session_id.clone(),
            status: TransferStatus::Completed,
        });
        let _ = event_tx.send(TransferEvent::Completed {
            session_id: session_id.clone(),
            device_id,
        });
        drop(guard);

        if let Some(selection) = selection {
            selection.write().await.clear();
            debug!("Cleared selection after transfer {}", session_id);
        }
        release_task(&tasks, &session_id).await;
        return;
    }
}
