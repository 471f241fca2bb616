//! Analysis lifecycle: configuration upload and live count polling
//!
//! `Configuring -> Running -> Configuring`. Starting validates the session,
//! uploads the media and zones, then spawns a fixed-interval poll. The poll
//! lives in a [`PollHandle`] that aborts it when dropped, so stopping the
//! analysis or dropping the controller always ends polling.
//!
//! Every poll request takes a sequence number before it is sent. Responses
//! come back through a channel tagged with that number and stale ones are
//! dropped when applied.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use super::state::{Phase, Session};
use crate::domain::LiveCounts;
use crate::engine::Engine;

pub const VALIDATION_MESSAGE: &str =
    "Por favor, cargue un video y dibuje al menos una línea o zona.";
pub const CONNECTION_MESSAGE: &str = "Error de conexión con el motor de IA.";

/// Recoverable failures of the analysis lifecycle
#[derive(Debug)]
pub enum SessionError {
    /// No media loaded or no zones drawn
    Validation,
    /// Engine unreachable or rejected the configuration
    Connection(anyhow::Error),
    AlreadyRunning,
    NotRunning,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => f.write_str(VALIDATION_MESSAGE),
            Self::Connection(_) => f.write_str(CONNECTION_MESSAGE),
            Self::AlreadyRunning => f.write_str("El análisis ya está en curso."),
            Self::NotRunning => f.write_str("No hay un análisis en curso."),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connection(err) => Some(&**err),
            _ => None,
        }
    }
}

/// One poll response
#[derive(Debug, Clone)]
pub struct CountsUpdate {
    pub seq: u64,
    pub counts: LiveCounts,
}

/// Running poll loop; aborted on drop
#[derive(Debug)]
pub struct PollHandle(JoinHandle<()>);

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Poll `engine` every `period`, first request one period after the call
///
/// Requests run concurrently so a slow response never delays the next tick.
/// Failures are logged and skipped. The loop ends by itself once the
/// receiving side of `tx` is gone.
fn spawn_poll<E: Engine>(
    engine: E,
    period: Duration,
    seq: Arc<AtomicU64>,
    tx: UnboundedSender<CountsUpdate>,
) -> PollHandle {
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        let mut fetches = JoinSet::new();
        while !tx.is_closed() {
            ticker.tick().await;
            while fetches.try_join_next().is_some() {}

            let seq = seq.fetch_add(1, Ordering::Relaxed);
            let engine = engine.clone();
            let tx = tx.clone();
            fetches.spawn(async move {
                match engine.fetch_counts().await {
                    Ok(counts) => {
                        let _ = tx.send(CountsUpdate { seq, counts });
                    }
                    Err(err) => log::warn!("Counts poll #{} failed: {:#}", seq, err),
                }
            });
        }
        log::debug!("Counts receiver closed, poll loop exiting");
    });
    PollHandle(handle)
}

/// Drives an analysis against an engine
pub struct AnalysisController<E: Engine> {
    engine: E,
    interval: Duration,
    /// Shared across runs so responses from an earlier run are always older
    seq: Arc<AtomicU64>,
    /// First sequence number of the current run
    run_floor: u64,
    tx: UnboundedSender<CountsUpdate>,
    poll: Option<PollHandle>,
}

impl<E: Engine> AnalysisController<E> {
    pub fn new(engine: E, interval: Duration) -> (Self, UnboundedReceiver<CountsUpdate>) {
        let (tx, rx) = unbounded_channel();
        let controller = Self {
            engine,
            interval,
            seq: Arc::new(AtomicU64::new(0)),
            run_floor: 0,
            tx,
            poll: None,
        };
        (controller, rx)
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Leave `Configuring`: upload the configuration and start polling
    ///
    /// On any error the session is left untouched.
    pub async fn start(&mut self, session: &mut Session) -> Result<(), SessionError> {
        if session.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        let Some(media) = session.media.as_ref().map(|m| m.path.clone()) else {
            return Err(SessionError::Validation);
        };
        if session.zones.is_empty() {
            return Err(SessionError::Validation);
        }

        self.engine
            .upload_config(&media, session.zones.as_slice())
            .await
            .map_err(|err| {
                log::error!("Configuration upload failed: {:#}", err);
                SessionError::Connection(err)
            })?;

        let feed_url = self.engine.feed_url();
        log::info!(
            "Analysis running with {} zones, feed at {}",
            session.zones.len(),
            feed_url
        );
        session.drawing.discard();
        session.counts.clear_counts();
        session.phase = Phase::Running { feed_url };
        self.run_floor = self.seq.load(Ordering::Relaxed);
        self.poll = Some(spawn_poll(
            self.engine.clone(),
            self.interval,
            self.seq.clone(),
            self.tx.clone(),
        ));
        Ok(())
    }

    /// Return to `Configuring`, ending the poll
    pub fn stop(&mut self, session: &mut Session) -> Result<(), SessionError> {
        if !session.is_running() {
            return Err(SessionError::NotRunning);
        }
        self.poll = None;
        session.phase = Phase::Configuring;
        log::info!("Analysis stopped");
        Ok(())
    }

    /// Apply a poll response; false when it is stale or no analysis runs
    pub fn apply(&self, session: &mut Session, update: CountsUpdate) -> bool {
        if !session.is_running() {
            log::debug!("Ignoring counts #{} outside a running analysis", update.seq);
            return false;
        }
        if update.seq < self.run_floor {
            log::debug!("Ignoring counts #{} from a previous run", update.seq);
            return false;
        }
        session.counts.apply(update.seq, update.counts)
    }
}
