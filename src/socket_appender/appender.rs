//! Public appender type exported by the crate.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use log::{debug, error, warn};
use parking_lot::{Mutex, RwLock};

use crate::{
    appender::{AppenderError, CallerDataProcessor, FemtoAppender, NoopPostProcessor, PostProcessor},
    executor::Executor,
    log_event::FemtoLogEvent,
};

use super::{
    builder::SocketAppenderBuilder,
    cancel::{CancelHandle, cancellation},
    config::{ConfigError, SocketAppenderConfig},
    dispatch::{DISPATCH_JOB_NAME, DispatchLoop, DispatchState, SharedEncoder, StateCell},
    queue::EventQueue,
    transport::{ConnectionSlot, SocketFactory},
};

/// How long `stop()` waits for the encoder lock and for the dispatch loop.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Socket appender carrying [`FemtoLogEvent`]s.
pub type FemtoLogAppender = FemtoSocketAppender<FemtoLogEvent, CallerDataProcessor>;

/// Resources owned by one started period of the appender.
struct Running {
    cancel: CancelHandle,
    slot: Arc<ConnectionSlot>,
    done: Receiver<()>,
}

/// Appender streaming events to a remote collector over TCP.
///
/// `append` only ever enqueues; a dispatch loop submitted to the configured
/// [`Executor`] owns the connection, reconnecting after the configured delay
/// whenever the peer goes away. Events arriving while the queue is full are
/// dropped and counted.
pub struct FemtoSocketAppender<E, P = NoopPostProcessor> {
    name: String,
    config: RwLock<SocketAppenderConfig>,
    encoder: Option<SharedEncoder<E>>,
    post_processor: Arc<P>,
    factory: Arc<dyn SocketFactory>,
    executor: Arc<dyn Executor>,
    warn_interval: Duration,
    started: Arc<AtomicBool>,
    lifecycle: Mutex<Option<Running>>,
    queue: RwLock<Option<Arc<EventQueue<E>>>>,
    /// Replaced on every start so a loop outliving `stop()` cannot report
    /// into its successor.
    state: RwLock<StateCell>,
}

impl<E: Send + 'static> FemtoSocketAppender<E> {
    pub fn builder() -> SocketAppenderBuilder<E> {
        SocketAppenderBuilder::new()
    }
}

impl<E, P> FemtoSocketAppender<E, P>
where
    E: Send + 'static,
    P: PostProcessor<E> + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        name: String,
        config: SocketAppenderConfig,
        encoder: Option<SharedEncoder<E>>,
        post_processor: Arc<P>,
        factory: Arc<dyn SocketFactory>,
        executor: Arc<dyn Executor>,
        warn_interval: Duration,
    ) -> Self {
        Self {
            name,
            config: RwLock::new(config),
            encoder,
            post_processor,
            factory,
            executor,
            warn_interval,
            started: Arc::new(AtomicBool::new(false)),
            lifecycle: Mutex::new(None),
            queue: RwLock::new(None),
            state: RwLock::new(StateCell::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> SocketAppenderConfig {
        self.config.read().clone()
    }

    /// Edit the configuration. Changes apply from the next `start()`.
    pub fn update_config(&self, update: impl FnOnce(&mut SocketAppenderConfig)) {
        update(&mut self.config.write());
    }

    pub fn state(&self) -> DispatchState {
        self.state.read().get()
    }

    /// Events dropped by the current (or most recent) queue.
    pub fn dropped_events(&self) -> u64 {
        self.queue.read().as_ref().map_or(0, |queue| queue.dropped())
    }

    /// Events buffered and not yet handed to the encoder.
    pub fn queued_events(&self) -> usize {
        self.queue.read().as_ref().map_or(0, |queue| queue.len())
    }

    fn spawn_dispatch(&self) -> Result<Running, AppenderError> {
        let target = self.config.read().resolve(self.encoder.is_some())?;
        let Some(encoder) = self.encoder.clone() else {
            return Err(AppenderError::InvalidConfig(vec![ConfigError::MissingEncoder]));
        };
        let queue = Arc::new(EventQueue::new(
            target.queue_capacity,
            self.warn_interval,
            self.name.clone(),
        ));
        let (cancel_handle, cancel) = cancellation();
        let slot = Arc::new(ConnectionSlot::default());
        let state = StateCell::default();
        let (done_tx, done_rx) = bounded::<()>(0);
        let dispatch = DispatchLoop {
            name: self.name.clone(),
            target,
            queue: Arc::clone(&queue),
            encoder,
            post_processor: Arc::clone(&self.post_processor),
            factory: Arc::clone(&self.factory),
            executor: Arc::clone(&self.executor),
            cancel,
            slot: Arc::clone(&slot),
            state: state.clone(),
            started: Arc::clone(&self.started),
        };
        *self.state.write() = state;
        *self.queue.write() = Some(queue);
        self.started.store(true, Ordering::Release);
        let submitted = self.executor.submit(
            DISPATCH_JOB_NAME,
            Box::new(move || {
                dispatch.run();
                drop(done_tx);
            }),
        );
        if let Err(err) = submitted {
            self.started.store(false, Ordering::Release);
            return Err(err.into());
        }
        Ok(Running {
            cancel: cancel_handle,
            slot,
            done: done_rx,
        })
    }
}

impl<E, P> FemtoSocketAppender<E, P> {
    /// Write the encoder footer on a live connection, cancel the loop, close
    /// the connection and wait briefly for the loop to exit.
    ///
    /// Footer and cancellation both happen under the encoder lock; the footer
    /// is the last write the connection sees.
    fn shutdown(&self, running: Running) {
        let guard = match &self.encoder {
            Some(encoder) => encoder.try_lock_for(STOP_TIMEOUT),
            None => None,
        };
        match guard {
            Some(mut encoder) => {
                if running.slot.is_live()
                    && let Err(err) = encoder.close()
                {
                    error!("Failed to close encoder for appender named [{}]: {err}", self.name);
                }
                running.cancel.cancel();
                running.slot.close();
            }
            None => {
                if self.encoder.is_some() {
                    warn!("{}: encoder busy; closing connection without footer", self.name);
                }
                running.cancel.cancel();
                running.slot.close();
            }
        }
        if let Err(RecvTimeoutError::Timeout) = running.done.recv_timeout(STOP_TIMEOUT) {
            debug!("{}: dispatch loop still running after {STOP_TIMEOUT:?}", self.name);
        }
    }
}

impl<E, P> FemtoAppender<E> for FemtoSocketAppender<E, P>
where
    E: Send + 'static,
    P: PostProcessor<E> + 'static,
{
    fn start(&self) -> Result<(), AppenderError> {
        let mut lifecycle = self.lifecycle.lock();
        if self.is_started() {
            return Ok(());
        }
        if let Some(stale) = lifecycle.take() {
            self.shutdown(stale);
        }
        match self.spawn_dispatch() {
            Ok(running) => {
                *lifecycle = Some(running);
                Ok(())
            }
            Err(err) => {
                report_start_failure(&self.name, &err);
                Err(err)
            }
        }
    }

    fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        self.started.store(false, Ordering::Release);
        if let Some(running) = lifecycle.take() {
            self.shutdown(running);
        }
    }

    fn append(&self, event: E) {
        if !self.is_started() {
            return;
        }
        if let Some(queue) = self.queue.read().as_ref() {
            queue.offer(event);
        }
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl<E, P> Drop for FemtoSocketAppender<E, P> {
    fn drop(&mut self) {
        self.started.store(false, Ordering::Release);
        if let Some(running) = self.lifecycle.get_mut().take() {
            self.shutdown(running);
        }
    }
}

fn report_start_failure(name: &str, err: &AppenderError) {
    match err {
        AppenderError::InvalidConfig(errors) => {
            for problem in errors {
                error!("{name}: {problem}");
            }
        }
        AppenderError::UnknownHost { host, source } => {
            error!("{name}: unknown host: {host}: {source}");
        }
        AppenderError::Rejected(rejected) => {
            error!("{name}: dispatch loop rejected: {rejected}");
        }
    }
}

impl<E, P> std::fmt::Debug for FemtoSocketAppender<E, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FemtoSocketAppender")
            .field("name", &self.name)
            .field("config", &*self.config.read())
            .field("state", &self.state.read().get())
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish()
    }
}
