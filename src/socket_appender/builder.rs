//! Builder for [`FemtoSocketAppender`].
//!
//! The builder only collects options. Nothing is validated until
//! [`FemtoAppender::start`](crate::FemtoAppender::start), which reports every
//! configuration problem at once.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    appender::{NoopPostProcessor, PostProcessor},
    encoder::Encoder,
    executor::{Executor, ThreadExecutor},
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
};

use super::{
    appender::FemtoSocketAppender,
    config::SocketAppenderConfig,
    dispatch::SharedEncoder,
    transport::{SocketFactory, TcpSocketFactory},
};

/// Name given to appenders built without one.
pub const DEFAULT_APPENDER_NAME: &str = "socket";

macro_rules! config_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: i64) -> Self {
            self.config.$field = value;
            self
        }
    };
}

/// Collects options for a [`FemtoSocketAppender`].
pub struct SocketAppenderBuilder<E, P = NoopPostProcessor> {
    name: String,
    config: SocketAppenderConfig,
    encoder: Option<SharedEncoder<E>>,
    post_processor: P,
    factory: Option<Arc<dyn SocketFactory>>,
    executor: Option<Arc<dyn Executor>>,
    warn_interval: Duration,
    _event: PhantomData<fn(E)>,
}

impl<E: Send + 'static> SocketAppenderBuilder<E> {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_APPENDER_NAME.to_owned(),
            config: SocketAppenderConfig::default(),
            encoder: None,
            post_processor: NoopPostProcessor,
            factory: None,
            executor: None,
            warn_interval: DEFAULT_WARN_INTERVAL,
            _event: PhantomData,
        }
    }
}

impl<E: Send + 'static> Default for SocketAppenderBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, P> SocketAppenderBuilder<E, P>
where
    E: Send + 'static,
    P: PostProcessor<E> + 'static,
{
    /// Label used in diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_remote_host(mut self, host: impl Into<String>) -> Self {
        self.config.remote_host = Some(host.into());
        self
    }

    config_setter!(with_port, port);
    config_setter!(
        #[doc = "Milliseconds to wait between connection attempts."]
        with_reconnection_delay_ms,
        reconnection_delay_ms
    );
    config_setter!(
        #[doc = "Events buffered while the connection is busy or down. Zero hands each event straight to a waiting dispatch loop."]
        with_queue_size,
        queue_size
    );
    config_setter!(with_accept_connection_timeout_ms, accept_connection_timeout_ms);

    /// Replace every connection option at once, e.g. with one loaded from INI.
    pub fn with_config(mut self, config: SocketAppenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_encoder(mut self, encoder: impl Encoder<E> + 'static) -> Self {
        let encoder: Box<dyn Encoder<E>> = Box::new(encoder);
        self.encoder = Some(Arc::new(Mutex::new(encoder)));
        self
    }

    pub fn with_post_processor<Q>(self, post_processor: Q) -> SocketAppenderBuilder<E, Q>
    where
        Q: PostProcessor<E> + 'static,
    {
        SocketAppenderBuilder {
            name: self.name,
            config: self.config,
            encoder: self.encoder,
            post_processor,
            factory: self.factory,
            executor: self.executor,
            warn_interval: self.warn_interval,
            _event: PhantomData,
        }
    }

    pub fn with_socket_factory(mut self, factory: Arc<dyn SocketFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Minimum time between queue-overflow warnings.
    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.warn_interval = interval;
        self
    }

    pub fn build(self) -> FemtoSocketAppender<E, P> {
        let factory: Arc<dyn SocketFactory> = match self.factory {
            Some(factory) => factory,
            None => Arc::new(TcpSocketFactory),
        };
        let executor: Arc<dyn Executor> = match self.executor {
            Some(executor) => executor,
            None => Arc::new(ThreadExecutor::new()),
        };
        FemtoSocketAppender::from_parts(
            self.name,
            self.config,
            self.encoder,
            Arc::new(self.post_processor),
            factory,
            executor,
            self.warn_interval,
        )
    }
}

impl<E, P: std::fmt::Debug> std::fmt::Debug for SocketAppenderBuilder<E, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketAppenderBuilder")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("has_encoder", &self.encoder.is_some())
            .field("post_processor", &self.post_processor)
            .field("warn_interval", &self.warn_interval)
            .finish()
    }
}
