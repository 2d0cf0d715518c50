// Termination signal handling and deadline-bounded contexts.

use std::fmt;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

/// Creates a cancellable context that is cancelled once `timeout` elapses.
///
/// The returned guard cancels the context when dropped, which also releases the
/// timer task.
pub fn deadline(timeout: Duration) -> (CancellationToken, DropGuard) {
    let ctx = CancellationToken::new();
    let timer = ctx.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                debug!(
                    component = "shutdown",
                    event = "deadline_exceeded",
                    timeout_ms = timeout.as_millis() as u64,
                    "context deadline exceeded"
                );
                timer.cancel();
            }
            _ = timer.cancelled() => {}
        }
    });

    let guard = ctx.clone().drop_guard();
    (ctx, guard)
}

/// Termination signal received by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listens for interrupt and termination signals until stopped.
///
/// Listeners are registered eagerly by [`Signals::listen`], so registration errors
/// surface before anything else is started.
pub struct Signals {
    #[cfg(unix)]
    listeners: Option<(tokio::signal::unix::Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    listening: bool,
}

impl Signals {
    /// Starts listening for SIGINT and SIGTERM.
    #[cfg(unix)]
    pub fn listen() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let sigint = signal(SignalKind::interrupt())?;
        let sigterm = signal(SignalKind::terminate())?;

        debug!(component = "signals", event = "listen", "listening for termination signals");

        Ok(Self {
            listeners: Some((sigint, sigterm)),
        })
    }

    /// Starts listening for Ctrl-C.
    #[cfg(not(unix))]
    pub fn listen() -> std::io::Result<Self> {
        debug!(component = "signals", event = "listen", "listening for termination signals");
        Ok(Self { listening: true })
    }

    /// Waits for the next termination signal.
    ///
    /// Never resolves once [`Signals::stop`] has been called.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Signal {
        match self.listeners.as_mut() {
            Some((sigint, sigterm)) => tokio::select! {
                _ = sigint.recv() => Signal::Interrupt,
                _ = sigterm.recv() => Signal::Terminate,
            },
            None => std::future::pending().await,
        }
    }

    /// Waits for the next termination signal.
    ///
    /// Never resolves once [`Signals::stop`] has been called.
    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Signal {
        if self.listening && tokio::signal::ctrl_c().await.is_ok() {
            return Signal::Interrupt;
        }
        std::future::pending().await
    }

    /// Stops listening for signals.
    pub fn stop(&mut self) {
        #[cfg(unix)]
        let was_listening = self.listeners.take().is_some();
        #[cfg(not(unix))]
        let was_listening = std::mem::replace(&mut self.listening, false);

        if was_listening {
            debug!(component = "signals", event = "stop", "stopped listening for termination signals");
        }
    }
}
