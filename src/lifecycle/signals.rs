//! OS signal handling.
//!
//! SIGTERM and SIGINT end the process gracefully. On Windows only Ctrl+C
//! is available.

use std::fmt;
use std::future::Future;
use std::io;

/// The signal that requested termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Install SIGINT and SIGTERM handlers and return a future resolving on
/// the first one received.
///
/// Handlers are active once this returns, so a signal arriving before the
/// future is first polled is not lost. Must be called inside a runtime.
#[cfg(unix)]
pub fn terminate() -> io::Result<impl Future<Output = Signal> + Send + 'static> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => Signal::Interrupt,
            _ = term.recv() => Signal::Terminate,
        }
    })
}

#[cfg(windows)]
pub fn terminate() -> io::Result<impl Future<Output = Signal> + Send + 'static> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;
    Ok(async move {
        ctrl_c.recv().await;
        Signal::Interrupt
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::Interrupt.to_string(), "SIGINT");
        assert_eq!(Signal::Terminate.to_string(), "SIGTERM");
    }

    #[tokio::test]
    async fn test_terminate_installs_and_waits() {
        let pending = terminate().unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_millis(50), pending).await;
        assert!(result.is_err());
    }
}
