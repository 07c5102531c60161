//! Signal handling for shutdown and content reload.
//!
//! SIGINT and SIGTERM request shutdown, SIGHUP requests a content reload. On
//! Windows only Ctrl+C is handled and always means shutdown.

use tokio::signal;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSignal {
    Shutdown,
    Reload,
}

/// Long-lived listener; create it once so repeated signals are not lost.
pub struct SignalListener {
    #[cfg(unix)]
    sigint: signal::unix::Signal,
    #[cfg(unix)]
    sigterm: signal::unix::Signal,
    #[cfg(unix)]
    sighup: signal::unix::Signal,
}

impl SignalListener {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        #[cfg(unix)]
        {
            use signal::unix::{signal, SignalKind};

            Ok(Self {
                sigint: signal(SignalKind::interrupt())?,
                sigterm: signal(SignalKind::terminate())?,
                sighup: signal(SignalKind::hangup())?,
            })
        }

        #[cfg(not(unix))]
        Ok(Self {})
    }

    /// Waits for the next signal of interest.
    pub async fn recv(&mut self) -> Result<ServerSignal, Box<dyn std::error::Error>> {
        #[cfg(unix)]
        let received = tokio::select! {
            _ = self.sigint.recv() => ServerSignal::Shutdown,
            _ = self.sigterm.recv() => ServerSignal::Shutdown,
            _ = self.sighup.recv() => ServerSignal::Reload,
        };

        #[cfg(not(unix))]
        let received = {
            signal::ctrl_c().await?;
            ServerSignal::Shutdown
        };

        match received {
            ServerSignal::Shutdown => {
                info!("📡 Received shutdown signal - initiating graceful shutdown")
            }
            ServerSignal::Reload => info!("📡 Received reload signal"),
        }
        Ok(received)
    }
}
