//! Daemon orchestration — server assembly, signal handling, shutdown.
//!
//! The [`Orchestrator`] builds the syslog server from validated
//! configuration, runs it until a shutdown signal arrives, and performs
//! the graceful stop sequence: stop accepting new work, give in-flight
//! frames a short grace period, close sockets, flush writers.

use anyhow::Result;
use tracing::info;

use logwell_core::config::LogwellConfig;
use logwell_core::pipeline::Pipeline;
use logwell_syslog::server::{SyslogServer, SyslogServerBuilder};

/// The daemon orchestrator.
pub struct Orchestrator {
    server: SyslogServer,
}

impl Orchestrator {
    /// Build the orchestrator from an already-validated configuration.
    pub fn build(config: LogwellConfig) -> Result<Self> {
        let server = SyslogServerBuilder::new()
            .config(config.syslog)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build syslog server: {}", e))?;
        Ok(Self { server })
    }

    /// Start the server and block until a shutdown signal is received.
    ///
    /// Returns an error on bind or TLS-material failure, which the caller
    /// turns into a non-zero process exit.
    pub async fn run(&mut self) -> Result<()> {
        self.server
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start syslog server: {}", e))?;

        info!("logwell-daemon running");
        let signal = wait_for_shutdown_signal().await?;
        info!(signal = signal, "shutdown signal received");

        self.server
            .stop()
            .await
            .map_err(|e| anyhow::anyhow!("failed to stop syslog server: {}", e))?;

        info!("logwell-daemon shut down");
        Ok(())
    }

    /// Access the underlying server (used by tests).
    pub fn server(&self) -> &SyslogServer {
        &self.server
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
