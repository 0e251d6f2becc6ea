use anyhow::Result;
use clap::Parser;

use logwell_core::config::LogwellConfig;
use logwell_daemon::cli::DaemonCli;
use logwell_daemon::logging;
use logwell_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // Configuration precedence: defaults < file < environment < CLI flags
    let mut config = LogwellConfig::load(&cli.config)
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    config
        .apply_env_overrides()
        .map_err(|e| anyhow::anyhow!("failed to apply environment overrides: {}", e))?;
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if cli.validate {
        println!("configuration OK");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    tracing::info!(
        udp_port = config.syslog.udp_port,
        udp_enabled = config.syslog.enable_udp,
        tls_port = config.syslog.tls_port,
        tls_enabled = config.syslog.enable_tls,
        log_dir = %config.syslog.log_dir,
        "logwell-daemon starting"
    );

    let mut orchestrator = Orchestrator::build(config)?;
    orchestrator.run().await
}
