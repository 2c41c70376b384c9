use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use weather_core::{BitmapRenderer, Config, WeatherService, provider_from_config};
use weather_server::{AppState, routes::create_router};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the dashboard (the default).
    Serve {
        /// Address to bind; overrides config and `HOST`.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind; overrides config and `PORT`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Store the OpenWeather API key and listen port in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Serve {
            host: None,
            port: None,
        }) {
            Command::Serve { host, port } => serve(host, port).await,
            Command::Configure => configure(),
        }
    }
}

async fn serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.apply_env_overrides()?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let provider = provider_from_config(&config.openweather)
        .context("Failed to create weather provider")?;
    let renderer = BitmapRenderer::new(config.charts.font_path.as_deref());
    if renderer.font().is_none() {
        warn!("No chart font found; set CHART_FONT to enable chart images");
    }

    let service = WeatherService::new(Arc::from(provider), Arc::new(renderer));
    let app = create_router(AppState::new(service)).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local: SocketAddr = listener.local_addr()?;
    info!(%local, "Weather dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. A signal that cannot be installed never
/// resolves, so the server keeps running instead of stopping right away.
async fn wait_for_shutdown(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!(error = %e, "Failed to listen for shutdown signal; running until killed");
        std::future::pending::<()>().await;
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    if api_key.trim().is_empty() {
        bail!("API key cannot be empty");
    }
    config.set_api_key(api_key);

    config.server.port = CustomType::<u16>::new("Port to listen on:")
        .with_default(config.server.port)
        .with_error_message("Please enter a valid port number")
        .prompt()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn received_signal_shuts_down() {
        let done = tokio::time::timeout(
            Duration::from_millis(100),
            wait_for_shutdown(async { Ok(()) }),
        )
        .await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn failed_signal_handler_keeps_serving() {
        let done = tokio::time::timeout(
            Duration::from_millis(100),
            wait_for_shutdown(async { Err(std::io::Error::other("no signal handler")) }),
        )
        .await;
        assert!(done.is_err(), "shutdown must not trigger when the handler fails");
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["weather-dashboard"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["weather-dashboard", "serve", "--port", "8080"]);
        assert!(matches!(
            cli.command,
            Some(Command::Serve { port: Some(8080), .. })
        ));
    }
}
