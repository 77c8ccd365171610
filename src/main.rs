use anyhow::{Context, Result};
use clap::Parser;
use picom::{
    create_router, AppState, Config, LoopbackConnector, NatsConnector, PiComService,
    ServiceOptions, Transport, VirtualPanel, VoiceConnector,
};
use std::sync::Arc;
use tracing::{error, info};

const BUTTON_BUFFER: usize = 32;

/// Push-to-talk intercom bridge
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file, without extension
    #[arg(short, long, default_value = "config/picom")]
    config: String,

    /// Override the configured voice transport
    #[arg(long, value_enum)]
    transport: Option<Transport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    info!("PiCom v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let transport = cli.transport.unwrap_or(cfg.service.transport);
    let connector: Arc<dyn VoiceConnector> = match transport {
        Transport::Nats => Arc::new(NatsConnector),
        Transport::Loopback => Arc::new(LoopbackConnector::new()),
    };
    info!("Voice transport: {}", connector.name());

    let (panel, buttons) = VirtualPanel::new(BUTTON_BUFFER);
    let (mut service, handle) = PiComService::new(
        ServiceOptions::from(&cfg),
        cfg.session.clone(),
        connector,
        panel.clone(),
        buttons,
    );

    service.setup().await?;
    let service_task = tokio::spawn(service.run());

    let app = create_router(AppState::new(handle.clone(), panel));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    if let Err(e) = handle.shutdown().await {
        error!("{:#}", e);
    }
    service_task.await.context("Service task panicked")?;

    Ok(())
}
