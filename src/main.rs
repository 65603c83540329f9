use clap::Parser;
use qwen_gateway::config::{config_search_paths, GatewayConfig};
use qwen_gateway::credentials::{CredentialProvider, FileCredentialProvider};
use qwen_gateway::proxy::Forwarder;
use qwen_gateway::{build_router, AppState, SharedLogger};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "qwen-gateway",
    about = "Local OpenAI/Anthropic compatible gateway backed by Qwen OAuth credentials",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key callers must send in X-API-Key
    #[arg(long, env = "QWEN_GATEWAY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// "local" (local-network callers only) or host[:port]
    #[arg(long, env = "QWEN_GATEWAY_HOST")]
    host: Option<String>,

    /// Port to listen on when the host gives none
    #[arg(short, long)]
    port: Option<u16>,

    /// TLS certificate (PEM); requires --tls-key
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// TLS private key (PEM); requires --tls-cert
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// OAuth credential file (default: ~/.qwen/oauth_creds.json)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Log file path
    #[arg(long, default_value = "qwen-gateway.log")]
    log_file: PathBuf,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qwen_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let mut config = GatewayConfig::find_and_load(cli.config.as_deref())?;

    if let Some(key) = cli.api_key {
        config.api_key = Some(key);
    }
    if let Some(host) = cli.host {
        config.listen = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.tls_cert.is_some() || cli.tls_key.is_some() {
        config.tls.cert = cli.tls_cert;
        config.tls.key = cli.tls_key;
    }
    if let Some(path) = cli.credentials {
        config.credentials_path = Some(path);
    }

    config.validate()?;
    let target = config.listen_target()?;
    let access = config.access_config()?;

    let credentials = match config.credentials_path {
        Some(ref path) => FileCredentialProvider::new(path.clone()),
        None => FileCredentialProvider::default_location()?,
    };
    // Surface a broken credential file at startup; requests re-read it anyway.
    if let Err(e) = credentials.get_credentials().await {
        tracing::warn!("Credentials not usable yet: {}", e);
    }

    let logger = SharedLogger::new(&cli.log_file)?;
    let forwarder = Forwarder::new(Duration::from_secs(config.request_timeout_secs))?;

    let bind_addr = target.bind_address(config.port);
    let scheme = if config.tls.pair().is_some() { "https" } else { "http" };

    info!("qwen-gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("  Listen:       {}://{}", scheme, bind_addr);
    info!("  Local only:   {}", access.local_only);
    info!("  API key:      {}", if access.required_key.is_some() { "required" } else { "none" });
    info!("  Credentials:  {}", credentials.path().display());
    info!("  Log file:     {}", cli.log_file.display());

    logger.info(
        "startup",
        format!(
            "Starting qwen-gateway listen={} local_only={}",
            bind_addr, access.local_only
        ),
    );

    let state = Arc::new(AppState {
        access,
        credentials: Arc::new(credentials),
        forwarder,
        logger,
    });
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    match config.tls.pair() {
        Some((cert, key)) => {
            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key).await?;
            let addr = tokio::net::lookup_host(&bind_addr)
                .await?
                .next()
                .ok_or_else(|| anyhow::anyhow!("could not resolve {bind_addr}"))?;
            info!("Listening on https://{}", addr);
            axum_server::bind_rustls(addr, tls).serve(app).await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            info!("Listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
