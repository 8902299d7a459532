use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use phishing_detector::server::{api_router, demo_router, AppState, ServerConfig};
use phishing_detector::{
    init_logger, load_detector, report, DetectError, Detector, ModelInfo, ModelManager, RuntimeConfig,
};

const API_PORT: u16 = 5000;
const DEMO_PORT: u16 = 7860;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force a fresh download of the model files
    #[arg(short, long, global = true)]
    fresh: bool,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0, global = true)]
    threads: usize,

    /// Address the server binds to
    #[arg(long, default_value = "127.0.0.1", global = true)]
    host: IpAddr,

    /// Port to listen on (5000 for `serve`, 7860 for `demo`)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON prediction API
    Serve,
    /// Serve the interactive demo page
    Demo,
    /// Print the report for one text and exit
    Predict {
        text: String,
    },
}

async fn load(args: &Args) -> anyhow::Result<Detector> {
    let manager = ModelManager::new_default().context("Failed to create model cache directory")?;
    let info = ModelInfo::from_env();
    info!("Loading model {} ({})", info.repo, info.revision);
    let runtime_config = RuntimeConfig::default().with_intra_threads(args.threads);
    Ok(load_detector(&manager, &info, runtime_config, args.fresh).await)
}

async fn serve(router: axum::Router, addr: SocketAddr, name: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("{} listening on http://{}", name, addr);
    axum::serve(listener, router).await.context("Server error")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();
    let detector = load(&args).await?;
    if !detector.is_available() {
        log::warn!("Running without a model; predictions will be refused");
    }

    match args.command {
        Command::Serve => {
            let addr = SocketAddr::new(args.host, args.port.unwrap_or(API_PORT));
            let config = ServerConfig::default().with_addr(addr);
            let state = Arc::new(AppState::new(config.clone(), detector));
            serve(api_router(state), config.addr, "Prediction API").await
        }
        Command::Demo => {
            let addr = SocketAddr::new(args.host, args.port.unwrap_or(DEMO_PORT));
            let config = ServerConfig::default().with_addr(addr);
            let state = Arc::new(AppState::new(config.clone(), detector));
            serve(demo_router(state), config.addr, "Interactive demo").await
        }
        Command::Predict { text } => {
            match detector.predict(&text) {
                Ok(prediction) => println!("{}", report::render_report(&prediction)),
                Err(DetectError::ModelUnavailable) => println!("{}", report::MODEL_UNAVAILABLE_MESSAGE),
                Err(DetectError::InvalidInput) => println!("{}", report::EMPTY_INPUT_MESSAGE),
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_port_are_global() {
        let args = Args::try_parse_from(["phishing-detector", "demo", "--host", "0.0.0.0", "--port", "8080"]).unwrap();
        assert!(matches!(args.command, Command::Demo));
        assert_eq!(args.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(args.port, Some(8080));

        let args = Args::try_parse_from(["phishing-detector", "--port", "9000", "serve"]).unwrap();
        assert!(matches!(args.command, Command::Serve));
        assert_eq!(args.port, Some(9000));
    }

    #[test]
    fn test_port_defaults_per_command() {
        let args = Args::try_parse_from(["phishing-detector", "serve"]).unwrap();
        assert_eq!(args.port.unwrap_or(API_PORT), 5000);
        assert_eq!(args.host, IpAddr::from([127, 0, 0, 1]));
    }
}
