use anyhow::Result;
use clap::Parser;
use imagenerator::config::{Config, Profile};
use imagenerator::dispatch::Dispatcher;
use imagenerator::inference::client::DEFAULT_TIMEOUT;
use imagenerator::inference::HfInferenceClient;
use imagenerator::server::{self, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "imagenerator")]
#[command(about = "Serve a FLUX.1 text-to-image form backed by Hugging Face Inference")]
struct CliArgs {
    /// Dispatch profile; overrides IMAGENERATOR_PROFILE.
    #[arg(long, value_enum)]
    profile: Option<Profile>,
}

fn build_state(config: &Config) -> imagenerator::Result<AppState> {
    let mut client = HfInferenceClient::new(config.hf_token.clone(), DEFAULT_TIMEOUT)?;
    if let Some(url) = &config.inference_url {
        info!("Using inference endpoint override: {}", url);
        client = client.with_base_url(url.clone());
    }

    let dispatcher = Dispatcher::new(Arc::new(client), config.dispatch.clone());
    Ok(AppState::new(dispatcher))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagenerator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env(args.profile) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Environment: {}", config.bind.environment());
    info!(
        "Profile: {:?} (min length {}, enhance {}, {} steps, concurrency {:?})",
        config.profile,
        config.dispatch.min_prompt_length,
        config.dispatch.enhance_prompt,
        config.dispatch.inference_steps,
        config.dispatch.concurrency_limit
    );

    let state = build_state(&config)?;

    let addr = config.bind.socket_addr();
    info!("Launching on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    server::serve(listener, state).await?;
    Ok(())
}
