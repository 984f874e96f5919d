use chat_relay::chat_view::HistoryFraming;
use chat_relay::relay_state::{
    ApiKey, DEFAULT_DEPLOYMENT, DEFAULT_ENDPOINT_URL, DEFAULT_MAX_PAYLOAD_SIZE, RelayConfig,
    RelayState,
};
use chat_relay::{server, terminal};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;

#[derive(Debug, Clone, ValueEnum)]
pub enum FramingType {
    Verbatim,
    Paired,
}

impl From<FramingType> for HistoryFraming {
    fn from(value: FramingType) -> Self {
        match value {
            FramingType::Verbatim => HistoryFraming::Verbatim,
            FramingType::Paired => HistoryFraming::Paired,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay in front of the inference service
    Serve {
        #[arg(
            long,
            default_value = "127.0.0.1",
            help = "Host address to bind the server to"
        )]
        host: String,

        #[arg(long, default_value_t = 3000, help = "Port number to listen on")]
        port: u16,

        #[arg(
            long,
            default_value = DEFAULT_ENDPOINT_URL,
            help = "Scoring endpoint of the inference service"
        )]
        endpoint_url: String,

        #[arg(
            long,
            default_value = DEFAULT_DEPLOYMENT,
            help = "Value sent in the azureml-model-deployment header"
        )]
        deployment: String,

        #[arg(
            long,
            env = "AZURE_AI_API_KEY",
            hide_env_values = true,
            help = "Bearer credential for the inference service; requests fail with 500 without it"
        )]
        api_key: Option<String>,

        #[arg(
            long,
            default_value_t = DEFAULT_MAX_PAYLOAD_SIZE,
            help = "Largest accepted chat request body in bytes"
        )]
        max_payload_size: usize,

        #[arg(long, default_value = "info", help = "Log level: off, error, warn, info, debug or trace")]
        log_level: log::LevelFilter,
    },
    /// Chat with a running relay from the terminal
    Chat {
        #[arg(
            long,
            default_value = "http://127.0.0.1:3000",
            help = "Base URL of the relay"
        )]
        server_url: String,

        #[arg(
            long,
            default_value_t = FramingType::Verbatim,
            value_enum,
            help = "How earlier turns are sent as chat_history"
        )]
        framing: FramingType,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Serve {
            host,
            port,
            endpoint_url,
            deployment,
            api_key,
            max_payload_size,
            log_level,
        } => {
            server::init_logging(log_level);
            let relay_config = RelayConfig {
                host,
                port,
                endpoint_url,
                deployment,
                api_key: api_key.filter(|k| !k.is_empty()).map(ApiKey::new),
                max_payload_size,
            };
            let relay_state = RelayState::new(&relay_config)?;
            tokio::select! {
                res = server::startup(relay_config, relay_state) => res?,
                _ = signal::ctrl_c() => {
                    log::info!("Received Ctrl+C, shutting down");
                }
            }
        }
        Command::Chat {
            server_url,
            framing,
        } => terminal::run(&server_url, framing.into()).await?,
    }

    Ok(())
}
