use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use werewolf::prelude::*;

/// Serves the werewolf lobby, listing, and game WebSockets.
#[derive(Parser, Debug)]
#[command(name = "werewolf-server")]
#[command(about = "Werewolf game server", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "WEREWOLF_BIND", default_value = "127.0.0.1:43200")]
    bind: String,

    /// Where `GET /new` redirects after resetting the global game
    #[arg(long, env = "WEREWOLF_RESET_REDIRECT", default_value = "/")]
    reset_redirect: String,

    /// Require `?key=<value>` on `GET /new`
    #[arg(long, env = "WEREWOLF_RESET_KEY")]
    reset_key: Option<String>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.bind,
            reset_redirect: args.reset_redirect,
            reset_key: args.reset_key,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), WerewolfError> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = ServerConfig::from(args);
    if config.reset_key.is_none() {
        tracing::warn!("no reset key configured, GET /new is open to anyone");
    }

    let server = WerewolfServer::builder().config(config).build(NoRules).await?;
    server.run().await
}
