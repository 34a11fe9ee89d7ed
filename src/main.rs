use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use parcelgate::config::LogConfig;
use parcelgate::{App, Config, Error, MemoryStore, ROUTES, Server, handlers};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parcelgate", version, about = "Delivery marketplace request pipeline")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "PARCELGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the route table and exit.
    #[arg(long)]
    routes: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("parcelgate: config: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log);

    match run(&cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: Config) -> Result<(), Error> {
    let app = App::build(&config, ROUTES, &handlers::defaults(), Arc::new(MemoryStore::new()))?;

    if cli.routes {
        for (method, pattern) in app.routes() {
            println!("{method:<6} {pattern}");
        }
        return Ok(());
    }

    Server::bind(config.bind_addr()?).serve(app).await
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
