// a failed invocation should fail that invocation, not crash the process
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

use {
    std::process::exit,
    tracing::{Level, info, error},
    tracing_subscriber::FmtSubscriber,
    clap::Parser,
    tally_server::{
        config::ServerConfig,
        server::TallyServer,
        store::store_from_config,
    },
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    FmtSubscriber::builder().with_max_level(Level::INFO).init();
    let args = Args::parse();

    let config = match ServerConfig::from_env() {
        Ok(v) => v,
        Err(err) => {
            error!("failed to load configuration: {err}");
            exit(-1);
        }
    };

    info!("using counter table {:?}", config.counter_table);

    // the store client is constructed once here and reused across invocations
    let store = match store_from_config(&config).await {
        Ok(v) => v,
        Err(err) => {
            error!("failed to create counter store: {err}");
            exit(-1);
        }
    };

    TallyServer::new(store, args.port.unwrap_or(8080), args.metrics_port.unwrap_or(8081))
        .serve()
        .await;
}
