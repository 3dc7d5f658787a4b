use ewe_fixtures::{config, AppState, FixtureConfig};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("serve")
            .about("runs the fixture http server")
            .arg(
                clap::Arg::new("addr")
                    .long("addr")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String))
                    .help("The address to listen on, overrides the config file"),
            )
            .arg(
                clap::Arg::new("port")
                    .long("port")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(u16))
                    .help("The port to listen on, overrides the config file"),
            )
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String))
                    .help("Path to a toml file with server settings and per-route cache policies"),
            )
            .arg(
                clap::Arg::new("log_level")
                    .long("log_level")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(Level))
                    .help("The most verbose level of logs to print")
                    .default_value("info"),
            ),
    )
}

fn load_config(args: &clap::ArgMatches) -> std::result::Result<FixtureConfig, BoxedError> {
    let mut settings = match args.get_one::<String>("config") {
        Some(path) => config::from_path(path)?,
        None => FixtureConfig::default(),
    };

    if let Some(addr) = args.get_one::<String>("addr") {
        settings.server.addr.clone_from(addr);
    }

    if let Some(port) = args.get_one::<u16>("port") {
        settings.server.port = *port;
    }

    Ok(settings)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received interrupt, shutting down fixture server"),
        Err(err) => tracing::error!("Failed to listen for interrupt signal: {:?}", err),
    }
}

pub async fn run(args: &clap::ArgMatches) -> std::result::Result<(), BoxedError> {
    let max_level = args
        .get_one::<Level>("log_level")
        .copied()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder().with_max_level(max_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = load_config(args)?;
    let state = AppState::from_config(&settings)?;

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    ewe_fixtures::serve(listener, state, shutdown_signal()).await?;

    Ok(())
}
