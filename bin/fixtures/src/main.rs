mod serve;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> std::result::Result<(), BoxedError> {
    let commander = serve::register(
        clap::Command::new("fixtures")
            .about("Deterministic http fixtures for exercising client caching")
            .arg_required_else_help(true),
    );

    let matches = commander.get_matches();
    if let Some(("serve", arguments)) = matches.subcommand() {
        serve::run(arguments).await?;
    }

    Ok(())
}
