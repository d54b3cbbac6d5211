use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_agg::app::AppContext;
use news_agg::cli::{commands, Cli, Commands, SourceAction};
use news_agg::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(database) = cli.database {
        config.database = Some(database);
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Sources { action } => match action {
            SourceAction::Add(args) => commands::add_source(&ctx, args)?,
            SourceAction::Remove { id } => commands::remove_source(&ctx, id)?,
            SourceAction::List => commands::list_sources(&ctx)?,
        },
        Commands::News {
            page,
            per_page,
            search,
            json,
        } => {
            commands::list_news(&ctx, page, per_page, search.as_deref(), json)?;
        }
        Commands::Update => {
            commands::update(&ctx).await?;
        }
        Commands::Run { interval } => {
            commands::run(&ctx, interval).await?;
        }
    }

    Ok(())
}
