use crate::app::{AppContext, NewsAggError, Result};
use crate::cli::AddSource;
use crate::domain::{SelectorRules, Source};
use crate::scheduler::{PassReport, SchedulerConfig};

pub fn add_source(ctx: &AppContext, args: AddSource) -> Result<()> {
    let source = if args.feed {
        Source::feed(args.url)
    } else {
        Source::page(
            args.url,
            SelectorRules {
                item: args.item,
                title: args.title,
                description: args.description,
                link: args.link,
                date: args.date,
                image: args.image,
            },
        )
    };

    let id = ctx.store.add_source(&source)?;
    println!("Source {}: {} ({})", id, source.url, source.kind());
    Ok(())
}

pub fn remove_source(ctx: &AppContext, id: i64) -> Result<()> {
    ctx.store.delete_source(id)?;
    println!("Removed source {}", id);
    Ok(())
}

pub fn list_sources(ctx: &AppContext) -> Result<()> {
    let sources = ctx.store.get_sources()?;

    if sources.is_empty() {
        println!("No sources");
        return Ok(());
    }

    for source in sources {
        let count = ctx.store.count_news(source.id)?;
        println!("{:>4} [{}] {} ({} news)", source.id, source.kind(), source.url, count);
        if !source.is_feed {
            let rules = &source.rules;
            println!(
                "       item={:?} title={:?} description={:?} link={:?} date={:?} image={:?}",
                rules.item, rules.title, rules.description, rules.link, rules.date, rules.image
            );
        }
    }

    Ok(())
}

pub fn list_news(
    ctx: &AppContext,
    page: usize,
    per_page: usize,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let page = page.max(1);
    let news = ctx
        .store
        .get_news((page - 1) * per_page, per_page, search)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&news)?);
        return Ok(());
    }

    if news.is_empty() {
        println!("No news");
        return Ok(());
    }

    for item in news {
        println!("{} {}", item.date, item.display_title());
        println!("  {}", item.link);
    }

    Ok(())
}

pub async fn update(ctx: &AppContext) -> Result<()> {
    let report = ctx.aggregator().run_pass().await;
    print_report(&report);

    match report.catalog_error {
        Some(e) => Err(NewsAggError::Catalog(e)),
        None => Ok(()),
    }
}

pub async fn run(ctx: &AppContext, interval: Option<String>) -> Result<()> {
    let config = match interval {
        Some(interval) => SchedulerConfig::from_interval(&interval).map_err(NewsAggError::Config)?,
        None => ctx
            .config
            .scheduler_config()
            .map_err(|e| NewsAggError::Config(e.to_string()))?,
    };

    let handle = ctx.scheduler(config)?.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupted, stopping scheduler...");

    handle.stop();
    handle.join().await;
    Ok(())
}

fn print_report(report: &PassReport) {
    for source in &report.sources {
        match &source.error {
            Some(e) => eprintln!("  Error parsing {}: {}", source.url, e),
            None if source.inserted > 0 => {
                println!("  {} new items from {}", source.inserted, source.url)
            }
            None => {}
        }
    }

    println!(
        "Update complete: {} new items, {} errors",
        report.total_inserted(),
        report.failures().count()
    );
}
