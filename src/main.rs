use std::path::PathBuf;
use std::rc::Rc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use heightcache_core::{CacheConfig, Height, IndexPath, IndexPathHeightCache};
use heightcache_ui::{ListView, NotificationCenter, ViewEvent};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heightcache")]
#[command(about = "Replay list edits against an index-path row height cache", long_about = None)]
struct Cli {
    /// Cache configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of sections in the demo list
    #[arg(long, default_value = "3")]
    sections: usize,
    /// Rows per section
    #[arg(long, default_value = "4")]
    rows: usize,
    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Stand-in for an expensive layout pass.
fn measure(index_path: IndexPath) -> Height {
    44.0 + ((index_path.section * 7 + index_path.row * 3) % 5) as f64 * 11.0
}

fn print_cache(title: &str, cache: &IndexPathHeightCache) {
    println!("{}", title);
    if cache.is_empty() {
        println!("  (empty)");
    }
    for (section, rows) in cache.sections().iter().enumerate() {
        let cells: Vec<String> = rows
            .iter()
            .enumerate()
            .map(|(row, height)| {
                if cache.exists(IndexPath::new(section, row)) {
                    format!("{:>6.1}", height)
                } else {
                    format!("{:>6}", "-")
                }
            })
            .collect();
        println!("  section {}: {}", section, cells.join(" "));
    }
    println!();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => CacheConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CacheConfig::default(),
    };
    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let center = Rc::new(NotificationCenter::new());
    let mut list = ListView::new(
        Rc::clone(&center),
        config,
        vec![cli.rows; cli.sections],
        measure,
    );

    let total = list.total_height()?;
    info!(total, measured = list.measure_count(), "initial layout");
    print_cache("After initial layout:", &list.height_cache().borrow());

    if cli.sections > 0 {
        list.insert_sections(&[0], 2)?;
        if cli.rows > 0 {
            list.delete_rows(&[IndexPath::new(1, 0)])?;
            list.insert_rows(&[IndexPath::new(1, 0)])?;
        }
        if list.number_of_sections() > 2 {
            list.move_section(1, 2)?;
        }
        if list.number_of_rows(1) > 1 {
            list.move_row(IndexPath::new(1, 0), IndexPath::new(1, 1))?;
        }
    }
    print_cache("After structural edits:", &list.height_cache().borrow());

    let before = list.measure_count();
    let total = list.total_height()?;
    info!(total, remeasured = list.measure_count() - before, "layout after edits");

    // a viewport change arrives from another thread
    let sender = center.sender();
    thread::spawn(move || sender.send(ViewEvent::OrientationChanged))
        .join()
        .map_err(|_| anyhow!("notification thread panicked"))??;
    let delivered = center.process_events()?;
    info!(delivered, "processed notifications");
    print_cache("After orientation change:", &list.height_cache().borrow());

    let before = list.measure_count();
    let total = list.total_height()?;
    info!(total, remeasured = list.measure_count() - before, "layout after orientation change");

    Ok(())
}
