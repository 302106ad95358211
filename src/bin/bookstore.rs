use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use bookstore::catalog::COLLECTION;
use bookstore::cli::{self as prog_cli, Command, FindBy, OutputMode, ReportKind};
use bookstore::config::AppConfig;
use bookstore::query::Order;
use bookstore::seed::{load_items, sample_items, seed_store};
use bookstore::logger;
use bookstore::store::MemoryStore;

#[derive(Parser, Debug)]
#[command(name = "bookstore", version, about = "Bookstore catalog queries and reports", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML)")]
    config: Option<PathBuf>,
    #[arg(long, help = "JSON array or NDJSON file of catalog items. Defaults to the built-in sample.")]
    seed: Option<PathBuf>,
    #[arg(long, help = "error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[arg(long, help = "Print one compact JSON object per section")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportArg {
    AvgPrice,
    TopAuthor,
    ByDecade,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FindArg {
    Genre,
    Author,
    AfterYear,
    InStockAfter,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run every canned query and report in order")]
    Demo,
    #[command(about = "Run one aggregation report")]
    Report { which: ReportArg },
    #[command(about = "Print the report pipelines without running them")]
    Describe,
    #[command(about = "Look items up by genre, author or year")]
    Find { by: FindArg, value: String },
    #[command(about = "List title, author and price only")]
    Project,
    #[command(about = "List items by price")]
    Sort {
        #[arg(long)]
        desc: bool,
    },
    #[command(about = "List one page of items ordered by title")]
    Page { number: usize },
    #[command(name = "update-price", about = "Set the price of the first item with this title")]
    UpdatePrice { title: String, price: f64 },
    #[command(about = "Delete the first item with this title")]
    Delete { title: String },
    #[command(about = "Create the title and author/year indexes")]
    Index,
    #[command(about = "Compare a title lookup before and after indexing")]
    Explain { title: String },
    #[command(about = "Find with a JSON filter, e.g. '{\"price\": {\"$lt\": 10}}'")]
    Query {
        filter: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "Run a JSON aggregation pipeline")]
    Aggregate { pipeline: String },
    #[command(about = "Apply a JSON update to the first match of a JSON filter")]
    Update { filter: String, update: String },
}

impl From<Commands> for Command {
    fn from(c: Commands) -> Self {
        match c {
            Commands::Demo => Self::Demo,
            Commands::Report { which } => Self::Report(match which {
                ReportArg::AvgPrice => ReportKind::AvgPrice,
                ReportArg::TopAuthor => ReportKind::TopAuthor,
                ReportArg::ByDecade => ReportKind::ByDecade,
            }),
            Commands::Describe => Self::Describe,
            Commands::Find { by, value } => Self::Find {
                by: match by {
                    FindArg::Genre => FindBy::Genre,
                    FindArg::Author => FindBy::Author,
                    FindArg::AfterYear => FindBy::AfterYear,
                    FindArg::InStockAfter => FindBy::InStockAfter,
                },
                value,
            },
            Commands::Project => Self::Project,
            Commands::Sort { desc } => Self::Sort { order: if desc { Order::Desc } else { Order::Asc } },
            Commands::Page { number } => Self::Page { number },
            Commands::UpdatePrice { title, price } => Self::UpdatePrice { title, price },
            Commands::Delete { title } => Self::Delete { title },
            Commands::Index => Self::Index,
            Commands::Explain { title } => Self::Explain { title },
            Commands::Query { filter, limit } => Self::Query { filter_json: filter, limit },
            Commands::Aggregate { pipeline } => Self::Aggregate { pipeline_json: pipeline },
            Commands::Update { filter, update } => Self::Update { filter_json: filter, update_json: update },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match real_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn real_main(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Precedence: CLI > env > config files > defaults
    let overrides = AppConfig { seed_path: cli.seed, log_level: cli.log_level, ..AppConfig::default() };
    let cfg = overrides.merge(AppConfig::load(cli.config.as_deref())?);

    let level = logger::parse_level(cfg.log_level())?;
    if !logger::init()? {
        match &cfg.log_dir {
            Some(dir) => logger::init_for_app(dir, "bookstore", level)?,
            None => logger::init_console(level)?,
        }
    }

    let items = match &cfg.seed_path {
        Some(p) => load_items(p)?,
        None => sample_items(),
    };
    let store = MemoryStore::new(COLLECTION);
    seed_store(&store, &items)?;

    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let sections = prog_cli::run(&store, cli.command.into(), cfg.page_size())?;
    let stdout = std::io::stdout();
    prog_cli::render(&mut stdout.lock(), &sections, mode)?;
    Ok(())
}
