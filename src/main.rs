use std::path::PathBuf;

use rule_extract::config::{self, Algorithm, CartParams, ExtractConfig, RuleListParams};
use rule_extract::input;
use rule_extract::learner::python::PythonLearner;
use rule_extract::pipeline;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "rule-extract",
    about = "Extract rule-based classifiers from relational tables",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit a classifier on a table and print it as a ruleset
    Extract {
        /// Classifier to fit: CART, RIPPERk or IREP
        #[arg(long)]
        algorithm: String,
        /// SQLite database holding the table
        #[arg(long)]
        database: Option<PathBuf>,
        /// Table to read
        #[arg(long)]
        table: String,
        /// Class attribute (defaults to the last column)
        #[arg(long)]
        class_attribute: Option<String>,
        /// Identifier column stripped before conditioning
        #[arg(long, default_value = config::DEFAULT_ID_COLUMN)]
        id_column: String,
        /// Maximum share of missing values per attribute
        #[arg(long, default_value_t = config::DEFAULT_MISSING_THRESHOLD)]
        th: f64,
        /// Seed handed to the learner
        #[arg(long)]
        random_state: Option<u64>,
        #[command(flatten)]
        cart: CartParams,
        #[command(flatten)]
        rule_list: RuleListParams,
    },
    /// Load a CSV into a SQLite table with a trailing identifier column
    Seed {
        /// CSV file with a header row
        #[arg(long)]
        csv: PathBuf,
        /// SQLite database to write (created if missing)
        #[arg(long)]
        database: PathBuf,
        /// Table to (re)create
        #[arg(long)]
        table: String,
        /// Name of the identifier column
        #[arg(long, default_value = config::DEFAULT_ID_COLUMN)]
        id_column: String,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Extract {
            algorithm,
            database,
            table,
            class_attribute,
            id_column,
            th,
            random_state,
            cart,
            rule_list,
        } => {
            let algorithm: Algorithm = algorithm.parse()?;
            let database = config::database_path(database.as_deref())?;
            let mut config = ExtractConfig::new(algorithm)
                .with_threshold(th)?
                .with_random_state(random_state);
            config.class_attribute = class_attribute;
            config.id_column = id_column;
            config.cart = CartParams {
                random_state: config.cart.random_state,
                ..cart
            };
            config.rule_list = RuleListParams {
                random_state: config.rule_list.random_state,
                ..rule_list
            };
            info!(%algorithm, database = %database.display(), %table, th, "starting extract");

            let dataset = input::load_table(&database, &table)?;
            let learner = PythonLearner::detect()?;
            learner.check_modules(algorithm);
            let ruleset = pipeline::extract_ruleset(&dataset, &config, &learner)?;
            println!("{ruleset}");
        }
        Commands::Seed {
            csv,
            database,
            table,
            id_column,
        } => {
            info!(csv = %csv.display(), database = %database.display(), %table, "starting seed");
            let dataset = input::load_csv(&csv)?;
            input::seed_table(&database, &table, &dataset, &id_column)?;
        }
    }

    Ok(())
}
