use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "SPRING++ CLI - Template-based modeling of protein-protein complexes from homology search results.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a complex model for one pair of homology search results.
    Model(ModelArgs),
    /// Build complex models for every pair listed in an interaction table.
    Batch(BatchArgs),
    /// Manage flat-file content stores (index + data file pairs).
    Dbkit(DbkitArgs),
}

/// Settings shared by every command that runs an assembly.
#[derive(Args, Debug, Clone, Default)]
pub struct AssemblyArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Data Overrides ---
    /// Override the index file of the template structure store.
    #[arg(short, long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Override the data file of the template structure store.
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Override the template cross-reference table.
    #[arg(short = 'x', long, value_name = "PATH")]
    pub cross: Option<PathBuf>,

    /// Override the residue-pair interface potential.
    #[arg(short = 'e', long, value_name = "PATH")]
    pub potential: Option<PathBuf>,

    // --- Search Overrides ---
    /// Override the minimum homology score of a template pair.
    #[arg(long, value_name = "FLOAT")]
    pub min_score: Option<f64>,

    /// Override the maximum number of template pairs evaluated.
    #[arg(long, value_name = "INT")]
    pub max_tries: Option<usize>,

    /// Override the weight of the interface energy in the spring score.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub energy_weight: Option<f64>,

    /// Override the maximum fraction of clashing residues.
    #[arg(long, value_name = "FLOAT")]
    pub max_clashes: Option<f64>,

    /// Try every combination of top hits instead of the best hit only.
    #[arg(long)]
    pub iterate_top_hits: bool,

    /// Leave the template assembly out of the written model.
    #[arg(long)]
    pub hide_template: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.max-tries=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `model` subcommand.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Homology search result (hhr) of the first query.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub a_hhr: PathBuf,

    /// Homology search result (hhr) of the second query.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub b_hhr: PathBuf,

    /// Path for the output complex model (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Write every evaluated template pair to a CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub assembly: AssemblyArgs,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Interaction table with two identifiers per line.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub pairs: PathBuf,

    /// Index file of the store holding the homology search results.
    #[arg(long, required = true, value_name = "PATH")]
    pub hhr_index: PathBuf,

    /// Data file of the store holding the homology search results.
    #[arg(long, required = true, value_name = "PATH")]
    pub hhr_data: PathBuf,

    /// Directory receiving one model per pair.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub assembly: AssemblyArgs,
}

/// Arguments for the `dbkit` subcommand.
#[derive(Args, Debug)]
pub struct DbkitArgs {
    #[command(subcommand)]
    pub command: DbkitCommands,
}

/// Available content store operations.
#[derive(Subcommand, Debug)]
pub enum DbkitCommands {
    /// Copy the listed entries into a new store.
    Extract {
        /// File whose first column lists the entries to copy.
        #[arg(short, long, required = true, value_name = "PATH")]
        list: PathBuf,
        #[command(flatten)]
        input: StoreArgs,
        #[command(flatten)]
        output: OutputStoreArgs,
    },
    /// Merge two stores, keeping the entries of the larger one on conflicts.
    Merge {
        #[command(flatten)]
        first: StoreArgs,
        /// Index file of the second store.
        #[arg(long, required = true, value_name = "PATH")]
        second_index: PathBuf,
        /// Data file of the second store.
        #[arg(long, required = true, value_name = "PATH")]
        second_database: PathBuf,
        #[command(flatten)]
        output: OutputStoreArgs,
    },
    /// Append the files of a directory to a store, one entry per listed identifier.
    Append {
        /// File whose first column lists the identifiers to load.
        #[arg(short, long, required = true, value_name = "PATH")]
        list: PathBuf,
        /// Directory holding one file per formatted identifier.
        #[arg(short, long, required = true, value_name = "DIR")]
        path: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        format: IdentifierFormat,
    },
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Index file of the store.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub index: PathBuf,
    /// Data file of the store.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub database: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct OutputStoreArgs {
    /// Index file of the output store.
    #[arg(long, required = true, value_name = "PATH")]
    pub output_index: PathBuf,
    /// Data file of the output store.
    #[arg(long, required = true, value_name = "PATH")]
    pub output_database: PathBuf,
}

/// How listed identifiers are turned into entry names.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentifierFormat {
    /// Truncate identifiers to this many characters (0 keeps them whole).
    #[arg(long, default_value_t = 0, value_name = "INT")]
    pub id_length: usize,
    /// Change the case of identifiers.
    #[arg(long, value_enum, value_name = "CASE")]
    pub id_case: Option<IdentifierCase>,
    /// Suffix appended to identifiers.
    #[arg(long, value_name = "SUFFIX")]
    pub id_extension: Option<String>,
    /// Prefix prepended to identifiers.
    #[arg(long, value_name = "PREFIX")]
    pub id_prefix: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierCase {
    Lower,
    Upper,
}
