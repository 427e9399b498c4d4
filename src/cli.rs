//! Command-line interface for strictly_squares.

use clap::{Parser, Subcommand};

/// Strictly Squares - squares pool server with exactly-once cell allocation
#[derive(Parser, Debug)]
#[command(name = "strictly_squares")]
#[command(about = "Squares pool allocation and settlement server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Path to the TOML config file (defaults are used if it is missing)
        #[arg(short, long, default_value = "strictly_squares.toml")]
        config: std::path::PathBuf,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (overrides config)
        #[arg(long)]
        db: Option<String>,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// Path to the database file (created if it doesn't exist)
        #[arg(long, default_value = "strictly_squares.db")]
        db: String,
    },

    /// Print a freshly shuffled axis permutation
    Shuffle,

    /// Resolve the winning cell for a score against two axis permutations
    Resolve {
        /// Running score of the column team
        #[arg(long)]
        x_score: u32,

        /// Running score of the row team
        #[arg(long)]
        y_score: u32,

        /// Column axis, comma-separated (e.g. "3,7,1,9,0,5,2,8,4,6")
        #[arg(long)]
        x_axis: strictly_squares::AxisNumbers,

        /// Row axis, comma-separated
        #[arg(long)]
        y_axis: strictly_squares::AxisNumbers,
    },
}
