//! # baraa
//!
//! Command-line host for `baraa-core`: weight extraction, final prices and
//! weight audits over product JSON files.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  baraa parse "Coffee Mix 500g x 6"        one text, no config needed    │
//! │  baraa weight products.json               resolution chain per record   │
//! │  baraa price products.json --base 15900   final tögrög price            │
//! │  baraa catalog --price 15900 --original 19900 [--in-store]             │
//! │  baraa audit products.json                suspicious stored weights     │
//! │  baraa estimate products.json             chain + HTTP collaborator     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Results go to stdout; logs go to stderr (`RUST_LOG=debug` for detail).

mod commands;
mod config;
mod estimator;

use std::path::PathBuf;

use anyhow::Result;
use baraa_core::validation::validate_base_price;
use baraa_core::ShippingMode;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{CatalogOptions, Output, PriceOptions};
use crate::config::BaraaConfig;
use crate::estimator::GeminiEstimator;

#[derive(Debug, Parser)]
#[command(name = "baraa", version, about = "Shipping weight and price tools for Baraa")]
struct Cli {
    /// Path to pricing.toml (defaults to the platform config directory).
    #[arg(long, global = true, env = "BARAA_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a weight out of free text.
    Parse { text: String },

    /// Resolve the shipping weight of each product in a JSON file.
    Weight { file: PathBuf },

    /// Compute final prices for each product in a JSON file.
    Price {
        file: PathBuf,

        /// Base price in won.
        #[arg(long)]
        base: f64,

        /// Shipping mode (ground or air); overrides the configured mode.
        #[arg(long)]
        mode: Option<ShippingMode>,

        #[arg(long, default_value_t = 1)]
        quantity: u32,

        /// Show every intermediate number.
        #[arg(long)]
        breakdown: bool,
    },

    /// Convert a catalog price (won) for display.
    Catalog {
        #[arg(long)]
        price: f64,

        /// Original price before discount, in won.
        #[arg(long)]
        original: Option<f64>,

        /// Show the in-store price, without the online shipping markup.
        #[arg(long)]
        in_store: bool,

        /// Shipping markup in won (defaults to 2000).
        #[arg(long, requires = "in_store")]
        markup: Option<f64>,
    },

    /// Flag stored weights that look wrong.
    Audit { file: PathBuf },

    /// Resolve weights, asking the estimation collaborator on a miss.
    Estimate {
        file: PathBuf,

        /// Print the requests instead of sending them.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Initializes logging to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show each resolved weight
/// - `RUST_LOG=baraa_core=trace` - Show multiplier decisions
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = BaraaConfig::load(cli.config)?;
    debug!(
        exchange_rate = config.pricing.exchange_rate,
        mode = %config.pricing.shipping_mode,
        "Configuration loaded"
    );

    let output = if cli.json { Output::Json } else { Output::Text };

    let rendered = match cli.command {
        Command::Parse { text } => commands::parse(&config, &text, output)?,
        Command::Weight { file } => {
            let products = commands::read_products(&file)?;
            commands::weight(&config, &products, output)?
        }
        Command::Price {
            file,
            base,
            mode,
            quantity,
            breakdown,
        } => {
            let products = commands::read_products(&file)?;
            let options = PriceOptions {
                base_price: base,
                mode,
                quantity,
                breakdown,
            };
            commands::price(&config, &products, options, output)?
        }
        Command::Catalog {
            price,
            original,
            in_store,
            markup,
        } => {
            validate_base_price(price)?;
            let options = CatalogOptions {
                price_won: price,
                original_won: original,
                in_store,
                markup,
            };
            commands::catalog(&config, options, output)?
        }
        Command::Audit { file } => {
            let products = commands::read_products(&file)?;
            commands::audit(&config, &products, output)?
        }
        Command::Estimate { file, dry_run } => {
            let products = commands::read_products(&file)?;
            if dry_run {
                commands::estimation_requests(&config, &products, output)?
            } else {
                let estimator = GeminiEstimator::from_settings(&config.estimation)?;
                commands::estimate(&config, &estimator, &products, output)?
            }
        }
    };

    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_price_arguments() {
        let cli = Cli::parse_from([
            "baraa", "--json", "price", "p.json", "--base", "15900", "--mode", "air", "--quantity", "3",
        ]);
        assert!(cli.json);
        match cli.command {
            Command::Price { base, mode, quantity, breakdown, .. } => {
                assert_eq!(base, 15900.0);
                assert_eq!(mode, Some(ShippingMode::Air));
                assert_eq!(quantity, 3);
                assert!(!breakdown);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_markup_requires_in_store() {
        assert!(Cli::try_parse_from(["baraa", "catalog", "--price", "1", "--markup", "0"]).is_err());
        let cli = Cli::parse_from(["baraa", "catalog", "--price", "1", "--in-store", "--markup", "0"]);
        assert!(matches!(
            cli.command,
            Command::Catalog { in_store: true, markup: Some(m), .. } if m == 0.0
        ));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let parsed = Cli::try_parse_from(["baraa", "price", "p.json", "--base", "1", "--mode", "sea"]);
        assert!(parsed.is_err());
    }
}
