//! Honeywell CLI - cart and wishlist from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of a product, choosing a colour
//! hw-cli cart add volt-10000mah-power-bank --variant white --quantity 2
//!
//! # Show the cart
//! hw-cli cart show
//!
//! # Drop the line without a variant, keeping colour lines
//! hw-cli cart remove moxie-anc-wireless-earbuds --base
//!
//! # Save for later, then move into the cart
//! hw-cli wishlist add moxie-party-speaker
//! hw-cli wishlist move-to-cart moxie-party-speaker
//! ```
//!
//! # Environment Variables
//!
//! - `HONEYWELL_DATA_DIR` - Where cart and wishlist snapshots are kept
//! - `HONEYWELL_CATALOG_PATH` - Catalogue JSON used to resolve product slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use honeywell_cli::commands::cart::LineSelector;
use honeywell_cli::commands::{self, CommandError};
use honeywell_cli::{FileSlot, ProductLookup};
use honeywell_core::ShopperSession;

#[derive(Parser)]
#[command(name = "hw-cli")]
#[command(author, version, about = "Honeywell shopper CLI")]
struct Cli {
    /// Directory holding cart and wishlist snapshots
    #[arg(long, env = "HONEYWELL_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Catalogue JSON file
    #[arg(
        long,
        env = "HONEYWELL_CATALOG_PATH",
        default_value = "crates/storefront/content/catalog.json",
        global = true
    )]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        /// Product slug
        slug: String,

        /// Variant ID or colour
        #[arg(short, long)]
        variant: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        slug: String,

        #[arg(short, long)]
        variant: Option<String>,

        /// Target the line without a variant
        #[arg(long, conflicts_with = "variant")]
        base: bool,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        slug: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,

        #[arg(short, long)]
        variant: Option<String>,

        /// Target the line without a variant
        #[arg(long, conflicts_with = "variant")]
        base: bool,
    },
    /// Remove every line
    Clear,
    /// Show the cart
    Show {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Save a product for later
    Add { slug: String },
    /// Remove a saved product
    Remove { slug: String },
    /// Remove every saved product
    Clear,
    /// Move a saved product into the cart
    MoveToCart { slug: String },
    /// Show the wishlist
    Show {
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "honeywell_cli=warn,honeywell_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(message) => {
            if let Err(e) = emit(&mut std::io::stdout().lock(), &message) {
                tracing::error!("Failed to write output: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Write a command's message, flushing so a closed pipe surfaces here.
fn emit(out: &mut impl Write, message: &str) -> std::io::Result<()> {
    writeln!(out, "{message}")?;
    out.flush()
}

fn run(cli: Cli) -> Result<String, CommandError> {
    let dir = cli.data_dir.unwrap_or_else(FileSlot::default_dir);
    tracing::debug!(dir = %dir.display(), "Using data directory");

    let mut session = ShopperSession::load(Arc::new(FileSlot::new(dir)));

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                slug,
                variant,
                quantity,
            } => {
                let lookup = ProductLookup::load(&cli.catalog)?;
                commands::cart::add(&mut session, &lookup, &slug, variant.as_deref(), quantity)
            }
            CartAction::Remove {
                slug,
                variant,
                base,
            } => commands::cart::remove(
                &mut session,
                &slug,
                LineSelector::new(variant.as_deref(), base),
            ),
            CartAction::Update {
                slug,
                quantity,
                variant,
                base,
            } => commands::cart::update(
                &mut session,
                &slug,
                LineSelector::new(variant.as_deref(), base),
                quantity,
            ),
            CartAction::Clear => Ok(commands::cart::clear(&mut session)),
            CartAction::Show { json } => commands::cart::show(&session, json),
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Add { slug } => {
                let lookup = ProductLookup::load(&cli.catalog)?;
                commands::wishlist::add(&mut session, &lookup, &slug)
            }
            WishlistAction::Remove { slug } => commands::wishlist::remove(&mut session, &slug),
            WishlistAction::Clear => Ok(commands::wishlist::clear(&mut session)),
            WishlistAction::MoveToCart { slug } => {
                commands::wishlist::move_to_cart(&mut session, &slug)
            }
            WishlistAction::Show { json } => commands::wishlist::show(&session, json),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_emit_writes_line() {
        let mut out = Vec::new();
        emit(&mut out, "Cart cleared").unwrap();
        assert_eq!(out, b"Cart cleared\n");
    }

    #[test]
    fn test_emit_reports_write_failure() {
        let err = emit(&mut ClosedPipe, "Cart cleared").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_base_conflicts_with_variant() {
        assert!(
            Cli::try_parse_from(["hw-cli", "cart", "remove", "volt", "--base", "-v", "white"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["hw-cli", "cart", "update", "volt", "2", "--base"]).is_ok());
    }
}
