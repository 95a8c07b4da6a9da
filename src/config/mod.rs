pub mod snapshot;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "cart-sync")]
#[command(about = "Keep a storefront cart in sync with the shop's cart endpoints")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Cart snapshot (JSON or TOML); overrides cart.snapshot from the config
    #[arg(short, long)]
    pub snapshot: Option<String>,

    /// Write the updated page back to the snapshot file
    #[arg(long)]
    pub write_back: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Recompute and print line totals and the grand total
    Totals,

    /// Change the quantity of a cart line
    Quantity {
        id: u64,
        slug: String,
        /// New quantity, as typed into the field
        value: String,
    },

    /// Remove a line from the cart
    Remove { id: u64, slug: String },

    /// Acknowledge the price change notice
    Confirm,

    /// Post a product button's data to its href (e.g. add to cart)
    Action {
        href: String,
        /// Attached data as key=value, repeatable
        #[arg(short, long = "data", value_parser = parse_key_value)]
        data: Vec<(String, serde_json::Value)>,
    },

    /// Ask to be notified when an out-of-stock product is back
    Notify {
        href: String,
        #[arg(long)]
        product: u64,
        #[arg(long)]
        email: String,
    },
}

/// `id_=12` becomes a number, `slug=green-tea` stays a string.
#[cfg(feature = "cli")]
pub fn parse_key_value(raw: &str) -> std::result::Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let value = serde_json::from_str::<serde_json::Value>(value)
        .ok()
        .filter(|v| v.is_number() || v.is_boolean())
        .unwrap_or_else(|| serde_json::Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}
