//! # Cart Quote
//!
//! Prices the saved cart against the live rules and prints the totals.
//!
//! ## Usage
//! ```bash
//! # Quote the saved cart with the default config
//! cargo run -p bazaar-engine --bin bazaar-quote
//!
//! # Use a specific config file
//! cargo run -p bazaar-engine --bin bazaar-quote -- --config ./engine.toml
//!
//! # Add an item first (id, unit price, quantity, unit weight in grams)
//! cargo run -p bazaar-engine --bin bazaar-quote -- --add tea:299:2:500
//!
//! # Quote a throwaway cart, leaving the saved one alone
//! cargo run -p bazaar-engine --bin bazaar-quote -- --ephemeral --add rice:120:1:5000
//! ```
//!
//! The snapshot goes to stdout as JSON; logs go to stderr.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use bazaar_core::{CartItem, CartOp, ConfigKind, Money};
use bazaar_engine::{logging, EngineConfig, HttpConfigSource, MemoryStore, PricingEngine};

const USAGE: &str = "\
Bazaar Cart Quote

Usage: bazaar-quote [OPTIONS]

Options:
  -c, --config <PATH>              Engine config file (default: platform config dir)
  -a, --add <ID:PRICE:QTY:GRAMS>   Add an item before quoting (repeatable)
  -r, --remove <ID>                Remove an item before quoting (repeatable)
      --clear                      Empty the cart before quoting
      --ephemeral                  Do not read or write the saved cart
  -h, --help                       Show this help message";

/// Parses `id:price:qty:grams`, price in major units.
fn parse_item(arg: &str) -> Result<CartItem, String> {
    let parts: Vec<&str> = arg.split(':').collect();
    let [id, price, quantity, weight] = parts.as_slice() else {
        return Err(format!("expected ID:PRICE:QTY:GRAMS, got '{arg}'"));
    };

    let price: f64 = price
        .parse()
        .map_err(|_| format!("price '{price}' is not a number"))?;
    let price = Money::from_major(price).ok_or_else(|| format!("price '{price}' is out of range"))?;
    let quantity: u32 = quantity
        .parse()
        .map_err(|_| format!("quantity '{quantity}' is not a whole number"))?;
    let weight: f64 = weight
        .parse()
        .map_err(|_| format!("weight '{weight}' is not a number"))?;

    Ok(CartItem::new(*id, price, quantity, weight))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut ops: Vec<CartOp> = Vec::new();
    let mut ephemeral = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--add" | "-a" => {
                if i + 1 < args.len() {
                    ops.push(CartOp::Add(parse_item(&args[i + 1])?));
                    i += 1;
                }
            }
            "--remove" | "-r" => {
                if i + 1 < args.len() {
                    ops.push(CartOp::Remove(args[i + 1].clone()));
                    i += 1;
                }
            }
            "--clear" => ops.push(CartOp::Clear),
            "--ephemeral" => ephemeral = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument '{other}'"),
        }
        i += 1;
    }

    let config = EngineConfig::load(config_path)?;
    let engine = if ephemeral {
        PricingEngine::new(
            Arc::new(HttpConfigSource::new(&config.service)?),
            Arc::new(MemoryStore::new()),
            config.cart.storage_key.clone(),
            config.unmatched_weight(),
        )
    } else {
        PricingEngine::from_config(&config)?
    };

    for op in ops {
        engine.mutate(op);
    }

    let (delivery, tax) = engine.load_all().await;
    eprintln!("delivery rules: {delivery:?}, tax rules: {tax:?}");
    for kind in ConfigKind::ALL {
        if !engine.is_loaded(kind) {
            eprintln!("⚠ {kind} rules unavailable, priced with built-in defaults");
        }
    }

    let snapshot = engine.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    eprintln!(
        "{} item(s), grand total {}",
        snapshot.item_count, snapshot.grand_total
    );

    Ok(())
}
