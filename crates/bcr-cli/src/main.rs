//! Barcode bridge demo.
//!
//! Wires a mock scanner to a [`BarcodeBridge`] and runs one scan session:
//! `init`, `read`, one scan per barcode given on the command line, then
//! `destroy`. Every response the host would receive is printed.
//!
//! ```text
//! bcr-demo [--log-level LEVEL] [--log-format pretty|compact] [--throttle-ms N] [BARCODE...]
//! ```

mod logging;

use anyhow::{Context, Result, bail};
use bcr_bridge::{BarcodeBridge, BridgeConfig, PluginResult, ResponseStream};
use bcr_core::VERSION;
use bcr_hardware::mock::MockScanner;
use bcr_hardware::notification::NotificationBus;
use futures::StreamExt;
use tracing::info;

/// Symbology tag reported for every demo scan.
const DEMO_TYPE_TAG: i8 = 1;

#[derive(Debug, PartialEq, Eq)]
struct Options {
    log_level: String,
    log_format: String,
    throttle_ms: Option<u64>,
    barcodes: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            throttle_ms: None,
            barcodes: Vec::new(),
        }
    }
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--log-level" => {
                    options.log_level = args.next().context("--log-level needs a value")?;
                }
                "--log-format" => {
                    options.log_format = args.next().context("--log-format needs a value")?;
                }
                "--throttle-ms" => {
                    let value = args.next().context("--throttle-ms needs a value")?;
                    let ms = value
                        .parse::<u64>()
                        .with_context(|| format!("invalid --throttle-ms value '{value}'"))?;
                    options.throttle_ms = Some(ms);
                }
                flag if flag.starts_with("--") => bail!("unknown option '{flag}'"),
                _ => options.barcodes.push(arg.clone()),
            }
        }

        if options.barcodes.is_empty() {
            options.barcodes.push("A12345".to_string());
        }
        Ok(options)
    }

    fn config(&self) -> BridgeConfig {
        let config = BridgeConfig::default();
        match self.throttle_ms {
            Some(ms) => config.with_delivery_throttle_ms(ms),
            None => config,
        }
    }
}

fn print_response(action: &str, result: &PluginResult) {
    let body = match (result.json(), result.message()) {
        (Some(json), _) => json.to_string(),
        (None, Some(message)) => format!("\"{message}\""),
        (None, None) => String::new(),
    };
    let keep = if result.keep_callback { " (keep)" } else { "" };
    println!("{action:>9} -> {:?}{keep} {body}", result.status);
}

async fn answer(bridge: &BarcodeBridge, action: &str) -> Result<PluginResult> {
    let mut responses = bridge.call(action).await;
    let result = responses
        .next()
        .await
        .with_context(|| format!("'{action}' was never answered"))?;
    print_response(action, &result);
    Ok(result)
}

async fn next_read(results: &mut ResponseStream) -> Result<PluginResult> {
    let result = results.next().await.context("read callback closed")?;
    print_response("read", &result);
    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::parse(std::env::args().skip(1))?;
    logging::init_tracing(&options.log_level, &options.log_format)?;
    info!(version = VERSION, "Starting barcode bridge demo");

    let bus = NotificationBus::new();
    let (scanner, handle) = MockScanner::new(bus.clone());
    let bridge = BarcodeBridge::new(scanner.into(), bus, options.config())?;

    if !answer(&bridge, "init").await?.is_ok() {
        bail!("scanner initialization failed");
    }
    answer(&bridge, "getState").await?;

    let mut results = bridge.call("read").await;
    for barcode in &options.barcodes {
        handle.scan(barcode, DEMO_TYPE_TAG);
        next_read(&mut results).await?;
    }

    answer(&bridge, "destroy").await?;
    next_read(&mut results).await?;
    answer(&bridge, "getState").await?;

    bridge.shutdown().await;
    Ok(())
}
