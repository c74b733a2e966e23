//! Coin acceptor CLI
//!
//! Command-line front end for deriving security codes, quoting fiat prices
//! and checking whether a payment has arrived.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use coinacceptor_lib::AcceptorError;

mod commands;
mod ui;

use commands::{BackendArgs, Context, TargetArgs};

#[derive(Parser)]
#[command(name = "coinacceptor")]
#[command(about = "Check on-chain payments without per-invoice state", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Acceptor configuration file (JSON)
    #[arg(long, global = true, env = "COINACCEPTOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    backends: BackendArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the security code for a payment identity
    Code {
        /// Payment identity (a fresh UUID is generated when omitted)
        identity: Option<String>,

        /// Rotation epoch
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        epoch: i64,

        /// Code modulus (defaults to the configured one)
        #[arg(long)]
        modulus: Option<u64>,
    },

    /// Convert a fiat price into the amounts a payer may send
    Quote {
        /// Price in fiat cents
        #[arg(long)]
        cents: u64,

        /// Currency tag (btc, bch, bsv, xmr)
        #[arg(short, long)]
        currency: String,

        /// Current fiat price per coin (fetched when omitted)
        #[arg(long)]
        price: Option<f64>,

        /// Previous fiat price per coin (defaults to --price)
        #[arg(long, requires = "price")]
        previous_price: Option<f64>,
    },

    /// Check for a payment of fixed atomic amount(s)
    Check {
        #[command(flatten)]
        target: TargetArgs,

        /// Amount in atomic units (satoshi or piconero); repeat to accept several
        #[arg(long = "amount", required = true)]
        amounts: Vec<u64>,
    },

    /// Check for a payment priced in fiat
    CheckFiat {
        #[command(flatten)]
        target: TargetArgs,

        /// Price in fiat cents
        #[arg(long)]
        cents: u64,

        /// Current fiat price per coin (fetched when omitted)
        #[arg(long)]
        price: Option<f64>,

        /// Previous fiat price per coin (defaults to --price)
        #[arg(long, requires = "price")]
        previous_price: Option<f64>,
    },

    /// Decode a wallet payment URI
    Uri {
        /// URI such as bitcoin:<address>?amount=0.0001
        uri: String,

        /// Render the URI as a QR code
        #[arg(long)]
        qr: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("coinacceptor=debug,coinacceptor_lib=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("coinacceptor=info,coinacceptor_lib=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(err) = run(cli).await {
        ui::error(&format!("{:#}", err));
        let input_error = err
            .downcast_ref::<AcceptorError>()
            .is_some_and(AcceptorError::is_input_error);
        std::process::exit(if input_error { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.backends, cli.json)?;

    // Dispatch commands
    match cli.command {
        Commands::Code {
            identity,
            epoch,
            modulus,
        } => {
            commands::code::run(&ctx, identity, epoch, modulus)?;
        }
        Commands::Quote {
            cents,
            currency,
            price,
            previous_price,
        } => {
            commands::quote::run(&ctx, cents, &currency, price, previous_price).await?;
        }
        Commands::Check { target, amounts } => {
            commands::check::atomic(&ctx, target, amounts).await?;
        }
        Commands::CheckFiat {
            target,
            cents,
            price,
            previous_price,
        } => {
            commands::check::fiat(&ctx, target, cents, price, previous_price).await?;
        }
        Commands::Uri { uri, qr } => {
            commands::uri::run(&ctx, &uri, qr)?;
        }
    }

    Ok(())
}
