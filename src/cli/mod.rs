use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::application::{
    Credentials, DEFAULT_BASE_URL, LedgerProbe, ProbeConfig, ProbeError, ProbeReport, RunOptions,
};
use crate::domain::{Cents, TransactionRequest, UserId, format_cents, parse_cents};

/// Ledger Probe - check a remote ledger's balance bookkeeping from the outside
#[derive(Parser)]
#[command(name = "ledger-probe")]
#[command(
    about = "Logs in to a ledger service, records a farmer-to-buyer sale and checks that both balances moved the right way"
)]
#[command(version)]
pub struct Cli {
    /// Base URL of the ledger API
    #[arg(long, env = "LEDGER_PROBE_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Login username
    #[arg(short, long, env = "LEDGER_PROBE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password
    #[arg(
        short,
        long,
        env = "LEDGER_PROBE_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "LEDGER_PROBE_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, create a transaction and verify the farmer and buyer balances
    Run {
        /// Shop recording the sale
        #[arg(long, default_value_t = 1)]
        shop_id: u64,

        /// Selling farmer's user ID
        #[arg(long, default_value_t = 61)]
        farmer_id: UserId,

        /// Buying user's ID
        #[arg(long, default_value_t = 62)]
        buyer_id: UserId,

        /// Product name
        #[arg(long, default_value = "TestProduct")]
        product: String,

        /// Product category ID
        #[arg(long, default_value_t = 1)]
        category_id: u64,

        /// Number of units sold
        #[arg(short, long, default_value_t = 5)]
        quantity: u32,

        /// Price per unit (e.g., "200" or "100.50")
        #[arg(long, default_value = "200")]
        unit_price: String,

        /// Read both balances before the sale and report how much they moved
        #[arg(long)]
        baseline: bool,

        /// Milliseconds to wait after the sale before reading balances
        #[arg(long, default_value_t = 0)]
        settle_ms: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Exit with a non-zero status when the verdict is FAIL
        #[arg(long)]
        strict: bool,
    },

    /// Log in and show the session token preview
    Login,

    /// Show the current balance of a user
    Balance {
        /// User ID
        user_id: UserId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    /// Install the global stderr log subscriber. `RUST_LOG` wins over `--verbose`.
    /// Call once per process.
    pub fn init_tracing(&self) {
        let default_directive = if self.verbose {
            "ledger_probe=debug"
        } else {
            "ledger_probe=info"
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    pub fn probe_config(&self) -> Result<ProbeConfig> {
        let username = self
            .username
            .clone()
            .context("Username is required (--username or LEDGER_PROBE_USERNAME)")?;
        let password = self
            .password
            .clone()
            .context("Password is required (--password or LEDGER_PROBE_PASSWORD)")?;

        Ok(
            ProbeConfig::new(self.base_url.clone(), Credentials::new(username, password))
                .with_timeout(Duration::from_secs(self.timeout_secs)),
        )
    }

    pub async fn run(self) -> Result<()> {
        let probe = LedgerProbe::new(self.probe_config()?).map_err(step_failed)?;

        match self.command {
            Commands::Run {
                shop_id,
                farmer_id,
                buyer_id,
                product,
                category_id,
                quantity,
                unit_price,
                baseline,
                settle_ms,
                format,
                strict,
            } => {
                let unit_price_cents = parse_cents(&unit_price)
                    .context("Invalid unit price format. Use '200' or '100.50'")?;

                let request = TransactionRequest::new(shop_id, farmer_id, buyer_id, product)
                    .with_category(category_id)
                    .with_quantity(quantity)
                    .with_unit_price(unit_price_cents);
                let options = RunOptions {
                    baseline,
                    settle_delay: Duration::from_millis(settle_ms),
                };

                let report = probe.run(&request, &options).await.map_err(step_failed)?;

                match format {
                    OutputFormat::Table => write_report_table(&report, std::io::stdout())?,
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    OutputFormat::Csv => write_report_csv(&report, std::io::stdout())?,
                }

                // A FAIL verdict is still a completed run
                if strict && !report.passed() {
                    anyhow::bail!(
                        "Ledger invariant check failed: expected farmer > 0 and buyer < 0"
                    );
                }
            }

            Commands::Login => {
                let session = probe.login().await.map_err(step_failed)?;
                println!("Logged in as {}", probe.config().credentials.username);
                println!("  Token: {}", session.preview());
            }

            Commands::Balance { user_id } => {
                let session = probe.login().await.map_err(step_failed)?;
                let snapshot = probe
                    .fetch_balance(&session, user_id)
                    .await
                    .map_err(step_failed)?;
                println!(
                    "User {}: {}",
                    snapshot.user_id,
                    format_cents(snapshot.current_balance_cents)
                );
            }
        }

        Ok(())
    }
}

/// Attach the name of the failing step so the user sees where the run stopped.
fn step_failed(err: ProbeError) -> anyhow::Error {
    let step = err.step();
    anyhow::Error::new(err).context(format!("Step '{}' failed", step))
}

fn optional_cents(value: Option<Cents>) -> String {
    value.map(format_cents).unwrap_or_else(|| "-".to_string())
}

fn write_report_table<W: Write>(report: &ProbeReport, mut out: W) -> Result<()> {
    let txn = &report.transaction;

    writeln!(out, "Run {}", report.run_id)?;
    writeln!(out)?;
    writeln!(out, "Transaction: {}", txn.id)?;
    writeln!(out, "  Total amount:   {:>12}", format_cents(txn.total_amount_cents))?;
    writeln!(out, "  Farmer earning: {:>12}", format_cents(txn.farmer_earning_cents))?;
    writeln!(out, "  Retained:       {:>12}", format_cents(txn.retained_cents()))?;
    writeln!(out)?;

    writeln!(
        out,
        "{:<8} {:<10} {:>14} {:>14} {:>14}",
        "ROLE", "USER", "BASELINE", "CURRENT", "DELTA"
    )?;
    writeln!(out, "{}", "-".repeat(64))?;
    for participant in report.participants() {
        writeln!(
            out,
            "{:<8} {:<10} {:>14} {:>14} {:>14}",
            participant.role.as_str(),
            participant.user_id,
            optional_cents(participant.baseline_cents),
            format_cents(participant.current_cents),
            optional_cents(participant.delta_cents),
        )?;
    }
    writeln!(out)?;

    let verification = &report.verification;
    if verification.passed() {
        writeln!(out, "Result: {} (farmer > 0, buyer < 0)", verification.verdict)?;
    } else {
        writeln!(out, "Result: {}", verification.verdict)?;
        writeln!(out, "  Expected: farmer > 0, buyer < 0")?;
        writeln!(
            out,
            "  Got:      farmer = {}, buyer = {}",
            format_cents(verification.farmer_balance_cents),
            format_cents(verification.buyer_balance_cents)
        )?;
    }

    if !report.observations.is_empty() {
        writeln!(out)?;
        writeln!(out, "Notes:")?;
        for observation in &report.observations {
            writeln!(out, "  - {}", observation)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn write_report_csv<W: Write>(report: &ProbeReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "run_id", "role", "user_id", "baseline", "current", "delta", "verdict",
    ])?;

    let run_id = report.run_id.to_string();
    let verdict = report.verification.verdict.to_string();
    for participant in report.participants() {
        csv_writer.write_record([
            run_id.as_str(),
            participant.role.as_str(),
            participant.user_id.to_string().as_str(),
            participant
                .baseline_cents
                .map(format_cents)
                .unwrap_or_default()
                .as_str(),
            format_cents(participant.current_cents).as_str(),
            participant
                .delta_cents
                .map(format_cents)
                .unwrap_or_default()
                .as_str(),
            verdict.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
