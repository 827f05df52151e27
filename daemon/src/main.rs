//! skillswap: command-line entry point for trade settlement.

use anyhow::Context;
use clap::Parser;
use skillswap_pricing::{CreditCalculator, FixedDemand, HighValuePolicy};
use skillswap_settlement::{FundsState, SettlementConfig, SettlementService};
use skillswap_tokens::{OsRandom, TokenRegistry};
use skillswap_types::{
    Attachment, Clock, Complexity, Credits, SystemClock, TradeRole, UserId, VerificationMethod,
};
use skillswap_utils::{format_expiry, init_logging, LogFormat};
use skillswap_wizard::TradeWizard;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "skillswap", about = "SkillSwap trade verification and credit settlement")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SKILLSWAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SKILLSWAP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SKILLSWAP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Price a session and report whether it counts as high-value.
    Quote {
        /// Session length in minutes (15 to 480, in steps of 15).
        #[arg(long)]
        duration: u32,

        /// "simple", "standard" or "advanced".
        #[arg(long, default_value = "standard")]
        complexity: Complexity,

        /// Credits per hour; defaults to the configured rate.
        #[arg(long)]
        base_rate: Option<f64>,

        /// Demand multiplier for the skill.
        #[arg(long, default_value_t = 1.0)]
        demand: f64,
    },

    /// Log a trade through the wizard, have the counterparty confirm it,
    /// and print the resulting record as JSON.
    Simulate {
        #[arg(long, default_value = "alice")]
        initiator: String,

        #[arg(long, default_value = "bob")]
        counterparty: String,

        #[arg(long, default_value = "Conversational Spanish")]
        skill: String,

        #[arg(long, default_value = "Community centre")]
        location: String,

        /// "taught", "learned" or "both".
        #[arg(long, default_value = "both")]
        role: TradeRole,

        #[arg(long, default_value_t = 60)]
        duration: u32,

        #[arg(long, default_value = "standard")]
        complexity: Complexity,

        /// "qr" or "pin".
        #[arg(long, default_value = "qr")]
        method: VerificationMethod,

        /// Move credits immediately on confirmation instead of holding them.
        #[arg(long)]
        no_escrow: bool,

        #[arg(long, default_value_t = 1.0)]
        demand: f64,

        /// Credits given to both parties before the trade; defaults to the
        /// configured initial balance.
        #[arg(long)]
        balance: Option<u64>,

        /// Attach a photo as evidence.
        #[arg(long)]
        evidence: Option<String>,

        /// Admin who signs off a high-value trade without evidence.
        #[arg(long)]
        approve_as: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SettlementConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SettlementConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    let format = match cli.log_format {
        Some(format) => format,
        None => config.log_format.parse()?,
    };
    init_logging(format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    match cli.command {
        Command::Quote {
            duration,
            complexity,
            base_rate,
            demand,
        } => quote(&config, duration, complexity, base_rate, demand),
        Command::Simulate {
            initiator,
            counterparty,
            skill,
            location,
            role,
            duration,
            complexity,
            method,
            no_escrow,
            demand,
            balance,
            evidence,
            approve_as,
        } => {
            let trade = SimulatedTrade {
                initiator: UserId::new(initiator),
                counterparty: UserId::new(counterparty),
                skill,
                location,
                role,
                duration,
                complexity,
                method,
                escrow: !no_escrow,
                demand,
                balance: Credits::new(balance.unwrap_or(config.initial_balance)),
                evidence,
                approve_as: approve_as.map(UserId::new),
            };
            simulate(&config, trade).await
        }
    }
}

fn quote(
    config: &SettlementConfig,
    duration: u32,
    complexity: Complexity,
    base_rate: Option<f64>,
    demand: f64,
) -> anyhow::Result<()> {
    let params = config.params();
    if !params.is_valid_duration(duration) {
        anyhow::bail!(
            "duration must be between {} and {} minutes in steps of {}",
            params.min_duration_mins,
            params.max_duration_mins,
            params.duration_step_mins
        );
    }
    if !(demand.is_finite() && demand > 0.0) {
        anyhow::bail!("demand multiplier must be a positive number");
    }
    let calculator = CreditCalculator::new(base_rate.unwrap_or(params.base_rate_per_hour));
    let assessment = HighValuePolicy::from_params(&params).assess(calculator.credits(
        duration,
        complexity,
        demand,
    ));

    println!("{}", assessment.credits);
    if assessment.high_value {
        println!(
            "high-value trade (threshold {}): photo evidence or admin approval required before release",
            params.high_value_threshold
        );
    }
    Ok(())
}

struct SimulatedTrade {
    initiator: UserId,
    counterparty: UserId,
    skill: String,
    location: String,
    role: TradeRole,
    duration: u32,
    complexity: Complexity,
    method: VerificationMethod,
    escrow: bool,
    demand: f64,
    balance: Credits,
    evidence: Option<String>,
    approve_as: Option<UserId>,
}

async fn simulate(config: &SettlementConfig, trade: SimulatedTrade) -> anyhow::Result<()> {
    let params = config.params();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = Arc::new(Mutex::new(SettlementService::new(
        params.clone(),
        OsRandom,
        Arc::new(TokenRegistry::new()),
        clock.clone(),
    )));
    if !trade.balance.is_zero() {
        let mut svc = lock(&service)?;
        svc.deposit(&trade.initiator, trade.balance)?;
        svc.deposit(&trade.counterparty, trade.balance)?;
    }

    // Step 1: details.
    let mut wizard = TradeWizard::new(
        trade.initiator.clone(),
        Some(trade.counterparty.clone()),
        params,
        Arc::new(FixedDemand(trade.demand)),
    );
    wizard.set_skill(trade.skill)?;
    wizard.set_location(trade.location)?;
    wizard.set_role(trade.role)?;
    wizard.set_duration(trade.duration)?;
    wizard.set_complexity(trade.complexity)?;
    if let Some(name) = trade.evidence {
        let uri = format!("file://{name}");
        wizard.add_attachment(Attachment { name, uri })?;
    }
    if let Some(quote) = wizard.credit_quote() {
        if quote.assessment.high_value {
            tracing::warn!(credits = %quote.proposed, "high-value trade");
        }
    }
    wizard.next()?;

    // Step 2: verification.
    wizard.set_method(trade.method)?;
    wizard.set_escrow_enabled(trade.escrow)?;
    wizard.next()?;

    // Step 3: review and submit.
    wizard.set_agree_to_terms(true)?;
    let request = wizard.begin_submission()?;
    let generation = request.generation;
    let mut backend = service.clone();
    let result = tokio::task::spawn_blocking(move || request.dispatch(&mut backend)).await?;
    let record = wizard.complete_submission(generation, result)?;

    // The counterparty presents the token.
    let token = record
        .pin_code()
        .or(record.qr_token())
        .context("submitted record carries no token")?
        .to_string();
    let mut svc = lock(&service)?;
    let confirmation = svc.confirm_trade(record.id, &token)?;
    if confirmation.funds == FundsState::AwaitingReview {
        match &trade.approve_as {
            Some(admin) => {
                svc.approve_high_value(record.id, admin)?;
            }
            None => tracing::warn!(
                trade = %record.id,
                "funds held until evidence is attached or an admin approves"
            ),
        }
    }

    let stored = svc
        .get(record.id)
        .context("confirmed record missing from the service")?;
    println!("{}", serde_json::to_string_pretty(stored)?);
    println!(
        "token {} ({})",
        format_expiry(stored.expires_at, clock.now()),
        stored.verification_method()
    );
    for event in svc.drain_events() {
        tracing::debug!(?event, "settlement event");
    }
    for user in [&trade.initiator, &trade.counterparty] {
        println!("{user}: {}", svc.ledger().balance(user));
    }
    Ok(())
}

fn lock<T>(service: &Mutex<T>) -> anyhow::Result<std::sync::MutexGuard<'_, T>> {
    service
        .lock()
        .map_err(|_| anyhow::anyhow!("settlement service lock poisoned"))
}
