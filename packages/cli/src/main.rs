use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use exchanger_sdk::{
    AccountCheck, ExchangeClient, ExchangeConfig, SessionReport, SwapOutcome, ValidationPolicy,
};
use serde_json::json;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Expand `~/` to `$HOME/` in keypair paths.
fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{}", std::env::var("HOME").unwrap_or_default(), rest)
    } else {
        path.to_string()
    }
}

fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded = expand_home(path);
    read_keypair_file(&expanded)
        .map_err(|e| anyhow!(
            "Cannot load keypair from '{}': {}\n  \
             Set EXCHANGER_KEYPAIR or pass --keypair to specify a different path.",
            expanded, e
        ))
}

fn parse_pubkey(flag: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).map_err(|_| anyhow!("{flag}: '{value}' is not a base-58 public key"))
}

/// Log to stderr so `--json` output on stdout stays parseable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn format_sol(balance: Option<f64>) -> String {
    match balance {
        Some(b) => format!("{b:.6} SOL"),
        None    => "unavailable".to_string(),
    }
}

fn describe_check(check: &exchanger_sdk::Result<AccountCheck>) -> String {
    match check {
        Ok(AccountCheck::Valid)                      => "valid".to_string(),
        Ok(AccountCheck::NotFound)                   => "not found".to_string(),
        Ok(AccountCheck::WrongMint { expected, found }) => {
            format!("wrong mint (holds {found}, expected {expected})")
        }
        Ok(AccountCheck::Malformed { len })          => format!("malformed ({len} bytes)"),
        Err(e)                                       => format!("unreachable: {e}"),
    }
}

// ─── Version banner ───────────────────────────────────────────────────────────

fn print_banner(config: &ExchangeConfig) {
    let ver = env!("CARGO_PKG_VERSION");
    println!();
    println!("  Exchanger  v{ver}  ·  token swaps through a Solana liquidity pool");
    println!("  {}", "─".repeat(62));
    println!("  RPC        {}", config.rpc_url);
    println!("  Sell       {}", config.source_mint);
    println!("  Buy        {}", config.destination_mint);
    println!("  Pool       {}", config.pool.pool);
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// Exchanger — swap an SPL token through a liquidity pool on Solana.
///
/// Every command supports --json for machine-readable output.
#[derive(Parser)]
#[command(
    name    = "exchanger",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Validate token accounts and swap through a Solana liquidity pool.",
    after_help = "\
ENVIRONMENT:
  EXCHANGER_RPC_URL   Solana JSON-RPC endpoint  [default: from config, devnet]
  EXCHANGER_KEYPAIR   Path to Ed25519 keypair JSON  [default: ~/.config/solana/id.json]
  EXCHANGER_CONFIG    JSON config file with mints and pool accounts
  EXCHANGER_LOG       Log filter, e.g. debug or exchanger_sdk=trace  [default: info]

QUICK START:
  exchanger accounts
  exchanger check-account --account <PUBKEY> --mint <MINT>
  exchanger swap
  exchanger swap --amount 1000 --warn-only --json"
)]
struct Cli {
    /// Solana JSON-RPC endpoint (overrides the config file)
    #[arg(long, global = true, value_name = "URL", env = "EXCHANGER_RPC_URL")]
    rpc_url: Option<String>,

    /// Path to the owner's Ed25519 keypair JSON file
    #[arg(
        long,
        global        = true,
        value_name    = "PATH",
        default_value = "~/.config/solana/id.json",
        env           = "EXCHANGER_KEYPAIR"
    )]
    keypair: String,

    /// JSON config file (mints, pool accounts, amount, policy)
    #[arg(long, global = true, value_name = "FILE", env = "EXCHANGER_CONFIG")]
    config: Option<String>,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Log filter written to stderr
    #[arg(long, global = true, value_name = "FILTER", default_value = "info", env = "EXCHANGER_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate both token accounts, then swap through the pool
    ///
    /// Reads the owner's SOL balance before and after.  By default a failed
    /// account check skips submission; --warn-only submits anyway.
    #[command(
        after_help = "\
EXAMPLES:
  exchanger swap
  exchanger swap --amount 5000000 --json
  exchanger swap --warn-only --preflight

NOTES:
  Amounts are atomic units of the source mint.
  A failed submission is never retried automatically — check the
  signature before running again."
    )]
    Swap {
        /// Atomic units of the source mint to sell (overrides the config)
        #[arg(long, value_name = "AMOUNT")]
        amount: Option<u64>,

        /// Submit even if an account check fails
        #[arg(long, default_value_t = false)]
        warn_only: bool,

        /// Run the RPC node's preflight simulation before broadcasting
        #[arg(long, default_value_t = false)]
        preflight: bool,
    },

    /// Check that a token account exists and holds the expected mint
    #[command(name = "check-account")]
    CheckAccount {
        #[arg(long, value_name = "PUBKEY")]
        account: String,

        /// Expected mint; omit to check existence only
        #[arg(long, value_name = "PUBKEY")]
        mint: Option<String>,
    },

    /// Show the native balance of an address (default: the keypair's)
    Balance {
        #[arg(long, value_name = "PUBKEY")]
        address: Option<String>,
    },

    /// Print the latest blockhash
    Blockhash,

    /// Show the owner's associated token accounts and the pool accounts in use
    Accounts,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().len() == 1 {
        print_banner(&ExchangeConfig::devnet());
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => ExchangeConfig::from_json_file(expand_home(path))
            .with_context(|| format!("Failed to load config '{path}'"))?,
        None => ExchangeConfig::devnet(),
    };
    if let Some(url) = &cli.rpc_url {
        config = config.with_rpc_url(url.clone());
    }
    tracing::debug!(
        rpc = %config.rpc_url,
        source_mint = %config.source_mint,
        destination_mint = %config.destination_mint,
        layout = ?config.account_layout,
        "configuration loaded"
    );

    match &cli.command {
        Commands::Swap { amount, warn_only, preflight } => {
            if let Some(a) = amount {
                config.swap_amount = *a;
            }
            if *warn_only {
                config.validation_policy = ValidationPolicy::WarnOnly;
            }
            if *preflight {
                config.skip_preflight = false;
            }
            cmd_swap(config, &cli.keypair, cli.json).await?;
        }
        Commands::CheckAccount { account, mint } => {
            cmd_check_account(config, account, mint.as_deref(), cli.json).await?;
        }
        Commands::Balance { address } => {
            cmd_balance(config, &cli.keypair, address.as_deref(), cli.json).await?;
        }
        Commands::Blockhash => {
            cmd_blockhash(config, cli.json).await?;
        }
        Commands::Accounts => {
            cmd_accounts(config, &cli.keypair, cli.json)?;
        }
    }

    Ok(())
}

// ─── swap ─────────────────────────────────────────────────────────────────────

async fn cmd_swap(config: ExchangeConfig, keypair_path: &str, json_output: bool) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let owner  = load_keypair(keypair_path)?;
    let client = ExchangeClient::new(config);
    let report = client.run_session(&owner).await;

    if json_output {
        println!("{}", report_json(&report, client.config()));
    } else {
        print_report(&report, client.config());
    }

    match &report.outcome {
        SwapOutcome::Submitted(_) => Ok(()),
        SwapOutcome::Blocked(_)   => Err(anyhow!("swap not submitted: token account checks failed")),
        SwapOutcome::Failed(f)    => Err(anyhow!("swap failed during {}", f.stage)),
    }
}

fn report_json(report: &SessionReport, config: &ExchangeConfig) -> serde_json::Value {
    let (status, tx, error) = match &report.outcome {
        SwapOutcome::Submitted(r) => ("ok", Some(r.signature.clone()), None),
        SwapOutcome::Blocked(_)   => ("blocked", None, None),
        SwapOutcome::Failed(f)    => ("failed", None, Some(f.to_string())),
    };
    json!({
        "status":              status,
        "command":             "swap",
        "owner":               report.owner.to_string(),
        "source_account":      report.source_account.to_string(),
        "destination_account": report.destination_account.to_string(),
        "source_check":        describe_check(&report.source_check),
        "destination_check":   describe_check(&report.destination_check),
        "findings":            report.findings(),
        "amount":              config.swap_amount,
        "decimals":            config.decimals,
        "balance_before":      report.balance_before,
        "balance_after":       report.balance_after,
        "tx":                  tx,
        "error":               error,
    })
}

fn print_report(report: &SessionReport, config: &ExchangeConfig) {
    println!("─── Exchange Session ─────────────────────────────────────────────");
    println!("  Owner            {}", report.owner);
    println!("  Source account   {}  ({})", report.source_account, describe_check(&report.source_check));
    println!("  Dest. account    {}  ({})", report.destination_account, describe_check(&report.destination_check));
    println!("  Amount           {} atomic units  ({} decimals)", config.swap_amount, config.decimals);
    println!();
    println!("  Balance before   {}", format_sol(report.balance_before));
    match &report.outcome {
        SwapOutcome::Submitted(r) => println!("  Transaction      {}", r.signature),
        SwapOutcome::Blocked(reasons) => {
            println!("  Swap skipped — fix the token accounts first:");
            for reason in reasons {
                println!("    · {reason}");
            }
        }
        SwapOutcome::Failed(f) => println!("  Swap failed      {f}"),
    }
    println!("  Balance after    {}", format_sol(report.balance_after));
}

// ─── check-account ───────────────────────────────────────────────────────────

async fn cmd_check_account(
    config: ExchangeConfig,
    account: &str,
    mint: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let account = parse_pubkey("--account", account)?;
    let mint = mint.map(|m| parse_pubkey("--mint", m)).transpose()?;

    let client = ExchangeClient::new(config);
    let check  = client.check_account(&account, mint.as_ref()).await;
    let label  = describe_check(&check);

    if json_output {
        println!("{}", json!({
            "status":  if matches!(check, Ok(AccountCheck::Valid)) { "ok" } else { "invalid" },
            "command": "check-account",
            "account": account.to_string(),
            "mint":    mint.map(|m| m.to_string()),
            "result":  label,
        }));
    } else {
        println!("  Account   {account}");
        if let Some(m) = mint {
            println!("  Mint      {m}");
        }
        println!("  Result    {label}");
    }

    match check {
        Ok(c) => c.into_result(account).map_err(Into::into),
        Err(e) => Err(e.into()),
    }
}

// ─── balance ─────────────────────────────────────────────────────────────────

async fn cmd_balance(
    config: ExchangeConfig,
    keypair_path: &str,
    address: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let address = match address {
        Some(a) => parse_pubkey("--address", a)?,
        None    => load_keypair(keypair_path)?.pubkey(),
    };
    let client = ExchangeClient::new(config);
    let balance = client
        .balance(&address)
        .await
        .ok_or_else(|| anyhow!("Could not read balance of {address} — check your RPC endpoint"))?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "balance",
            "address": address.to_string(),
            "sol":     balance,
        }));
    } else {
        println!("  {address}  {}", format_sol(Some(balance)));
    }
    Ok(())
}

// ─── blockhash ───────────────────────────────────────────────────────────────

async fn cmd_blockhash(config: ExchangeConfig, json_output: bool) -> Result<()> {
    let client = ExchangeClient::new(config);
    let hash = client
        .blockhash()
        .await
        .ok_or_else(|| anyhow!("Could not fetch a blockhash — check your RPC endpoint"))?;

    if json_output {
        println!("{}", json!({ "status": "ok", "command": "blockhash", "blockhash": hash.to_string() }));
    } else {
        println!("  {hash}");
    }
    Ok(())
}

// ─── accounts ────────────────────────────────────────────────────────────────

fn cmd_accounts(config: ExchangeConfig, keypair_path: &str, json_output: bool) -> Result<()> {
    let owner = load_keypair(keypair_path)?.pubkey();
    let client = ExchangeClient::new(config);
    let (source, destination) = client.associated_accounts(&owner);
    let config = client.config();

    if json_output {
        println!("{}", json!({
            "status":              "ok",
            "command":             "accounts",
            "owner":               owner.to_string(),
            "source_mint":         config.source_mint.to_string(),
            "source_account":      source.to_string(),
            "destination_mint":    config.destination_mint.to_string(),
            "destination_account": destination.to_string(),
            "pool_program":        config.pool.program_id.to_string(),
            "pool":                config.pool.pool.to_string(),
            "pool_authority":      config.pool.authority.to_string(),
            "pool_source_vault":   config.pool.source_vault.to_string(),
            "pool_dest_vault":     config.pool.destination_vault.to_string(),
        }));
    } else {
        println!("─── Accounts ─────────────────────────────────────────────────────");
        println!("  Owner              {owner}");
        println!("  Source mint        {}", config.source_mint);
        println!("  Source account     {source}");
        println!("  Dest. mint         {}", config.destination_mint);
        println!("  Dest. account      {destination}");
        println!();
        println!("  Pool program       {}", config.pool.program_id);
        println!("  Pool               {}", config.pool.pool);
        println!("  Pool authority     {}", config.pool.authority);
        println!("  Pool source vault  {}", config.pool.source_vault);
        println!("  Pool dest. vault   {}", config.pool.destination_vault);
    }
    Ok(())
}
