use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "relief",
    about = "ReliefProof: tamper-evident relief distribution ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted chains (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record an officer disbursement on the global ledger
    Record(RecordArgs),
    /// Verify an identity and submit a beneficiary claim
    Claim(ClaimArgs),
    /// Verify a single record by relief id
    Verify(VerifyArgs),
    /// Walk a whole chain and list every integrity violation
    Validate(ValidateArgs),
    /// Audit-log operations
    Audit(AuditArgs),
    /// Show chain history
    Log(LogArgs),
    /// Replicate pending claims and re-persist non-durable chains
    Reconcile(ReconcileArgs),
    /// Dashboard summary of the global ledger
    Status(StatusArgs),
    /// Resolve a PIN code from the configured directory
    Locate(LocateArgs),
}

#[derive(Args)]
pub struct LocationArgs {
    /// 6-digit postal PIN code
    #[arg(long)]
    pub pin: String,
    /// District; resolved from the PIN directory when omitted
    #[arg(long)]
    pub district: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub post_office: Option<String>,
    #[arg(long)]
    pub block_code: Option<String>,
}

#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub location: LocationArgs,
    /// Relief type, e.g. FOOD, MEDICINE, SHELTER
    #[arg(short, long)]
    pub category: String,
    #[arg(short, long, default_value = "")]
    pub quantity: String,
    #[arg(short, long, default_value = "")]
    pub notes: String,
}

#[derive(Args)]
pub struct ClaimArgs {
    /// 12-digit identity credential
    #[arg(long)]
    pub credential: String,
    #[command(flatten)]
    pub location: LocationArgs,
    #[arg(short, long)]
    pub category: String,
    /// Date the relief was received (YYYY-MM-DD)
    #[arg(long)]
    pub receipt_date: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub relief_id: String,
    /// Look the record up on a beneficiary's chain instead of the global ledger
    #[arg(long)]
    pub beneficiary: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Validate a beneficiary's chain instead of the global ledger
    #[arg(long)]
    pub beneficiary: Option<String>,
}

#[derive(Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub action: AuditAction,
}

#[derive(Subcommand)]
pub enum AuditAction {
    /// Write the audit log of the global ledger
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Export full blocks instead of flattened audit rows
        #[arg(long)]
        raw: bool,
        /// Export a beneficiary's chain instead of the global ledger
        #[arg(long)]
        beneficiary: Option<String>,
    },
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
    /// Show a beneficiary's chain instead of the global ledger
    #[arg(long)]
    pub beneficiary: Option<String>,
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Reconcile one beneficiary only
    #[arg(long)]
    pub beneficiary: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Summarize a beneficiary's chain instead of the global ledger
    #[arg(long)]
    pub beneficiary: Option<String>,
}

#[derive(Args)]
pub struct LocateArgs {
    pub pin: String,
}
