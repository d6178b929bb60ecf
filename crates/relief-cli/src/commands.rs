use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;

use relief_ledger::{Block, Chain, ProjectionBuilder};
use relief_sdk::{
    ClaimDetails, CoordinatorError, DisbursementDetails, IntegrityStatus, LedgerConfig,
    LedgerCoordinator, RecordVerification,
};
use relief_types::{BeneficiaryId, Location, Payload, ReliefCategory};

use crate::cli::*;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "relief.toml";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.data_dir)?;
    let coordinator = LedgerCoordinator::open(config)?;
    let format = cli.format;
    match cli.command {
        Command::Record(args) => cmd_record(&coordinator, args, &format).await,
        Command::Claim(args) => cmd_claim(&coordinator, args, &format).await,
        Command::Verify(args) => cmd_verify(&coordinator, args, &format),
        Command::Validate(args) => cmd_validate(&coordinator, args, &format),
        Command::Audit(args) => cmd_audit(&coordinator, args),
        Command::Log(args) => cmd_log(&coordinator, args, &format),
        Command::Reconcile(args) => cmd_reconcile(&coordinator, args, &format),
        Command::Status(args) => cmd_status(&coordinator, args, &format),
        Command::Locate(args) => cmd_locate(&coordinator, args, &format).await,
    }
}

fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<LedgerConfig> {
    let mut config = match path {
        Some(path) => LedgerConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            LedgerConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => LedgerConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        locations = config.locations.len(),
        "configuration loaded"
    );
    Ok(config)
}

async fn build_location(
    coordinator: &LedgerCoordinator,
    args: LocationArgs,
) -> anyhow::Result<Location> {
    let resolved = match &args.district {
        Some(_) => None,
        None => coordinator.resolve_location(&args.pin).await?,
    };
    let (district, state, post_office, block_code) = match (args.district, resolved) {
        (Some(district), _) => (
            district,
            args.state.unwrap_or_default(),
            args.post_office.unwrap_or_default(),
            args.block_code.unwrap_or_default(),
        ),
        (None, Some(found)) => (
            found.district,
            args.state.unwrap_or(found.state),
            args.post_office.unwrap_or(found.post_office),
            args.block_code.unwrap_or(found.block_code),
        ),
        (None, None) => bail!(
            "PIN code {} is not in the location directory; pass --district",
            args.pin
        ),
    };
    Ok(Location::new(district, state, post_office, block_code, args.pin)?)
}

fn with_chain<T>(
    coordinator: &LedgerCoordinator,
    beneficiary: Option<&str>,
    f: impl FnOnce(&Chain) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    match beneficiary {
        Some(id) => {
            let id = BeneficiaryId::parse(id)?;
            let identity = coordinator.find_identity_chain(&id)?;
            f(identity.chain())
        }
        None => f(coordinator.global()),
    }
}

/// JSON body for a claim that stands on the identity chain but has not
/// reached the global ledger yet.
fn pending_claim_json(claim: &Block, source: &dyn std::fmt::Display) -> serde_json::Value {
    serde_json::json!({
        "block": claim,
        "replication": "pending",
        "error": source.to_string(),
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_receipt(title: &str, block: &Block) {
    println!("{} {}", "✓".green().bold(), title);
    println!("  Relief ID: {}", block.relief_id().to_string().yellow().bold());
    println!("  Block: #{}", block.sequence_index);
    println!("  Category: {}", block.payload.category().to_string().cyan());
    println!("  Timestamp: {}", block.timestamp);
    println!("  Digest: {}", block.digest.to_hex().dimmed());
}

async fn cmd_record(
    coordinator: &LedgerCoordinator,
    args: RecordArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let details = DisbursementDetails {
        location: build_location(coordinator, args.location).await?,
        category: ReliefCategory::new(&args.category)?,
        quantity: args.quantity,
        notes: args.notes,
    };
    let block = coordinator.record_disbursement(details)?;
    match format {
        OutputFormat::Json => print_json(&block),
        OutputFormat::Text => {
            print_receipt("Disbursement recorded", &block);
            Ok(())
        }
    }
}

async fn cmd_claim(
    coordinator: &LedgerCoordinator,
    args: ClaimArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let category = ReliefCategory::new(&args.category)?;
    let details = ClaimDetails {
        location: build_location(coordinator, args.location).await?,
        receipt_date: args.receipt_date,
    };

    let identity = coordinator.begin_session(&args.credential).await?;
    let result = coordinator.submit_claim(&identity.beneficiary_id, category, details);
    coordinator.logout()?;

    match result {
        Ok(block) => match format {
            OutputFormat::Json => print_json(&block),
            OutputFormat::Text => {
                print_receipt("Claim recorded", &block);
                println!("  Beneficiary: {}", identity.beneficiary_id.to_string().cyan());
                Ok(())
            }
        },
        Err(CoordinatorError::ReplicationPending { claim, source }) => match format {
            OutputFormat::Json => print_json(&pending_claim_json(&claim, &source)),
            OutputFormat::Text => {
                print_receipt("Claim recorded", &claim);
                eprintln!(
                    "{} global ledger not updated ({source}); run {} to retry",
                    "!".yellow().bold(),
                    "relief reconcile".bold()
                );
                Ok(())
            }
        },
        Err(err) => Err(err.into()),
    }
}

fn cmd_verify(
    coordinator: &LedgerCoordinator,
    args: VerifyArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let relief_id = args.relief_id.trim();
    let verification = with_chain(coordinator, args.beneficiary.as_deref(), |chain| {
        Ok(chain.verify_record(relief_id)?)
    })?;
    if let OutputFormat::Json = format {
        let status = match &verification {
            RecordVerification::Intact(_) => "intact",
            RecordVerification::Tampered(_) => "tampered",
            RecordVerification::NotFound => "not_found",
        };
        print_json(&serde_json::json!({
            "relief_id": relief_id,
            "status": status,
            "block": verification.block(),
        }))?;
    }

    match verification {
        RecordVerification::Intact(block) => {
            if let OutputFormat::Text = format {
                print_receipt("Record verified", &block);
                print_payload(&block.payload);
            }
            Ok(())
        }
        RecordVerification::Tampered(block) => {
            if let OutputFormat::Text = format {
                println!(
                    "{} Record {} has been altered",
                    "✗".red().bold(),
                    relief_id.yellow()
                );
                println!("  Stored digest:     {}", block.digest.to_hex());
                println!("  Recomputed digest: {}", block.recompute_digest().to_hex().red());
            }
            bail!("record {relief_id} failed verification")
        }
        RecordVerification::NotFound => bail!("record not found: {relief_id}"),
    }
}

fn print_payload(payload: &Payload) {
    if let Some(location) = payload.location() {
        println!(
            "  Location: {}, {} ({})",
            location.district, location.state, location.pin_code
        );
    }
    match payload {
        Payload::Disbursement(d) => {
            println!("  Quantity: {}", d.quantity);
            println!("  Notes: {}", d.notes);
            println!("  Origin: {}", d.origin.as_str());
        }
        Payload::Claim(c) => {
            println!("  Beneficiary: {}", c.beneficiary_id);
            if let Some(date) = &c.receipt_date {
                println!("  Received: {date}");
            }
        }
        Payload::Genesis(g) => println!("  Note: {}", g.note),
    }
}

fn cmd_validate(
    coordinator: &LedgerCoordinator,
    args: ValidateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let report = with_chain(coordinator, args.beneficiary.as_deref(), |chain| {
        Ok(chain.validation_report()?)
    })?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "key": report.key,
            "block_count": report.block_count,
            "valid": report.is_valid(),
            "violations": report.violations.iter().map(|v| serde_json::json!({
                "index": v.index,
                "kind": format!("{:?}", v.kind),
                "description": v.description,
            })).collect::<Vec<_>>(),
        }))?,
        OutputFormat::Text => {
            if report.is_valid() {
                println!(
                    "{} {} intact ({} blocks)",
                    "✓".green().bold(),
                    report.key.bold(),
                    report.block_count
                );
            } else {
                println!(
                    "{} {} compromised: {} violation(s)",
                    "✗".red().bold(),
                    report.key.bold(),
                    report.violations.len()
                );
                for v in &report.violations {
                    println!("  #{:<4} {:?}: {}", v.index, v.kind, v.description);
                }
            }
        }
    }

    if !report.is_valid() {
        bail!("chain {} failed validation", report.key);
    }
    Ok(())
}

fn cmd_audit(coordinator: &LedgerCoordinator, args: AuditArgs) -> anyhow::Result<()> {
    match args.action {
        AuditAction::Export {
            output,
            raw,
            beneficiary,
        } => {
            let (document, count) = with_chain(coordinator, beneficiary.as_deref(), |chain| {
                Ok(if raw {
                    let blocks = chain.export()?;
                    (serde_json::to_string_pretty(&blocks)?, blocks.len())
                } else {
                    let rows = chain.audit_entries()?;
                    (serde_json::to_string_pretty(&rows)?, rows.len())
                })
            })?;
            let digest = ProjectionBuilder::export_digest(&document);
            match output {
                Some(path) => {
                    std::fs::write(&path, document)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!(
                        "{} Exported {} entries to {}",
                        "✓".green().bold(),
                        count,
                        path.display().to_string().bold()
                    );
                    println!("  Export digest: {}", digest.to_hex().dimmed());
                }
                None => {
                    println!("{document}");
                    eprintln!("export digest: {digest}");
                }
            }
            Ok(())
        }
    }
}

fn cmd_log(
    coordinator: &LedgerCoordinator,
    args: LogArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let blocks = with_chain(coordinator, args.beneficiary.as_deref(), |chain| {
        Ok(chain.export()?)
    })?;
    let recent: Vec<&Block> = blocks.iter().rev().take(args.limit).collect();

    if let OutputFormat::Json = format {
        return print_json(&recent);
    }
    for block in recent {
        if args.oneline {
            println!(
                "{} {} {} {}",
                format!("#{}", block.sequence_index).yellow(),
                block.digest.short_hex().dimmed(),
                block.relief_id(),
                block.payload.category()
            );
        } else {
            println!(
                "{}  {}",
                format!("#{}", block.sequence_index).yellow().bold(),
                block.digest.to_hex().dimmed()
            );
            println!("  {} | {}", block.relief_id(), block.payload.category().to_string().cyan());
            println!("  Timestamp: {}", block.timestamp);
            print_payload(&block.payload);
            println!();
        }
    }
    Ok(())
}

fn cmd_reconcile(
    coordinator: &LedgerCoordinator,
    args: ReconcileArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let report = match args.beneficiary {
        Some(id) => coordinator.reconcile(&BeneficiaryId::parse(&id)?)?,
        None => coordinator.reconcile_all()?,
    };
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "replicated": report.replicated.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            "repersisted": report.repersisted,
        })),
        OutputFormat::Text => {
            if report.is_clean() {
                println!("{} Nothing to reconcile.", "✓".green().bold());
            }
            for id in &report.replicated {
                println!("  {} {}", "replicated:".green(), id);
            }
            for key in &report.repersisted {
                println!("  {} {}", "re-persisted:".green(), key);
            }
            Ok(())
        }
    }
}

fn cmd_status(
    coordinator: &LedgerCoordinator,
    args: StatusArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let (key, summary, durable) = with_chain(coordinator, args.beneficiary.as_deref(), |chain| {
        Ok((chain.key().to_string(), chain.summary()?, chain.is_durable()?))
    })?;
    if let OutputFormat::Json = format {
        return print_json(&summary);
    }

    let integrity = match summary.integrity {
        IntegrityStatus::Verified => "Verified".green().bold(),
        IntegrityStatus::Compromised => "Compromised".red().bold(),
    };
    match &args.beneficiary {
        Some(id) => println!("Beneficiary ledger: {}", id.bold()),
        None => println!("Global ledger: {}", key.bold()),
    }
    println!("  Total records: {}", summary.record_count.to_string().bold());
    println!("  Districts covered: {}", summary.district_count);
    for (category, count) in &summary.category_counts {
        println!("    {:<16} {}", category.cyan(), count);
    }
    println!("  Integrity: {integrity}");
    match &summary.last_updated {
        Some(ts) => println!("  Last update: {ts}"),
        None => println!("  Last update: {}", "never".dimmed()),
    }
    if !durable {
        println!("  {} unsaved changes; run `relief reconcile`", "!".yellow().bold());
    }
    Ok(())
}

async fn cmd_locate(
    coordinator: &LedgerCoordinator,
    args: LocateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let location = coordinator.resolve_location(&args.pin).await?;
    match format {
        OutputFormat::Json => print_json(&location),
        OutputFormat::Text => {
            match location {
                Some(l) => println!(
                    "{} {}, {} ({}, block {})",
                    args.pin.bold(),
                    l.district,
                    l.state,
                    l.post_office,
                    l.block_code
                ),
                None => println!("{} unknown PIN code", args.pin.yellow()),
            }
            Ok(())
        }
    }
}
