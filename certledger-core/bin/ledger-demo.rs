// bin/ledger-demo.rs - CertLedger demo
use anyhow::Result;
use certledger_core::{
    CertificateDetails, CertificateLedger, CertificateType, ChainRegistry, LedgerConfig,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ledger-demo")]
#[command(about = "Record and verify certificate files against an integrity chain", long_about = None)]
struct Args {
    /// Config file (.toml, .yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leading zeros required in each block fingerprint
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Certificate files to record
    #[arg(short, long, num_args = 1..)]
    record: Vec<PathBuf>,

    /// Files to verify after recording
    #[arg(short, long, num_args = 1..)]
    verify: Vec<PathBuf>,

    /// Student id stored with recorded certificates
    #[arg(long, default_value = "demo-student")]
    student: String,

    /// Issuing institution stored with recorded certificates
    #[arg(long)]
    institution: Option<String>,

    /// Write the chain export as JSON to this path
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Load config, then apply overrides
    let mut config = match &args.config {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config validation failed: {}", e))?;

    tracing::info!("Starting CertLedger demo v{}", certledger_core::VERSION);
    tracing::info!("  Difficulty: {}", config.difficulty);
    tracing::info!(
        "  Max admission attempts: {}",
        config
            .max_admission_attempts
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );

    let institution = args
        .institution
        .clone()
        .unwrap_or_else(|| config.genesis_institution.clone());

    let registry = ChainRegistry::new(config)?;
    let ledger = CertificateLedger::new(registry.get_instance()?);

    for path in &args.record {
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let details = CertificateDetails {
            student_id: args.student.clone(),
            student_name: args.student.clone(),
            certificate_type: CertificateType::Academic,
            title,
            institution: institution.clone(),
            ..Default::default()
        };

        let receipt = ledger.record_certificate_file(path, details)?;
        println!(
            "recorded  {} -> block #{} ({})",
            path.display(),
            receipt.index,
            receipt.fingerprint
        );
    }

    for path in &args.verify {
        let outcome = ledger.verify_file(path)?;
        match outcome.block_index {
            Some(index) => println!("{:<9} {} (block #{})", outcome.status, path.display(), index),
            None => println!("{:<9} {}", outcome.status, path.display()),
        }
    }

    let view = ledger.explorer();
    println!();
    println!(
        "chain: {} blocks, difficulty {}, {}",
        view.length,
        view.difficulty,
        if view.valid { "valid" } else { "INVALID" }
    );
    for block in &view.blocks {
        println!(
            "  #{:<4} {}  {}",
            block.index(),
            block.short_fingerprint(),
            block.payload().title
        );
    }

    if let Some(path) = &args.export {
        std::fs::write(path, ledger.chain().export_json()?)?;
        tracing::info!("Chain exported to {}", path.display());
    }

    Ok(())
}
