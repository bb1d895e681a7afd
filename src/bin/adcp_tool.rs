//! adcp-tool - inspect, convert and generate ensemble files
//!
//! Usage:
//!   adcp-tool info <file>                  - List ensembles and their datasets
//!   adcp-tool validate <file>              - Check framing and checksums
//!   adcp-tool json <file> [--pretty]       - Dump ensembles as JSON
//!   adcp-tool generate <file> [-n <count>] - Write emulated ensembles

use std::path::Path;

use adcp_rs::common::{CodecError, ToolArgs, ToolCommand};
use adcp_rs::config::Config;
use adcp_rs::ensemble::{AsyncEnsembleReader, ChecksumPolicy, DecodeOptions, DecodedEnsemble};
use adcp_rs::ensemble_emulator::EnsembleEmulator;
use clap::Parser;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("adcp_rs=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = ToolArgs::parse();

    let config_path = &args.common.config_file;
    let config = if Path::new(config_path).exists() {
        let config = Config::load(config_path)?;
        info!(config_file = %config_path, "Loaded configuration");
        config
    } else {
        Config::default()
    };

    let mut opts = config.decoder.to_decode_options();
    if args.common.strict {
        opts.checksum_policy = ChecksumPolicy::Discard;
    }

    match args.command {
        ToolCommand::Info { file } => show_info(&file, opts).await,
        ToolCommand::Validate { file } => validate_file(&file, opts).await,
        ToolCommand::Json { file, pretty } => dump_json(&file, opts, pretty).await,
        ToolCommand::Generate { file, count } => generate(&file, &config, count).await,
    }
}

async fn open(path: &Path, opts: DecodeOptions) -> anyhow::Result<AsyncEnsembleReader<BufReader<File>>> {
    let file = File::open(path).await?;
    Ok(AsyncEnsembleReader::with_options(BufReader::new(file), opts))
}

/// Next decoded ensemble; frame-level errors are handed to `on_error`, I/O errors end the walk
async fn next_or_report<R, F>(
    reader: &mut AsyncEnsembleReader<R>,
    mut on_error: F,
) -> anyhow::Result<Option<DecodedEnsemble>>
where
    R: tokio::io::AsyncRead + Unpin,
    F: FnMut(&CodecError),
{
    loop {
        match reader.next_ensemble().await {
            Ok(decoded) => return Ok(decoded),
            Err(CodecError::Io(e)) => return Err(e.into()),
            Err(e) => on_error(&e),
        }
    }
}

async fn show_info(path: &Path, opts: DecodeOptions) -> anyhow::Result<()> {
    let mut reader = open(path, opts).await?;

    println!("File: {}", path.display());
    println!("Size: {} bytes", tokio::fs::metadata(path).await?.len());
    println!();

    let mut count = 0u64;
    while let Some(decoded) = next_or_report(&mut reader, |e| println!("  error: {}", e)).await? {
        count += 1;
        let ens = &decoded.ensemble;
        let time = ens
            .time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| "-".to_string());
        let kinds: Vec<&str> = ens.kinds().map(|k| k.id()).collect();
        println!(
            "#{:<8} {:<23} {:>6} bytes  checksum {:04x} {}  [{}]",
            ens.ensemble_number(),
            time,
            decoded.length,
            decoded.stored_checksum,
            if decoded.is_valid() { "ok " } else { "BAD" },
            kinds.join(" ")
        );
        if !decoded.skipped.is_empty() {
            println!("          skipped: {}", decoded.skipped.join(" "));
        }
    }

    println!();
    println!("Ensembles:     {}", count);
    println!("Bytes skipped: {}", reader.bytes_skipped());
    Ok(())
}

async fn validate_file(path: &Path, opts: DecodeOptions) -> anyhow::Result<()> {
    println!("Validating: {}", path.display());

    // Count checksum failures instead of dropping them
    let opts = DecodeOptions {
        checksum_policy: ChecksumPolicy::Keep,
        ..opts
    };
    let mut reader = open(path, opts).await?;

    let mut valid = 0u64;
    let mut bad_checksum = 0u64;
    let mut errors = 0u64;
    while let Some(decoded) = next_or_report(&mut reader, |e| {
        errors += 1;
        warn!(error = %e, "Undecodable ensemble");
    })
    .await?
    {
        if decoded.is_valid() {
            valid += 1;
        } else {
            bad_checksum += 1;
            println!(
                "  ensemble {}: checksum stored {:04x}, computed {:04x}",
                decoded.ensemble.ensemble_number(),
                decoded.stored_checksum,
                decoded.computed_checksum
            );
        }
    }

    println!();
    println!("  Valid ensembles:  {}", valid);
    println!("  Bad checksum:     {}", bad_checksum);
    println!("  Decode errors:    {}", errors);
    println!("  Bytes skipped:    {}", reader.bytes_skipped());

    if bad_checksum == 0 && errors == 0 {
        println!("\n\x1b[32m✓ File is valid\x1b[0m");
        Ok(())
    } else {
        println!("\n\x1b[31m✗ File has damaged ensembles\x1b[0m");
        std::process::exit(1);
    }
}

async fn dump_json(path: &Path, opts: DecodeOptions, pretty: bool) -> anyhow::Result<()> {
    let mut reader = open(path, opts).await?;
    while let Some(decoded) =
        next_or_report(&mut reader, |e| warn!(error = %e, "Skipping ensemble")).await?
    {
        println!("{}", decoded.ensemble.to_json_string(pretty)?);
    }
    Ok(())
}

async fn generate(path: &Path, config: &Config, count: u32) -> anyhow::Result<()> {
    let mut emulator = EnsembleEmulator::new(config.emulator.clone())?;
    let mut out = BufWriter::new(File::create(path).await?);

    let mut bytes = 0usize;
    for _ in 0..count {
        let frame = emulator.next_ensemble()?.encode()?;
        bytes += frame.len();
        out.write_all(&frame).await?;
    }
    out.flush().await?;

    info!(
        file = %path.display(),
        ensembles = count,
        bytes,
        "Wrote emulated ensembles"
    );
    Ok(())
}
