use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use chardev::config::load_file_config;
use chardev::{ChardevOpts, ChardevRegistry};

/// Default read size, matching the guest serial FIFO refill
const DEFAULT_CHUNK: usize = 32;

#[derive(Parser)]
#[command(name = "chardev-string")]
#[command(about = "Drive a string chardev and dump what the guest would read")]
struct Args {
    /// Chardev option string, e.g. `string,id=serial0,text=hello` (repeatable)
    #[arg(long = "chardev", value_name = "OPTS")]
    chardevs: Vec<String>,

    /// TOML file with [[chardev]] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Id of the device to drain (defaults to the first one defined)
    #[arg(long)]
    device: Option<String>,

    /// Bytes requested per sync read
    #[arg(long, default_value_t = DEFAULT_CHUNK)]
    chunk: usize,

    /// Text to send through the device's write path before draining
    #[arg(short, long)]
    write: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = if args.debug {
        "chardev=trace,chardev_string=debug"
    } else {
        "chardev=warn,chardev_string=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.chunk == 0 {
        anyhow::bail!("--chunk must be at least 1");
    }

    let registry = ChardevRegistry::with_builtin_types()?;

    let mut definitions = load_file_config(args.config.as_deref())?.to_opts();
    for raw in &args.chardevs {
        definitions.push(
            ChardevOpts::parse(raw).with_context(|| format!("Invalid --chardev '{}'", raw))?,
        );
    }

    let mut first = None;
    for opts in &definitions {
        let dev = registry
            .create(opts)
            .with_context(|| format!("Failed to create chardev from '{}'", opts.backend()))?;
        info!("Created chardev {} ({})", dev.id(), dev.kind());
        first.get_or_insert_with(|| dev.id().to_string());
    }

    let id = args
        .device
        .or(first)
        .context("No chardev defined; pass --chardev or --config")?;
    let dev = registry.get(&id)?;

    if let Some(text) = &args.write {
        let written = dev.write(text.as_bytes())?;
        info!("Wrote {} of {} bytes to {}", written, text.len(), id);
    }

    let mut stdout = std::io::stdout().lock();
    let mut buf = vec![0u8; args.chunk];
    let mut total = 0;
    loop {
        let n = dev.sync_read(&mut buf)?;
        if n == 0 {
            break;
        }
        debug!("Read {} bytes from {}", n, id);
        stdout.write_all(&buf[..n]).context("Failed to write to stdout")?;
        total += n;
    }
    stdout.flush()?;

    info!("Drained {} bytes from {}", total, id);
    Ok(())
}
