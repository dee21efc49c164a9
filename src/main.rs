use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context};
use clap::Parser;
use registry::{Codec, Registry};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use tap::Pipe;
use tracing::{info, warn};

mod binary;
mod error;
mod registry;
mod schema;
mod shmupcc;

/// Converts shot files between their binary form and JSON.
#[derive(Debug, Parser)]
struct Cli {
    /// Compile the JSON document INPUT into a binary file
    #[arg(short)]
    pub compile: bool,

    /// Decompile the binary file INPUT into a JSON document
    #[arg(short)]
    pub decompile: bool,

    /// File version, e.g. `shmupcc`
    #[arg(value_name = "VERSION")]
    pub format: String,

    pub input: PathBuf,
    pub output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Usage errors exit with 1 like every other failure; help and version do not.
    let args = Cli::try_parse().unwrap_or_else(|e| {
        let code = if e.use_stderr() { 1 } else { 0 };
        e.print().ok();
        std::process::exit(code)
    });

    ensure!(
        args.compile != args.decompile || !args.compile,
        "Must be specified only a single operation!"
    );
    ensure!(
        args.compile != args.decompile || args.compile,
        "Operation must be specified!"
    );

    let registry = Registry::new();
    if args.compile {
        compile_file(&registry, &args.format, &args.input, &args.output)
    } else {
        decompile_file(&registry, &args.format, &args.input, &args.output)
    }
}

fn compile_file(registry: &Registry, format: &str, input: &Path, output: &Path) -> anyhow::Result<()> {
    let codec = lookup(registry, format, "writer")?;

    let document: Value = std::fs::read_to_string(input)
        .with_context(|| format!("Unable to read {}", input.display()))?
        .pipe(|text| serde_json::from_str(&text))
        .with_context(|| format!("Unable to parse {}", input.display()))?;

    let bytes = (codec.encode)(&document).context("Unable to compile document")?;
    info!(size = bytes.len(), "compiled {}", input.display());

    write_output(output, |writer| Ok(writer.write_all(&bytes)?))
}

fn decompile_file(registry: &Registry, format: &str, input: &Path, output: &Path) -> anyhow::Result<()> {
    let codec = lookup(registry, format, "reader")?;

    let document = (codec.decode)(input)
        .with_context(|| format!("Unable to decompile {}", input.display()))?;

    write_output(output, |writer| {
        let mut serializer = Serializer::with_formatter(&mut *writer, PrettyFormatter::with_indent(b"    "));
        document.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        Ok(())
    })
}

fn lookup(registry: &Registry, format: &str, role: &str) -> anyhow::Result<Codec> {
    registry.get(format).with_context(|| {
        let known = registry.names().collect::<Vec<_>>().join(", ");
        format!("no {role} found for version {format} (known versions: {known})")
    })
}

/// Runs `write` against a fresh `output`, removing the file again if anything fails.
fn write_output(
    output: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let mut writer = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)
        .map(BufWriter::new)
        .with_context(|| format!("Unable to create {}", output.display()))?;

    write(&mut writer)
        .and_then(|_| writer.flush().context("Unable to flush file"))
        .inspect_err(|_| {
            std::fs::remove_file(output)
                .inspect_err(|e| warn!("{e}"))
                .ok();
        })
}
