//! Prints devicetree blobs in DTS syntax.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    process,
};

use argh::FromArgs;
use fdt_reader::{AlignedBlob, Assumptions, Fdt};
use snafu::{OptionExt as _, ResultExt as _};
use snafu_utils::{GenericError, Report};

#[macro_use]
mod log;
mod dump;

/// Dump devicetree blobs to stdout in DTS syntax.
#[derive(Debug, FromArgs)]
struct Args {
    #[argh(positional)]
    blob_path: Vec<PathBuf>,
    /// run a full structural check before dumping
    #[argh(switch)]
    check: bool,
    /// print only the header and the memory reservations
    #[argh(switch)]
    header: bool,
    /// skip validation steps: comma separated list of none, valid-dtb,
    /// valid-input, latest, perfect
    #[argh(option, default = "Assumptions::default()")]
    assume: Assumptions,
    /// increase log verbosity (repeatable)
    #[argh(switch, short = 'v')]
    verbose: u8,
}

fn main() {
    let args: Args = argh::from_env();
    log::init(log::LogLevel::from_verbosity(args.verbose));

    if let Err(err) = run(&args) {
        let report = Report::new(err).color(log::color_enabled());
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), GenericError> {
    if args.blob_path.is_empty() {
        warn!("no devicetree blob given");
    }
    debug!("assumptions: {:?}", args.assume);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for blob_path in &args.blob_path {
        dump_blob(args, blob_path, &mut out).with_whatever_context(|_| {
            format!(
                "failed to dump devicetree blob, path={}",
                blob_path.display()
            )
        })?;
    }
    out.flush().whatever_context("failed to flush output")?;

    Ok(())
}

fn dump_blob<W>(args: &Args, path: &Path, out: &mut W) -> Result<(), GenericError>
where
    W: io::Write,
{
    let bytes = fs::read(path).whatever_context("failed to open devicetree blob")?;
    info!("read {} bytes from {}", bytes.len(), path.display());
    let blob = AlignedBlob::from_slice(&bytes);

    let fdt = Fdt::with_assumptions(&blob, args.assume)
        .whatever_context("failed to read devicetree header")?;
    let total_size = fdt.probe().whatever_context("invalid devicetree header")?;
    let bytes = blob.get(..total_size).with_whatever_context(|| {
        format!(
            "blob is truncated, total_size={total_size:#x}, actual={:#x}",
            blob.len()
        )
    })?;
    if total_size < blob.len() {
        warn!("{} trailing bytes after the blob", blob.len() - total_size);
    }
    let fdt = Fdt::with_assumptions(bytes, args.assume)
        .whatever_context("failed to read devicetree header")?;
    fdt.check_header()
        .whatever_context("invalid devicetree header")?;
    if args.check {
        fdt.check_full()
            .whatever_context("devicetree blob failed the full check")?;
        info!("full check passed");
    }

    writeln!(out, "/dts-v1/;").whatever_context("failed to write output")?;
    writeln!(out, "// source:\t\t{}", path.display()).whatever_context("failed to write output")?;
    dump::write_header(out, &fdt).whatever_context("failed to write output")?;
    dump::write_reservations(out, &fdt)?;
    if args.header {
        return Ok(());
    }
    if fdt.reserve_entries().next().is_some() {
        writeln!(out).whatever_context("failed to write output")?;
    }
    dump::write_tree(out, &fdt)?;

    Ok(())
}
