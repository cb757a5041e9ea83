use anyhow::{Context, Result};
use bdx::diff::{DiffContext, DiffStats};
use bdx::patch;
#[cfg(not(feature = "progress"))]
use bdx::progress::NoopSink;
use bdx::utils::format_size;
use bdx::wire::{PatchReader, PatchWriter};
use clap::{Parser, Subcommand};
use memmap2::Mmap;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::ops::Deref;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bdx")]
#[command(about = "Binary delta engine producing compact bsdiff-family patches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a patch that transforms OLD into NEW
    Diff {
        old: PathBuf,
        new: PathBuf,
        patch: PathBuf,

        /// Suffix-sort workers (0 = sequential, negative = cores + value)
        #[arg(short = 'j', long = "concurrency", default_value_t = 0)]
        concurrency: i32,

        /// Print timing and size statistics after diffing
        #[arg(long)]
        stats: bool,

        /// Print statistics as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Report resident memory at job checkpoints
        #[arg(long)]
        measure_memory: bool,

        /// Report parallel suffix-sort overhead
        #[arg(long)]
        measure_parallel_overhead: bool,
    },
    /// Reconstruct NEW from OLD and PATCH
    Apply {
        old: PathBuf,
        patch: PathBuf,
        out: PathBuf,
    },
    /// Summarize the records of a patch
    Info {
        patch: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            old,
            new,
            patch,
            concurrency,
            stats,
            json,
            measure_memory,
            measure_parallel_overhead,
        } => run_diff(
            &old,
            &new,
            &patch,
            concurrency,
            stats || json,
            json,
            measure_memory,
            measure_parallel_overhead,
        ),
        Commands::Apply { old, patch, out } => run_apply(&old, &patch, &out),
        Commands::Info { patch, json } => run_info(&patch, json),
    }
}

/// Input bytes, memory-mapped when the file is non-empty
enum Input {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl Deref for Input {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Input::Mapped(map) => map,
            Input::Buffered(buf) => buf,
        }
    }
}

fn map_input(path: &Path) -> Result<Input> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("inspecting {}", path.display()))?
        .len();
    if len == 0 {
        return Ok(Input::Buffered(Vec::new()));
    }
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("mapping {}", path.display()))?;
    Ok(Input::Mapped(map))
}

#[allow(clippy::too_many_arguments)]
fn run_diff(
    old_path: &Path,
    new_path: &Path,
    patch_path: &Path,
    concurrency: i32,
    collect_stats: bool,
    json: bool,
    measure_memory: bool,
    measure_parallel_overhead: bool,
) -> Result<()> {
    let old = map_input(old_path)?;
    let new = map_input(new_path)?;

    let patch_file = File::create(patch_path)
        .with_context(|| format!("creating {}", patch_path.display()))?;
    let mut writer = PatchWriter::new(BufWriter::new(patch_file))
        .context("writing patch header")?;

    let mut ctx = DiffContext::new();
    ctx.suffix_sort_concurrency = concurrency;
    ctx.measure_memory = measure_memory;
    ctx.measure_parallel_overhead = measure_parallel_overhead;
    if collect_stats {
        ctx.stats = Some(DiffStats::default());
    }

    #[cfg(feature = "progress")]
    {
        let mut sink = bdx::progress::bar::BarSink::new();
        ctx.diff_buffers(&old, &new, |rec| writer.write_record(rec), &mut sink)
            .context("diffing")?;
        sink.finish();
    }
    #[cfg(not(feature = "progress"))]
    ctx.diff_buffers(&old, &new, |rec| writer.write_record(rec), &mut NoopSink)
        .context("diffing")?;

    writer.flush().context("flushing patch")?;

    if let Some(stats) = ctx.stats {
        print_diff_stats(&stats, json)?;
    }

    Ok(())
}

fn print_diff_stats(stats: &DiffStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("Diff Statistics");
    println!("===============");
    println!();
    println!("Time sorting:     {:?}", stats.time_sorting);
    println!("Time scanning:    {:?}", stats.time_scanning);
    println!("Biggest add:      {}", format_size(stats.biggest_add));
    Ok(())
}

fn run_apply(old_path: &Path, patch_path: &Path, out_path: &Path) -> Result<()> {
    let old = map_input(old_path)?;
    let patch_file = File::open(patch_path)
        .with_context(|| format!("opening {}", patch_path.display()))?;
    let out_file = File::create(out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;

    patch::apply(&old, BufReader::new(patch_file), BufWriter::new(out_file))
        .context("applying patch")?;

    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct PatchSummary {
    records: u64,
    add_bytes: u64,
    copy_bytes: u64,
    backward_seeks: u64,
}

fn run_info(patch_path: &Path, json: bool) -> Result<()> {
    let file = File::open(patch_path)
        .with_context(|| format!("opening {}", patch_path.display()))?;
    let mut reader = PatchReader::new(BufReader::new(file)).context("reading patch header")?;

    let mut summary = PatchSummary::default();
    loop {
        let record = reader.read_record().context("reading patch record")?;
        if record.eof {
            break;
        }
        summary.records += 1;
        summary.add_bytes += record.add.len() as u64;
        summary.copy_bytes += record.copy.len() as u64;
        if record.seek < 0 {
            summary.backward_seeks += 1;
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Patch Summary");
    println!("=============");
    println!();
    println!("Records:          {}", summary.records);
    println!("Add bytes:        {}", format_size(summary.add_bytes));
    println!("Copy bytes:       {}", format_size(summary.copy_bytes));
    println!("Backward seeks:   {}", summary.backward_seeks);
    println!(
        "Output size:      {}",
        format_size(summary.add_bytes + summary.copy_bytes)
    );

    Ok(())
}
