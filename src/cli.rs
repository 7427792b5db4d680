// DVR Manager CLI binary

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use anyhow::Result;
use env_logger::{Builder, Env};

use dvr_manager_lib::attributes::Command;
use dvr_manager_lib::metadata::ffprobe::{self, FfprobeProbe};
use dvr_manager_lib::metadata::{NoProbe, VideoProbe};
use dvr_manager_lib::ranking::{SortKey, SortOrder, SortSpec};
use dvr_manager_lib::recording::to_gib;
use dvr_manager_lib::{Config, Engine};

#[derive(Parser)]
#[command(name = "dvrman")]
#[command(about = "DVR Manager - find and clean up duplicate Enigma2 recordings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScanArgs {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Recording directory to scan (repeatable, defaults to current directory)
    #[arg(short, long = "dir")]
    dirs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List recordings in ranked order
    List {
        #[command(flatten)]
        scan: ScanArgs,
        /// Sort field, e.g. title, size, sum-size, any-drop
        #[arg(short, long, default_value = "title")]
        sort: String,
        /// asc or desc
        #[arg(short, long, default_value = "asc")]
        order: String,
        /// Maximum recordings to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one recording
    Show {
        basename: String,
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Apply a flag transition: drop, undrop, good, ungood, master, unmaster
    Mark {
        action: String,
        #[arg(required = true)]
        basenames: Vec<String>,
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Set the comment of one or more recordings
    Comment {
        #[arg(required = true)]
        basenames: Vec<String>,
        #[arg(short, long)]
        text: String,
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Ledger and delete every recording marked for drop
    Purge {
        /// Actually delete; without it only the plan is printed
        #[arg(long)]
        yes: bool,
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Open a recording in the configured player
    Open {
        basename: String,
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Working-set totals
    Stats {
        #[command(flatten)]
        scan: ScanArgs,
    },
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { scan, sort, order, limit } => cmd_list(scan, &sort, &order, limit),
        Commands::Show { basename, scan } => cmd_show(scan, &basename),
        Commands::Mark { action, basenames, scan } => {
            let command: Command = action.parse()?;
            cmd_apply(scan, &basenames, command)
        }
        Commands::Comment { basenames, text, scan } => cmd_apply(scan, &basenames, Command::SetComment(text)),
        Commands::Purge { yes, scan } => cmd_purge(scan, yes),
        Commands::Open { basename, scan } => cmd_open(scan, &basename),
        Commands::Stats { scan } => cmd_stats(scan),
    }
}

/// Load config, open the store and build the working set from the roots
fn load_engine(scan: ScanArgs) -> Result<Engine> {
    let config = Config::load(scan.config.as_deref())?;
    let roots = if scan.dirs.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        scan.dirs
    };
    for root in &roots {
        if !root.is_dir() {
            anyhow::bail!("Not a directory: {}", root.display());
        }
    }

    let probe: Box<dyn VideoProbe> = if !config.probe_video {
        Box::new(NoProbe)
    } else if ffprobe::is_available() {
        Box::new(FfprobeProbe)
    } else {
        log::warn!("ffprobe not found; video properties will be unknown");
        Box::new(NoProbe)
    };

    let mut engine = Engine::open(config)?;
    engine.load(&roots, probe.as_ref())?;
    Ok(engine)
}

fn cmd_list(scan: ScanArgs, sort: &str, order: &str, limit: Option<usize>) -> Result<()> {
    let spec = SortSpec::new(sort.parse::<SortKey>()?, order.parse::<SortOrder>()?);
    let mut engine = load_engine(scan)?;
    engine.sort(spec)?;

    if engine.is_empty() {
        println!("No recordings found.");
        return Ok(());
    }

    let shown = limit.unwrap_or(usize::MAX);
    for rec in engine.records().take(shown) {
        println!("{:4} {}", rec.sortkey, rec);
    }
    if engine.len() > shown {
        println!("... and {} more", engine.len() - shown);
    }

    println!();
    println!("Sorted by {} {}", spec.key, spec.order.sql_keyword().to_lowercase());
    println!("{}", engine.summary());
    Ok(())
}

fn cmd_show(scan: ScanArgs, basename: &str) -> Result<()> {
    let engine = load_engine(scan)?;
    let rec = engine
        .get(basename)
        .ok_or_else(|| anyhow::anyhow!("Recording not found: {}", basename))?;

    println!("Recording: {}", rec.file_basename);
    println!("  Path:        {}", rec.video_path().display());
    println!("  Channel:     {}", rec.epg_channel);
    println!("  Title:       {}", rec.epg_title);
    println!("  Description: {}", rec.epg_description);
    println!("  Start:       {}", rec.timestamp);
    println!("  Size:        {:.2} GiB ({} bytes)", rec.size_gib(), rec.file_size);
    println!("  Duration:    {} min", rec.duration_minutes());
    println!("  Video:       {}", rec.detail_line());
    println!("  Group:       {}", rec.groupkey);
    println!("  Flags:       {}", rec.attribute_badge());
    if rec.has_comment() {
        println!("  Comment:     {}", rec.comment);
    }

    Ok(())
}

fn cmd_apply(scan: ScanArgs, basenames: &[String], command: Command) -> Result<()> {
    let mut engine = load_engine(scan)?;
    let outcome = engine.apply(basenames, &command)?;

    println!("{}: {} changed, {} skipped", command, outcome.changed.len(), outcome.skipped.len());
    for basename in &outcome.skipped {
        println!("  skipped: {}", basename);
    }
    Ok(())
}

fn cmd_purge(scan: ScanArgs, yes: bool) -> Result<()> {
    let mut engine = load_engine(scan)?;

    if !yes {
        let marked: Vec<_> = engine.records().filter(|r| r.is_dropped).collect();
        if marked.is_empty() {
            println!("Nothing is marked for drop.");
            return Ok(());
        }
        let bytes: i64 = marked.iter().map(|r| r.file_size).sum();
        println!("Would drop {} recordings ({:.1} GiB):", marked.len(), to_gib(bytes));
        for rec in &marked {
            println!("  {}", rec.file_basename);
        }
        println!("Run again with --yes to delete them.");
        return Ok(());
    }

    let report = engine.drop_marked()?;
    println!("Dropped {} recordings", report.dropped.len());
    println!("  Ledgered: {} files -> {}", report.ledgered.len(), engine.config().ledger_path.display());
    println!("  Deleted:  {} files", report.files_deleted);
    Ok(())
}

fn cmd_open(scan: ScanArgs, basename: &str) -> Result<()> {
    let engine = load_engine(scan)?;
    engine.open_in_player(basename)?;
    Ok(())
}

fn cmd_stats(scan: ScanArgs) -> Result<()> {
    let engine = load_engine(scan)?;
    println!("{}", engine.summary());
    Ok(())
}
