use clap::Parser;
use colored::*;
use duet_core::{MIN_VALID_CHUNK_BYTES, SessionKey};
use duet_merge::{Ffmpeg, MergeOptions, MergePipeline, MergeReport, SkipReason};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet-merge", about = "Merge the recorded chunks of one session")]
struct Cli {
    /// Directory the upload server stores sessions in.
    #[arg(long, default_value = "uploads")]
    storage_root: PathBuf,

    #[arg(long, default_value_t = MIN_VALID_CHUNK_BYTES)]
    min_chunk_bytes: u64,

    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    session_key: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let key = match SessionKey::parse(&cli.session_key) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{} {}", "❌".red(), e.to_string().red());
            return ExitCode::from(2);
        }
    };

    println!("{}", format!("📂 Merging session '{key}'...").green().bold());

    let options = MergeOptions {
        storage_root: cli.storage_root,
        min_chunk_bytes: cli.min_chunk_bytes,
        ..MergeOptions::default()
    };
    let pipeline = MergePipeline::new(options, Ffmpeg::new(cli.ffmpeg));

    match pipeline.run(&key).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Merge failed:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &MergeReport) {
    for track in &report.tracks {
        println!(
            "   {} {} ({} chunks, {} bytes) -> {}",
            "✅".green(),
            track.participant.bold(),
            track.chunks,
            track.bytes,
            track.path.display()
        );
    }
    for skipped in &report.skipped {
        let why = match &skipped.reason {
            SkipReason::NoValidChunks => "no usable chunks".to_owned(),
            SkipReason::Unreadable(e) => format!("unreadable: {e}"),
            SkipReason::ConcatFailed(e) => format!("concat failed: {e}"),
        };
        println!("   {} {} ({})", "⚠️".yellow(), skipped.participant.bold(), why);
    }

    match &report.mix {
        Some(mix) => println!(
            "{} {}",
            "✨ Final mix created:".green().bold(),
            mix.display()
        ),
        None => println!(
            "{}",
            format!(
                "⚠️  {} track(s), at least two are needed to mix. Skipped final mix.",
                report.tracks.len()
            )
            .yellow()
        ),
    }
}
