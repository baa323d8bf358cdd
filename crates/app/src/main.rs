use std::path::PathBuf;

use algoviz_core::{
    capture_script, random_permutation, seeded_rng, Algorithm, Animator, AppConfig, Field, PlaybackSession,
    RunOutcome, StopHandle, TickObserver, TickReport, TracingToneSink,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Ticks between progress lines while animating.
const PROGRESS_EVERY: u64 = 100;

#[tokio::main(flavor = "current_thread")]
async fn main() -> algoviz_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { capture, playback } => run_animation(capture, playback).await,
        Commands::Capture {
            capture,
            algorithm,
            events,
        } => run_capture(capture, algorithm, events),
    }
}

async fn run_animation(capture: CaptureArgs, playback: PlaybackArgs) -> algoviz_core::Result<()> {
    let mut config = capture.load_config()?;
    playback.apply(&mut config);
    if !capture.algorithms.is_empty() {
        config.capture.algorithms = capture.algorithms;
    }

    tracing::info!(
        size = config.capture.size,
        seed = config.capture.seed,
        algorithms = config.capture.algorithms.len(),
        "starting animation"
    );

    let stop = StopHandle::new();
    let ctrl_c = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.request_stop();
        }
    });

    let mut animator = Animator::new(config, TracingToneSink::new());
    let summary = animator.start(&mut ProgressObserver, &stop).await?;

    if let Some(session) = animator.session() {
        for stream in session.streams() {
            let viz = stream.visual();
            let sorted = stream.log().final_values().windows(2).all(|pair| pair[0] <= pair[1]);
            println!(
                "{:<22} compares={:<7} reads={:<7} writes={:<7} elapsed={:>9.3}ms sorted={}",
                viz.name,
                viz.compares(),
                viz.reads(),
                viz.writes(),
                viz.elapsed(),
                sorted
            );
        }
    }

    match summary.outcome {
        RunOutcome::Drained => tracing::info!(ticks = summary.ticks, "animation finished"),
        RunOutcome::Stopped => tracing::info!(ticks = summary.ticks, "animation interrupted"),
    }
    Ok(())
}

fn run_capture(capture: CaptureArgs, algorithm: Algorithm, with_events: bool) -> algoviz_core::Result<()> {
    let config = capture.load_config()?;
    let source = random_permutation(config.capture.size, &mut seeded_rng(config.capture.seed));
    tracing::info!(%algorithm, size = source.len(), "capturing");

    let log = capture_script(algorithm.label(), &source, |seq, cmp| algorithm.run(seq, cmp))?;

    let count = |field: Field| log.events().filter(|event| event.field == field).count();
    let mut report = serde_json::json!({
        "name": log.name,
        "source": source,
        "final": log.final_values(),
        "events": log.len(),
        "duration_ms": log.duration(),
        "compares": count(Field::Compares),
        "value_events": count(Field::Value),
    });
    if with_events {
        report["log"] = serde_json::to_value(&log)?;
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

struct ProgressObserver;

impl TickObserver for ProgressObserver {
    fn on_tick(&mut self, report: &TickReport, session: &PlaybackSession) {
        if report.tick % PROGRESS_EVERY != 0 && !report.drained {
            return;
        }
        let remaining: usize = session.streams().iter().map(|stream| stream.log().len()).sum();
        tracing::info!(
            tick = report.tick,
            remaining,
            clock = session.clock().elapsed,
            "progress"
        );
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animate array algorithms from recorded access logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record every configured algorithm against one seed array and animate them.
    Run {
        #[command(flatten)]
        capture: CaptureArgs,
        #[command(flatten)]
        playback: PlaybackArgs,
    },
    /// Capture a single algorithm and print its log statistics as JSON.
    Capture {
        #[command(flatten)]
        capture: CaptureArgs,
        /// Algorithm to capture.
        #[arg(short, long, default_value = "quick")]
        algorithm: Algorithm,
        /// Include the full event log in the output.
        #[arg(long)]
        events: bool,
    },
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Length of the random seed array.
    #[arg(long)]
    size: Option<usize>,
    /// RNG seed for a reproducible seed array.
    #[arg(long)]
    seed: Option<u64>,
    /// Algorithms to animate (repeatable). Defaults to all of them.
    #[arg(long = "algorithm", value_name = "NAME")]
    algorithms: Vec<Algorithm>,
}

impl CaptureArgs {
    fn load_config(&self) -> algoviz_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(size) = self.size {
            config.capture.size = size;
        }
        if self.seed.is_some() {
            config.capture.seed = self.seed;
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct PlaybackArgs {
    /// Replay by elapsed capture time instead of by operation count.
    #[arg(long)]
    by_time: bool,
    /// Play one algorithm at a time instead of all at once.
    #[arg(long)]
    sequential: bool,
    /// Tracked events consumed per tick when replaying by operation.
    #[arg(long)]
    steps: Option<usize>,
    /// Virtual clock advance per tick when replaying by time, in ms.
    #[arg(long)]
    step: Option<f64>,
    /// Delay between ticks, in ms.
    #[arg(long)]
    interval: Option<u64>,
    /// Comma separated fields that drive the step budget and tones.
    #[arg(long, value_delimiter = ',')]
    frames: Vec<Field>,
}

impl PlaybackArgs {
    fn apply(&self, config: &mut AppConfig) {
        let playback = &mut config.playback;
        if self.by_time {
            playback.by_operation = false;
        }
        if self.sequential {
            playback.concurrent = false;
        }
        if let Some(steps) = self.steps {
            playback.steps = steps;
        }
        if let Some(step) = self.step {
            playback.step = step;
        }
        if let Some(interval) = self.interval {
            playback.interval_ms = interval;
        }
        if !self.frames.is_empty() {
            playback.frames = self.frames.clone();
        }
    }
}
