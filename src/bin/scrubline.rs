use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scrubline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a scene file.
    Validate(ValidateArgs),
    /// Run a scene's script and write one JSON frame record per line.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Simulated display refresh rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Output JSON-lines path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print scheduler stats to stderr when done.
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn read_scene(path: &Path) -> anyhow::Result<scrubline::SceneDef> {
    let scene = scrubline::SceneDef::from_path(path)?;
    scene
        .validate()
        .with_context(|| format!("validate scene '{}'", path.display()))?;
    Ok(scene)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;
    println!(
        "ok: {} targets, {} objects, {} script steps",
        scene.targets.len(),
        scene.objects.len(),
        scene.script.steps.len()
    );
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;
    let mut sim = scrubline::Simulation::new(scene)?;

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => {
            let f = File::create(path)
                .with_context(|| format!("create output '{}'", path.display()))?;
            Box::new(BufWriter::new(f))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let frames = sim.run_with(args.fps, |record| {
        serde_json::to_writer(&mut out, record)
            .map_err(|e| scrubline::ScrublineError::serde(e.to_string()))?;
        out.write_all(b"\n")
            .map_err(|e| anyhow::Error::new(e).context("write frame record"))?;
        Ok(())
    })?;
    out.flush().with_context(|| "flush frame records")?;

    tracing::info!(frames, "simulation finished");
    if args.stats {
        let stats = serde_json::to_string(&sim.scheduler().stats())?;
        eprintln!("{stats}");
    }
    Ok(())
}
