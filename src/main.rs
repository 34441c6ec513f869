//! Aprendiz CLI
//!
//! Entry points for the two demos.
//!
//! # Usage
//!
//! ```bash
//! # Pattern demo: 200 training steps with the default student network
//! aprendiz pattern --steps 200
//!
//! # Pattern demo: auto-run cadence with a bottleneck student
//! aprendiz pattern --steps 100 --auto --variant compression
//!
//! # Inspect a training CSV
//! aprendiz inspect train.csv
//!
//! # Full survival pipeline with exports
//! aprendiz survival train.csv --test test.csv --out artifacts/
//! ```

use aprendiz::pattern::{ArchVariant, PatternSession, PixelGrid, RunState};
use aprendiz::survival::PipelineSession;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "aprendiz", about = "Small-network training demos", version)]
struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the pattern-gradient demo and render its grids
    Pattern(PatternArgs),
    /// Parse a training CSV and report per-column missing values
    Inspect(InspectArgs),
    /// Run the survival-classification pipeline end to end
    Survival(SurvivalArgs),
}

#[derive(Args)]
struct PatternArgs {
    /// Number of training steps to run
    #[arg(long, default_value_t = 100)]
    steps: usize,

    /// Student architecture: default, compression, or transformation
    #[arg(long, default_value = "default")]
    variant: String,

    /// Drive steps through the auto-run cadence instead of directly
    #[arg(long)]
    auto: bool,

    /// RNG seed for the input grid and weight initialization
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct InspectArgs {
    /// Training CSV path
    train: PathBuf,
}

#[derive(Args)]
struct SurvivalArgs {
    /// Training CSV path (must contain a Survived column)
    train: PathBuf,

    /// Test CSV path; enables prediction and export
    #[arg(long)]
    test: Option<PathBuf>,

    /// Append derived FamilySize / IsAlone features
    #[arg(long)]
    family_features: bool,

    /// Decision threshold for the validation report
    #[arg(long, default_value_t = 0.5)]
    threshold: f32,

    /// Output directory for submission.csv, probabilities.csv, model.json
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// RNG seed for weight initialization
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Pattern(args) => run_pattern(args, cli.quiet),
        Command::Inspect(args) => run_inspect(args),
        Command::Survival(args) => run_survival(args, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

const SHADES: &[u8] = b" .:-=+*#%@";

/// Render a grid as ASCII, darkest-to-brightest
fn render_grid(grid: &PixelGrid) -> String {
    let mut out = String::with_capacity((grid.width() + 1) * grid.height());
    for r in 0..grid.height() {
        for c in 0..grid.width() {
            let v = grid.get(r, c).clamp(0.0, 1.0);
            let idx = (v * (SHADES.len() - 1) as f32).round() as usize;
            out.push(SHADES[idx] as char);
        }
        out.push('\n');
    }
    out
}

fn run_pattern(args: PatternArgs, quiet: bool) -> Result<(), String> {
    let variant = ArchVariant::parse(&args.variant)
        .ok_or_else(|| format!("unknown architecture variant '{}'", args.variant))?;

    let mut session = PatternSession::new(variant, args.seed);

    if args.auto {
        session.toggle_auto();
        while session.step_count() < args.steps && session.run_state() == RunState::AutoRunning {
            session.tick();
        }
    } else {
        for _ in 0..args.steps {
            session.step().map_err(|e| e.to_string())?;
        }
    }

    if !quiet {
        println!("input:\n{}", render_grid(session.input()));
        println!("baseline:\n{}", render_grid(&session.baseline_prediction()));
        println!("student:\n{}", render_grid(&session.student_prediction()));
        for line in session.log_lines() {
            println!("> {line}");
        }
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let text = std::fs::read_to_string(&args.train).map_err(|e| e.to_string())?;
    let mut session = PipelineSession::new(0);
    session.load_train_csv(&text).map_err(|e| e.to_string())?;
    let report = session.inspect().map_err(|e| e.to_string())?;

    println!("{} rows", report.train_rows);
    for column in &report.columns {
        println!("  {}: {} missing", column.name, column.missing);
    }
    Ok(())
}

fn run_survival(args: SurvivalArgs, quiet: bool) -> Result<(), String> {
    let mut session = PipelineSession::new(args.seed);
    session.set_family_features(args.family_features);
    session.set_verbose(!quiet);

    let train_text = std::fs::read_to_string(&args.train).map_err(|e| e.to_string())?;
    let n = session.load_train_csv(&train_text).map_err(|e| e.to_string())?;
    if !quiet {
        println!("loaded {n} training rows");
    }

    if let Some(test_path) = &args.test {
        let test_text = std::fs::read_to_string(test_path).map_err(|e| e.to_string())?;
        let n = session.load_test_csv(&test_text).map_err(|e| e.to_string())?;
        if !quiet {
            println!("loaded {n} test rows");
        }
    }

    session.preprocess().map_err(|e| e.to_string())?;
    let params = session.create_model().map_err(|e| e.to_string())?;
    if !quiet {
        println!("classifier has {params} parameters");
    }

    let summary = session.train().map_err(|e| e.to_string())?;
    if !quiet {
        println!(
            "trained {} epochs{} (final loss {:.4}, best val {:.4})",
            summary.epochs_run,
            if summary.stopped_early {
                ", stopped early"
            } else {
                ""
            },
            summary.final_loss,
            summary.best_val_loss.unwrap_or(f32::NAN),
        );
    }

    let eval = session.evaluate(args.threshold).map_err(|e| e.to_string())?;
    let auc = session.auc().map_err(|e| e.to_string())?;
    println!(
        "threshold {:.2}: accuracy {:.3} precision {:.3} recall {:.3} f1 {:.3} auc {:.3}",
        eval.threshold, eval.accuracy, eval.precision, eval.recall, eval.f1, auc
    );
    println!(
        "confusion: tp={} fp={} tn={} fn={}",
        eval.counts.tp, eval.counts.fp, eval.counts.tn, eval.counts.fnegative
    );

    if !quiet {
        println!("feature importance:");
        for (name, score) in session.feature_importance().map_err(|e| e.to_string())? {
            println!("  {name}: {score:.4}");
        }
    }

    if args.test.is_some() {
        let n = session.predict().map_err(|e| e.to_string())?;
        std::fs::create_dir_all(&args.out).map_err(|e| e.to_string())?;
        session.export(&args.out).map_err(|e| e.to_string())?;
        if !quiet {
            println!("exported {n} predictions to {}", args.out.display());
        }
    }
    Ok(())
}
