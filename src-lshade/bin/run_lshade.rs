use clap::{Parser, ValueEnum};
use lshade::{
    CallbackAction, GenerationSnapshot, LShadeConfigBuilder, LShadeReport, ParallelConfig,
    lshade, run_recorded_lshade,
};
use ndarray::Array1;
use std::f64::consts::PI;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "run_lshade",
    about = "Run the L-SHADE optimizer on a selected benchmark function"
)]
struct Cli {
    /// Benchmark function to minimize
    #[arg(long, value_enum, default_value_t = Function::Sphere)]
    function: Function,

    /// Dimensionality of the problem
    #[arg(long, default_value_t = 5)]
    dim: usize,

    /// Initial population size
    #[arg(long, default_value_t = 50)]
    population: usize,

    /// Evaluation budget
    #[arg(long, default_value_t = 20_000)]
    max_evals: usize,

    /// Slots in the success-history memory
    #[arg(long, default_value_t = 6)]
    memory_size: usize,

    /// Stagnation threshold on the best fitness (omit to disable the early stop)
    #[arg(long)]
    precision: Option<f64>,

    /// Stagnating generations allowed over the whole run (default 2 * dim)
    #[arg(long)]
    countdown: Option<usize>,

    /// Optional random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Include the per-generation best fitness in the output
    #[arg(long)]
    history: bool,

    /// Print progress every N generations (0 = never); cannot be combined with --record-dir
    #[arg(long, default_value_t = 0, conflicts_with = "record_dir")]
    progress_every: usize,

    /// Disable parallel evaluation of the population
    #[arg(long)]
    no_parallel: bool,

    /// Number of threads for parallel evaluation (0 = use all available cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Record one CSV row per generation into this directory
    #[arg(long)]
    record_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Function {
    Sphere,
    Rastrigin,
    Rosenbrock,
    Ackley,
    Flat,
}

impl Function {
    fn bounds(self) -> (f64, f64) {
        match self {
            Function::Sphere | Function::Flat => (-10.0, 10.0),
            Function::Rastrigin => (-5.12, 5.12),
            Function::Rosenbrock => (-5.0, 10.0),
            Function::Ackley => (-32.768, 32.768),
        }
    }

    fn evaluate(self, x: &Array1<f64>) -> f64 {
        match self {
            Function::Sphere => x.iter().map(|v| v * v).sum(),
            Function::Rastrigin => {
                10.0 * x.len() as f64
                    + x.iter().map(|v| v * v - 10.0 * (2.0 * PI * v).cos()).sum::<f64>()
            }
            Function::Rosenbrock => x
                .windows(2)
                .into_iter()
                .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
                .sum(),
            Function::Ackley => {
                let n = x.len() as f64;
                let sum_sq = x.iter().map(|v| v * v).sum::<f64>() / n;
                let sum_cos = x.iter().map(|v| (2.0 * PI * v).cos()).sum::<f64>() / n;
                -20.0 * (-0.2 * sum_sq.sqrt()).exp() - sum_cos.exp() + 20.0 + std::f64::consts::E
            }
            Function::Flat => 0.0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Function::Sphere => "sphere",
            Function::Rastrigin => "rastrigin",
            Function::Rosenbrock => "rosenbrock",
            Function::Ackley => "ackley",
            Function::Flat => "flat",
        }
    }
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    if args.dim == 0 {
        eprintln!("Error: --dim must be at least 1.");
        process::exit(2);
    }

    let function = args.function;
    let objective = move |x: &Array1<f64>| function.evaluate(x);
    let bounds = vec![function.bounds(); args.dim];

    let mut builder = LShadeConfigBuilder::new()
        .population_size(args.population)
        .max_evals(args.max_evals)
        .memory_size(args.memory_size)
        .return_history(args.history)
        .parallel(ParallelConfig {
            enabled: !args.no_parallel,
            num_threads: (args.threads > 0).then_some(args.threads),
        });
    if let Some(precision) = args.precision {
        builder = builder.precision(precision);
    }
    if let Some(countdown) = args.countdown {
        builder = builder.max_evals_after_converge(countdown);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if args.progress_every > 0 {
        let every = args.progress_every;
        builder = builder.callback(Box::new(move |s: &GenerationSnapshot<'_>| {
            if s.generation % every == 0 {
                eprintln!(
                    "gen {:>5}  nfev {:>7}  pop {:>4}  best {:.6e}  countdown {}",
                    s.generation,
                    s.nfev,
                    s.population.nrows(),
                    s.best_fitness,
                    s.countdown
                );
            }
            CallbackAction::Continue
        }));
    }
    let config = builder.build();

    let result = match &args.record_dir {
        Some(dir) => run_recorded_lshade(function.name(), &objective, &bounds, config, dir)
            .map(|(report, path)| {
                eprintln!("Recorded generations to {}", path.display());
                report
            }),
        None => lshade(&objective, &bounds, config),
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {e}");
                process::exit(1);
            }
        }
    } else {
        print_report(function.name(), &report);
    }
}

fn print_report(name: &str, report: &LShadeReport) {
    println!("function    : {name}");
    println!("termination : {:?} ({})", report.termination, report.message);
    println!("generations : {}", report.nit);
    println!("evaluations : {}", report.nfev);
    println!("best f      : {:.6e}", report.fun);
    let x: Vec<String> = report.x.iter().map(|v| format!("{v:.6}")).collect();
    println!("best x      : [{}]", x.join(", "));
    if let Some(history) = &report.history {
        println!("history     : {} generations", history.len());
        for (i, v) in history.iter().enumerate() {
            println!("  {i:>5} {v:.6e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_conflicts_with_recording() {
        let parsed = Cli::try_parse_from(["run_lshade", "--progress-every", "5", "--record-dir", "out"]);
        assert_eq!(parsed.unwrap_err().kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_recording_alone_parses() {
        let cli = Cli::try_parse_from(["run_lshade", "--function", "rastrigin", "--record-dir", "out"]).unwrap();
        assert_eq!(cli.progress_every, 0);
        assert_eq!(cli.record_dir, Some(PathBuf::from("out")));
        assert!(matches!(cli.function, Function::Rastrigin));
    }
}
