//! rbfsvm Command Line Interface
//!
//! Trains an RBF SVM on a delimited text file and writes the model, evaluates
//! a saved model on held-out data, or summarizes a model file.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};
use rbfsvm::persistence::{self, TrainingSummary};
use rbfsvm::{
    AccuracyEvaluator, CSVLoader, ExecutionBackend, Parallel, Result, SVMModel, SVMOptimizer,
    Sequential, TrainingConfig, TrainingSet, TrainingStatus,
};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "rbfsvm")]
#[command(about = "Train binary RBF-kernel SVMs with parallel SMO")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "rbfsvm contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new SVM model
    Train(TrainArgs),
    /// Evaluate a model on labelled data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Number of attributes (features) per example
    #[arg(short = 'a', long = "num-att")]
    num_attributes: usize,

    /// Number of training examples
    #[arg(short = 'x', long = "num-ex")]
    num_examples: usize,

    /// Path to the training file
    #[arg(short = 'f', long = "file-path")]
    file_path: PathBuf,

    /// Path of the model to be saved
    #[arg(short = 'm', long)]
    model: PathBuf,

    /// Parameter C of the SVM
    #[arg(short = 'c', long = "cost", default_value_t = TrainingConfig::DEFAULT_C)]
    c: f64,

    /// Parameter gamma of the radial basis function exp(-gamma*|u-v|^2) [default: 1/num-att]
    #[arg(short = 'g', long)]
    gamma: Option<f64>,

    /// Tolerance of termination criterion
    #[arg(short = 'e', long, default_value_t = TrainingConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Maximum number of iterations
    #[arg(short = 'n', long = "max-iter", default_value_t = TrainingConfig::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Size of the kernel cache in rows
    #[arg(short = 's', long = "cache-size", default_value_t = TrainingConfig::DEFAULT_CACHE_SIZE)]
    cache_size: usize,

    #[command(flatten)]
    backend: BackendArgs,

    /// Write a JSON summary of the run
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Execution backend selection shared by `train` and `evaluate`
#[derive(Args)]
struct BackendArgs {
    /// Worker threads for the parallel backend [default: all cores]
    #[arg(long)]
    threads: Option<usize>,

    /// Run every step on the calling thread
    #[arg(long, conflicts_with = "threads")]
    sequential: bool,
}

impl BackendArgs {
    /// Size the rayon pool if requested; call before any parallel work
    fn init(&self) {
        if let Some(threads) = self.threads {
            if !Parallel::init_global_pool(threads) {
                warn!("Thread pool already initialized; ignoring --threads {threads}");
            }
        }
        if !self.sequential {
            info!("Using {} worker threads", Parallel.threads());
        }
    }
}

impl TrainArgs {
    fn config(&self) -> TrainingConfig {
        let defaults = TrainingConfig::for_attributes(self.num_attributes);
        TrainingConfig {
            c: self.c,
            gamma: self.gamma.unwrap_or(defaults.gamma),
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            cache_size: self.cache_size,
        }
    }
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short = 'm', long)]
    model: PathBuf,

    /// Labelled data file
    #[arg(short = 'f', long = "file-path")]
    file_path: PathBuf,

    /// Number of attributes (features) per example
    #[arg(short = 'a', long = "num-att")]
    num_attributes: usize,

    /// Number of examples
    #[arg(short = 'x', long = "num-ex")]
    num_examples: usize,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,

    #[command(flatten)]
    backend: BackendArgs,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn train_command(args: TrainArgs) -> Result<()> {
    let config = args.config();
    config.validate()?;

    args.backend.init();

    println!(
        "{}, {}: {}",
        args.num_examples,
        args.num_attributes,
        args.file_path.display()
    );
    let data = CSVLoader::new(args.num_examples, args.num_attributes).load_file(&args.file_path)?;
    println!("Populated data from input file");

    let (positive, negative) = data.class_counts();
    info!("Class balance: {positive} positive, {negative} negative");
    info!(
        "Parameters: C={}, gamma={}, epsilon={}, max_iter={}, cache_size={}",
        config.c, config.gamma, config.epsilon, config.max_iterations, config.cache_size
    );

    if args.backend.sequential {
        run_training(&args, &data, config, Sequential)
    } else {
        run_training(&args, &data, config, Parallel)
    }
}

fn run_training<B: ExecutionBackend + Clone>(
    args: &TrainArgs,
    data: &TrainingSet,
    config: TrainingConfig,
    backend: B,
) -> Result<()> {
    info!("Training on the {} backend", backend.name());

    let start = Instant::now();
    let run = SVMOptimizer::new(config.clone(), backend.clone()).train(data)?;
    let elapsed = start.elapsed().as_secs_f64();
    println!("TOTAL TIME TAKEN in seconds: {elapsed:.3}");

    let result = &run.result;
    match result.status {
        TrainingStatus::Converged => {
            println!("Converged at iteration number: {}", result.iterations)
        }
        _ => println!(
            "Could not converge in {} iterations. SVM training has been stopped",
            result.iterations
        ),
    }
    println!("b: {}", result.b);

    let accuracy = AccuracyEvaluator::new(backend.clone()).evaluate(&run.model, data)?;
    println!("Training accuracy: {accuracy}");

    persistence::save_model(&args.model, &run.model)?;
    println!(
        "Training model has been saved to the file {}",
        args.model.display()
    );

    if let Some(path) = &args.summary {
        TrainingSummary::new(
            &config,
            backend.name(),
            data.len(),
            data.num_attributes(),
            result,
            elapsed,
        )
        .with_training_accuracy(accuracy)
        .save_to_file(path)?;
        info!("Summary saved to: {}", path.display());
    }

    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    args.backend.init();

    info!("Loading model from: {}", args.model.display());
    let model = persistence::load_model(&args.model)?;
    let data = CSVLoader::new(args.num_examples, args.num_attributes).load_file(&args.file_path)?;

    let metrics = if args.backend.sequential {
        AccuracyEvaluator::new(Sequential).evaluate_detailed(&model, &data)?
    } else {
        AccuracyEvaluator::new(Parallel).evaluate_detailed(&model, &data)?
    };

    println!("=== Model Evaluation ===");
    println!("Support vectors: {}", model.n_support_vectors());
    println!("Accuracy: {:.2}%", metrics.accuracy() * 100.0);

    if args.detailed {
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    let model = persistence::load_model(&args.model)?;

    println!("=== SVM Model Summary ===");
    println!("Gamma: {}", model.gamma());
    println!("Bias: {:.6}", model.bias());
    println!("Support Vectors: {}", model.n_support_vectors());
    println!("Attributes: {}", model.num_attributes());

    let (positive, negative) = model
        .labels()
        .iter()
        .fold((0, 0), |(p, n), &y| if y > 0.0 { (p + 1, n) } else { (p, n + 1) });
    println!("  Positive: {positive}");
    println!("  Negative: {negative}");

    let alpha = model.alpha_values();
    let n_show = alpha.len().min(10);
    if n_show > 0 {
        println!("\nAlpha values:");
        for (i, value) in alpha.iter().enumerate().take(n_show) {
            println!("  α{i}: {value:.6}");
        }
        if alpha.len() > n_show {
            println!("  ... ({} more)", alpha.len() - n_show);
        }
    }

    Ok(())
}
