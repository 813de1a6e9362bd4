use clap::{Args, Parser, Subcommand};
use prime_art::{
    classify_many, estimated_attempts, DigitArt, PrimalityOracle, SearchError, SearchHandle,
    SearchProgress, SearchReport, SearchSettings,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "prime-art")]
#[command(
    about = "Turn digit art into a nearby probable prime by perturbing digits",
    long_about = None
)]
struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging (RUST_LOG overrides)")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Test a single number with Miller-Rabin")]
    Check {
        #[arg(help = "The number to test")]
        number: String,

        #[arg(short, long, default_value = "8")]
        rounds: u32,
    },

    #[command(about = "Test many numbers in parallel")]
    Batch {
        #[arg(required = true, help = "The numbers to test")]
        numbers: Vec<String>,

        #[arg(short, long, default_value = "8")]
        rounds: u32,
    },

    #[command(about = "Search for a probable prime close to a seed or digit art")]
    Find(FindArgs),

    #[command(about = "Estimate how many attempts a seed of this length needs")]
    Estimate {
        #[arg(help = "Number of digits in the seed")]
        digits: usize,
    },

    #[command(about = "Generate a default search configuration file")]
    InitConfig {
        #[arg(help = "Output file path (default: prime_art_config.json)")]
        output: Option<String>,
    },
}

#[derive(Args)]
struct FindArgs {
    #[arg(long, conflicts_with = "art", help = "Seed digit string")]
    seed: Option<String>,

    #[arg(long, help = "Digit art text file; rows are concatenated into the seed")]
    art: Option<PathBuf>,

    #[arg(long, help = "Configuration file (JSON) - CLI options override config file values")]
    config: Option<PathBuf>,

    #[arg(long, help = "Digits allowed as replacements (overrides config file)")]
    alphabet: Option<String>,

    #[arg(short, long, help = "Miller-Rabin rounds (overrides config file)")]
    rounds: Option<u32>,

    #[arg(short = 'p', long, help = "Attempts between progress reports (overrides config file)")]
    progress_interval: Option<u64>,

    #[arg(long, help = "Maximum digits changed per attempt (overrides config file)")]
    max_changes: Option<usize>,

    #[arg(long, help = "Verdict cache size in entries, 0 disables (overrides config file)")]
    cache_capacity: Option<usize>,

    #[arg(long, help = "Seed for the random number generators (overrides config file)")]
    rng_seed: Option<u64>,

    #[arg(short, long, help = "Cancel the search after this many seconds (overrides config file)")]
    timeout_secs: Option<u64>,

    #[arg(short, long, help = "Output file for the search report (JSON)")]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { number, rounds } => {
            check_number(&number, rounds);
        }
        Commands::Batch { numbers, rounds } => {
            check_batch(&numbers, rounds);
        }
        Commands::Find(args) => {
            find_from_config(args);
        }
        Commands::Estimate { digits } => {
            println!(
                "Expected attempts for a {}-digit seed: ~{:.0} (heuristic, not a bound)",
                digits,
                estimated_attempts(digits)
            );
        }
        Commands::InitConfig { output } => {
            init_config_file(output.as_deref().unwrap_or("prime_art_config.json"));
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn check_number(number: &str, rounds: u32) {
    let mut oracle = PrimalityOracle::new().rounds(rounds);
    let start_time = Instant::now();

    match oracle.is_prime_str(number) {
        Ok(verdict) => {
            println!("Number: {}", preview(number, 100));
            println!("Digits: {}", number.len());
            println!("Rounds: {}", oracle.round_count());
            if verdict {
                println!("Result: PROBABLY PRIME");
            } else {
                println!("Result: COMPOSITE");
            }
            println!("\nTime elapsed: {:.3}s", start_time.elapsed().as_secs_f64());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn check_batch(numbers: &[String], rounds: u32) {
    let start_time = Instant::now();
    let verdicts = classify_many(numbers, rounds);
    let mut failures = 0;

    for (number, verdict) in numbers.iter().zip(verdicts) {
        match verdict {
            Ok(true) => println!("{:<40} probably prime", preview(number, 40)),
            Ok(false) => println!("{:<40} composite", preview(number, 40)),
            Err(e) => {
                failures += 1;
                println!("{:<40} error: {}", preview(number, 40), e);
            }
        }
    }

    info!(
        count = numbers.len(),
        elapsed = format_args!("{:.3}s", start_time.elapsed().as_secs_f64()),
        "batch complete"
    );

    if failures > 0 {
        std::process::exit(1);
    }
}

fn init_config_file(output: &str) {
    let settings = SearchSettings::default();

    match settings.save_to_file(Path::new(output)) {
        Ok(_) => {
            println!("Default configuration file created: {}", output);
            print_settings(&settings);
            println!("\nYou can now edit this file and use:");
            println!("  cargo run --release -- find --config {} --art picture.txt", output);
        }
        Err(e) => {
            eprintln!("Error creating config file: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_settings(settings: &SearchSettings) {
    println!("  Alphabet:          {}", settings.alphabet);
    println!("  Rounds:            {}", settings.rounds);
    println!("  Progress interval: {} attempts", settings.progress_interval);
    println!("  Max changes:       {}", settings.max_changes);
    match settings.cache_capacity {
        Some(capacity) => println!("  Cache capacity:    {} entries", capacity),
        None => println!("  Cache capacity:    unbounded"),
    }
    if let Some(seed) = settings.rng_seed {
        println!("  RNG seed:          {}", seed);
    }
    if let Some(secs) = settings.timeout_secs {
        println!("  Timeout:           {}s", secs);
    }
}

fn find_from_config(args: FindArgs) {
    // Load config from file or use defaults
    let mut settings = if let Some(config_path) = &args.config {
        match SearchSettings::load_from_file(config_path) {
            Ok(s) => {
                info!(path = %config_path.display(), "loaded configuration");
                s
            }
            Err(e) => {
                eprintln!("Error loading config file '{}': {}", config_path.display(), e);
                std::process::exit(1);
            }
        }
    } else {
        SearchSettings::default()
    };

    // Apply CLI overrides
    if let Some(v) = args.alphabet {
        settings.alphabet = v;
    }
    if let Some(v) = args.rounds {
        settings.rounds = v;
    }
    if let Some(v) = args.progress_interval {
        settings.progress_interval = v;
    }
    if let Some(v) = args.max_changes {
        settings.max_changes = v;
    }
    if let Some(v) = args.cache_capacity {
        settings.cache_capacity = Some(v);
    }
    if let Some(v) = args.rng_seed {
        settings.rng_seed = Some(v);
    }
    if let Some(v) = args.timeout_secs {
        settings.timeout_secs = Some(v);
    }

    let (seed, art) = match (args.seed, args.art) {
        (Some(seed), _) => (seed, None),
        (None, Some(path)) => {
            let art = match prime_art::io_utils::load_text(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| DigitArt::from_text(&text).map_err(|e| e.to_string()))
            {
                Ok(art) => art,
                Err(e) => {
                    eprintln!("Error reading art file '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            };
            (art.seed(), Some(art))
        }
        (None, None) => {
            eprintln!("Error: provide either --seed or --art");
            std::process::exit(1);
        }
    };

    // The search is cooperative: one thread, with the timer and Ctrl-C
    // tasks running whenever the search yields.
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run_search(settings, seed, art, args.output));
    if code != 0 {
        std::process::exit(code);
    }
}

async fn run_search(
    settings: SearchSettings,
    seed: String,
    art: Option<DigitArt>,
    output: Option<PathBuf>,
) -> i32 {
    let (mut search, alphabet) = match settings.build() {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("========================================");
    println!("  PRIME ART SEARCH");
    println!("========================================");
    println!("Seed: {} ({} digits)", preview(&seed, 60), seed.len());
    print_settings(&settings);
    println!("Expected attempts: ~{:.0}", estimated_attempts(seed.len()));
    println!("========================================\n");

    let handle = SearchHandle::new();

    if let Some(secs) = settings.timeout_secs {
        let timer = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            if timer.cancel() {
                warn!(timeout_secs = secs, "timeout reached, cancelling search");
            }
        });
    }

    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && interrupt.cancel() {
            warn!("interrupt received, cancelling search");
        }
    });

    let start_time = Instant::now();
    let mut attempts = 1u64;

    let result = search
        .find_prime(
            &seed,
            &alphabet,
            |progress: &SearchProgress| {
                attempts = progress.attempts;
                let elapsed = start_time.elapsed().as_secs_f64();
                let speed = if elapsed > 0.0 { progress.attempts as f64 / elapsed } else { 0.0 };
                println!(
                    "[Progress] Attempt: {:<10} | Changed: {:<6} | Speed: {:.0} att/s | Trying: {}",
                    progress.attempts,
                    progress.changed_index.map_or_else(|| "-".to_string(), |i| i.to_string()),
                    speed,
                    preview(&progress.candidate, 40)
                );
            },
            Some(&handle),
        )
        .await;

    let elapsed = start_time.elapsed();

    match result {
        Ok(prime) => {
            let stats = search.oracle().cache_stats();
            let report = SearchReport::new(
                &seed,
                &prime,
                attempts,
                search.oracle().round_count(),
                elapsed.as_secs_f64(),
                stats,
            );

            println!("\n========================================");
            println!("  PROBABLE PRIME FOUND");
            println!("========================================");
            println!("Attempts: {}", report.attempts);
            println!("Digits changed: {}", report.changed_digits);
            println!("Time: {:.3}s", report.elapsed_secs);
            println!("Cache: {} entries, {:.1}% hit rate", stats.entries, stats.hit_rate * 100.0);
            println!();

            match art.as_ref().map(|a| a.render(&prime)) {
                Some(Ok(rendered)) => println!("{}", rendered),
                _ => println!("{}", prime),
            }
            println!("========================================");

            if let Some(path) = output {
                match report.save(&path) {
                    Ok(_) => info!(path = %path.display(), "report saved"),
                    Err(e) => eprintln!("Warning: Failed to save report: {}", e),
                }
            }
            0
        }
        Err(SearchError::Cancelled) => {
            eprintln!(
                "\nSearch cancelled after {:.3}s ({} attempts reported)",
                elapsed.as_secs_f64(),
                attempts
            );
            2
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn preview(digits: &str, max: usize) -> String {
    let count = digits.chars().count();
    if count > max {
        format!("{}... ({} digits)", digits.chars().take(max).collect::<String>(), count)
    } else {
        digits.to_string()
    }
}
