use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process;

use govloop_core::{
    hash_value, AstBuilder, CostEvaluator, CycleRecord, SemanticHasher, Summary, SynonymTable,
    Tokenizer,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// govloop — semantic hashing and cost/benefit evaluation for governance loops
///
/// Tokenize, canonicalize, and hash governance statements; evaluate cycle
/// cost/benefit ledgers.
#[derive(Parser)]
#[command(name = "govloop", version, about, long_about = None)]
struct Cli {
    /// JSON synonym table merged over the built-in one
    #[arg(long, global = true)]
    synonyms: Option<PathBuf>,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split text into typed, canonical tokens
    Tokenize {
        /// Governance statement
        text: String,
        /// Language code, or "auto" to detect
        #[arg(long, default_value = "auto")]
        language: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the semantic AST as JSON
    Ast {
        /// Governance statement
        text: String,
        /// Language code, or "auto" to detect
        #[arg(long, default_value = "auto")]
        language: String,
    },

    /// Print the semantic canonical form
    Canonicalize {
        /// Governance statement
        text: String,
        /// Language code, or "auto" to detect
        #[arg(long, default_value = "auto")]
        language: String,
    },

    /// Compute the semantic hash of a statement
    Hash {
        /// Governance statement
        text: String,
        /// Language code, or "auto" to detect
        #[arg(long, default_value = "auto")]
        language: String,
        /// Print bare hex without the sha256: prefix
        #[arg(long)]
        bare: bool,
    },

    /// Compute the structural hash of a JSON document
    HashJson {
        /// Path to .json file
        file: PathBuf,
        /// Top-level field to leave out (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,
        /// Print bare hex without the sha256: prefix
        #[arg(long)]
        bare: bool,
    },

    /// Replay a cycle ledger through the cost evaluator
    Evaluate {
        /// Path to .json file holding [{"cost": {...}, "benefit": {...}}]
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_hasher(synonyms: Option<&Path>) -> govloop_core::Result<SemanticHasher> {
    let mut table = SynonymTable::builtin();
    if let Some(path) = synonyms {
        debug!(path = %path.display(), "Loading synonym overlay");
        table.merge(SynonymTable::from_path(path)?);
    }
    Ok(SemanticHasher::new(Tokenizer::new(table)))
}

fn run(cli: Cli) -> govloop_core::Result<i32> {
    let hasher = build_hasher(cli.synonyms.as_deref())?;

    match cli.command {
        Commands::Tokenize {
            text,
            language,
            json,
        } => {
            let tokens = hasher.tokenizer().tokenize(&text, &language);
            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for token in &tokens {
                    println!(
                        "{:<12} {:<24} {}",
                        token.token_type.to_string().cyan(),
                        token.raw_value,
                        token.canonical_value
                    );
                }
            }
            Ok(0)
        }
        Commands::Ast { text, language } => {
            let tokens = hasher.tokenizer().tokenize(&text, &language);
            let ast = AstBuilder::build(&tokens);
            println!("{}", serde_json::to_string_pretty(&ast.to_dict())?);
            Ok(0)
        }
        Commands::Canonicalize { text, language } => {
            println!("{}", hasher.canonicalizer().text(&text, &language));
            Ok(0)
        }
        Commands::Hash {
            text,
            language,
            bare,
        } => {
            let hash = hasher.hash_text(&text, &language);
            println!("{}", if bare { hash.hex() } else { hash.prefixed() });
            Ok(0)
        }
        Commands::HashJson {
            file,
            exclude,
            bare,
        } => {
            let text = std::fs::read_to_string(&file)?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            let exclude: Vec<&str> = exclude.iter().map(String::as_str).collect();
            let hash = hash_value(&value, &exclude);
            println!("{}", if bare { hash.hex() } else { hash.prefixed() });
            Ok(0)
        }
        Commands::Evaluate { file, json } => {
            let text = std::fs::read_to_string(&file)?;
            let records: Vec<CycleRecord> = serde_json::from_str(&text)?;
            evaluate(records, json)
        }
        Commands::Version => {
            println!(
                "govloop {} (govloop-core {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_VERSION")
            );
            Ok(0)
        }
    }
}

fn evaluate(records: Vec<CycleRecord>, json: bool) -> govloop_core::Result<i32> {
    let mut evaluator = CostEvaluator::new();
    for record in records {
        evaluator.record(record);
    }
    let summary = evaluator.summary();

    if json {
        let history: Vec<serde_json::Value> = evaluator
            .history()
            .iter()
            .map(|s| {
                let mut dict = s.to_dict();
                dict["evidence_hash"] = serde_json::Value::String(s.evidence_hash().prefixed());
                dict
            })
            .collect();
        let out = serde_json::json!({
            "history": history,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(0);
    }

    for snap in evaluator.history() {
        println!(
            "{:<12} roi {:>9.4}  marginal {:>9.4}  {:<18} confidence {:.2}  {}",
            snap.cycle_id,
            snap.roi,
            snap.marginal_roi,
            snap.trend.to_string(),
            snap.confidence,
            snap.evidence_hash().prefixed().dimmed()
        );
    }

    match &summary {
        Summary::NoData { .. } => println!("{}", "no_data: no cycles recorded".yellow()),
        Summary::Positive(r) | Summary::Negative(r) => {
            let status = if matches!(summary, Summary::Positive(_)) {
                summary.status().green().bold()
            } else {
                summary.status().red().bold()
            };
            println!(
                "{} after {} cycle(s): roi {:.4}, trend {}, recommendation {}",
                status, r.cycles, r.roi, r.trend, r.recommendation
            );
        }
    }
    Ok(0)
}
