use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gramevo::config::{AppConfig, ConfigManager};
use gramevo::engines::generation::{Chromosome, Mapper, OverflowPolicy, RampedHalfAndHalf};
use gramevo::grammar::Grammar;
use gramevo::types::Codon;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Grammar-driven derivation engine for evolutionary program synthesis
#[derive(Parser, Debug)]
#[command(name = "gramevo")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print recursion and depth analysis for every rule
    Analyze {
        /// Grammar file
        grammar: PathBuf,
    },

    /// Build a ramped half-and-half population
    Init {
        /// Config file (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Grammar file (overrides the config)
        #[arg(short, long)]
        grammar: Option<PathBuf>,

        /// Random seed (overrides the config)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Emit chromosomes instead of trees
        #[arg(long)]
        genomes: bool,

        /// With --genomes, draw random codons of the configured initial length
        /// instead of encoding ramped trees
        #[arg(long, requires = "genomes")]
        random: bool,

        /// Print JSON instead of source lines
        #[arg(long)]
        json: bool,
    },

    /// Map a single chromosome to a derivation
    Map {
        /// Grammar file
        #[arg(short, long)]
        grammar: PathBuf,

        /// Depth bound for the derivation
        #[arg(short = 'd', long)]
        max_depth: usize,

        /// Comma-separated codons, e.g. 12,7,201
        #[arg(long, value_delimiter = ',', required = true)]
        codons: Vec<Codon>,

        /// Wrap around when codons run out
        #[arg(long, conflicts_with = "extend")]
        wrap: bool,

        /// Append random codons up to this value when codons run out
        #[arg(long)]
        extend: Option<Codon>,

        /// Seed for codons appended by --extend
        #[arg(short, long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    match Args::parse().command {
        Commands::Analyze { grammar } => analyze(&grammar),
        Commands::Init {
            config,
            grammar,
            seed,
            genomes,
            random,
            json,
        } => init(config, grammar, seed, genomes, random, json),
        Commands::Map {
            grammar,
            max_depth,
            codons,
            wrap,
            extend,
            seed,
        } => map(&grammar, max_depth, codons, wrap, extend, seed),
    }
}

fn load_grammar(path: &Path) -> Result<Grammar> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read grammar {}", path.display()))?;
    Grammar::parse(&text).with_context(|| format!("invalid grammar {}", path.display()))
}

fn analyze(path: &Path) -> Result<()> {
    let grammar = load_grammar(path)?;
    println!("{:<20} {:>9} {:>9} {:>9}", "rule", "min", "max", "recursive");
    for (_, rule) in grammar.rules() {
        let min = rule
            .min_depth()
            .map_or_else(|| "inf".to_string(), |d| d.to_string());
        println!(
            "{:<20} {:>9} {:>9} {:>9}",
            format!("<{}>", rule.name()),
            min,
            rule.max_depth().to_string(),
            rule.is_recursive()
        );
    }
    Ok(())
}

fn init(
    config_path: Option<PathBuf>,
    grammar_path: Option<PathBuf>,
    seed: Option<u64>,
    genomes: bool,
    random: bool,
    json: bool,
) -> Result<()> {
    let manager = ConfigManager::new();
    if let Some(path) = &config_path {
        manager
            .load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
    }
    manager.update(|config: &mut AppConfig| {
        if let Some(path) = grammar_path {
            config.grammar.path = path;
        }
        if seed.is_some() {
            config.initialization.seed = seed;
        }
    })?;
    let config = manager.get();

    let grammar = config
        .grammar
        .load()
        .with_context(|| format!("failed to load grammar {}", config.grammar.path.display()))?;
    let grammar = Arc::new(grammar);
    let mut initializer =
        RampedHalfAndHalf::from_config(&config.initialization, Arc::clone(&grammar));

    if genomes {
        let chromosomes = if random {
            let mut rng = match config.initialization.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            config
                .genome
                .random_population(config.initialization.population_size, &mut rng)?
        } else {
            let policy = config.genome.overflow_policy()?;
            initializer.initial_chromosomes(policy, config.genome.max_codon)?
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&chromosomes)?);
        } else {
            for chromosome in &chromosomes {
                let codons: Vec<String> =
                    chromosome.codons().iter().map(|c| c.to_string()).collect();
                println!("{}", codons.join(","));
            }
        }
        return Ok(());
    }

    let population = initializer.initial_population()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&population)?);
    } else {
        for individual in &population {
            println!(
                "[{} d={}] {}",
                individual.method,
                individual.max_depth,
                individual.tree.to_source(&grammar, " ")
            );
        }
    }
    Ok(())
}

fn map(
    grammar_path: &Path,
    max_depth: usize,
    codons: Vec<Codon>,
    wrap: bool,
    extend: Option<Codon>,
    seed: u64,
) -> Result<()> {
    let grammar = Arc::new(load_grammar(grammar_path)?);
    let policy = match (wrap, extend) {
        (true, Some(_)) => bail!("--wrap and --extend are mutually exclusive"),
        (true, None) => OverflowPolicy::Wrap,
        (false, Some(max_codon)) => OverflowPolicy::Extend { max_codon },
        (false, None) => OverflowPolicy::Exhaust,
    };

    let chromosome = Chromosome::new(codons, policy)?;
    let mapper = Mapper::new(Arc::clone(&grammar), max_depth);
    let mut rng = StdRng::seed_from_u64(seed);
    let mapped = mapper.map(chromosome, &mut rng);

    match &mapped.tree {
        Some(tree) => println!("{}", tree.to_source(&grammar, " ")),
        None => println!("invalid: {:?}", mapped.validity),
    }
    println!(
        "codons used: {} of {}",
        mapped.codons_used,
        mapped.chromosome.len()
    );
    Ok(())
}
