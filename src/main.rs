use std::{
    io::{
        self,
        BufRead,
        Write,
    },
    path::PathBuf,
    process::ExitCode,
    sync::atomic::Ordering,
    thread,
    time::Duration,
};

use clap::{
    Parser,
    Subcommand,
};
use log::info;
use morphrank::{
    anki::{
        api::DEFAULT_ANKI_CONNECT_URL,
        AnkiConnectCollection,
    },
    cache::CardMorphCache,
    core::{
        config::RecalcConfig,
        pipeline::{
            new_extra_fields_selected,
            validate,
        },
        tasks::{
            TaskHandle,
            TaskManager,
            TaskResult,
        },
        MorphRankError,
    },
    dictionary::token_dictionary::{
        init_vibrato,
        DictType,
    },
    persistence::load_json_or_default,
    segmentation::{
        MorphemizerRegistry,
        VibratoMorphemizer,
    },
};

#[derive(Parser)]
#[command(name = "morphrank")]
#[command(about = "Reorders new Anki cards by the vocabulary they introduce", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rescore new cards, update their tags and fill the extra fields
    Recalc {
        /// Config file to use instead of the one in the app data directory
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_ANKI_CONNECT_URL)]
        anki_url: String,
        /// Tokenizer dictionary for the "japanese" morphemizer (unidic or ipadic)
        #[arg(long)]
        dictionary: Option<String>,
        /// Add missing extra fields without asking
        #[arg(long)]
        yes: bool,
    },
    /// Print the current config, or write the default one
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        init: bool,
    },
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

fn run_config(path: Option<PathBuf>, init: bool) -> Result<(), MorphRankError> {
    let path = path.unwrap_or_else(RecalcConfig::default_path);

    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else {
            RecalcConfig::default().save(&path)?;
            println!("Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let config: RecalcConfig = load_json_or_default(&path);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn build_registry(dictionary: Option<&str>) -> Result<MorphemizerRegistry, MorphRankError> {
    let mut registry = MorphemizerRegistry::with_builtin();

    if let Some(name) = dictionary {
        let dict_type = DictType::from_name(name).ok_or_else(|| {
            MorphRankError::Custom(format!("Unknown dictionary \"{}\", use unidic or ipadic", name))
        })?;
        let tokenizer = init_vibrato(&dict_type)?;
        registry.register(Box::new(VibratoMorphemizer::new(tokenizer, &dict_type)));
    }

    info!("Available morphemizers: {}", registry.names().join(", "));
    Ok(registry)
}

fn confirm(prompt: &str) -> Result<bool, MorphRankError> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn listen_for_cancel(handle: &TaskHandle) {
    let cancel_token = handle.cancel_token();

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    cancel_token.store(true, Ordering::Relaxed);
                    println!("Cancelling...");
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

fn run_recalc(
    config_path: Option<PathBuf>,
    anki_url: &str,
    dictionary: Option<&str>,
    yes: bool,
) -> Result<(), MorphRankError> {
    let config_path = config_path.unwrap_or_else(RecalcConfig::default_path);
    let config = RecalcConfig::load(&config_path)?;
    let registry = build_registry(dictionary)?;

    let collection = AnkiConnectCollection::new(anki_url)?;
    collection.check_connection()?;

    validate(&config, &collection, &registry)?;

    let new_fields = new_extra_fields_selected(&collection, &config)?;
    if !new_fields.is_empty() && !yes {
        for (note_type, fields) in &new_fields {
            println!("Note type \"{}\" is missing: {}", note_type, fields.join(", "));
        }
        if !confirm("Adding these fields requires a full sync of your collection. Continue?")? {
            println!("Recalc aborted");
            return Ok(());
        }
    }

    let manager = TaskManager::new();
    let mut handle = manager.start_recalc(
        Box::new(collection),
        config,
        registry,
        Some(CardMorphCache::default_path()),
    );
    println!("Recalc started, enter q to cancel");
    listen_for_cancel(&handle);

    loop {
        let result = match manager.recv_timeout(Duration::from_millis(200)) {
            Some(result) => result,
            // The worker sends its result before it exits.
            None if handle.is_finished() => manager.recv_timeout(Duration::ZERO).ok_or_else(|| {
                MorphRankError::Custom("Recalc stopped without a result".to_string())
            })?,
            None => continue,
        };

        match result {
            TaskResult::Progress(progress) => println!("{}", progress.label),
            TaskResult::Recalc(outcome) => {
                handle.join();
                return match outcome {
                    Ok(summary) => {
                        println!(
                            "Finished recalc ({:.2}s): {} cards and {} notes updated, {} cards offset",
                            summary.duration.as_secs_f32(),
                            summary.cards_updated,
                            summary.notes_updated,
                            summary.cards_offset
                        );
                        Ok(())
                    }
                    Err(e) if e.is_cancelled() => {
                        println!("Cancelled recalc");
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
            }
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Recalc { config, anki_url, dictionary, yes } => {
            run_recalc(config, &anki_url, dictionary.as_deref(), yes)
        }
        Commands::Config { config, init } => run_config(config, init),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
