use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::{
    error::Error,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wordgroup::{
    app_dirs::AppDirs, config::ConfigKey, language::Language, AdaptiveEngine, JsonFileBackend,
    SqliteBackend, StatsBackend, TestResults, WordStatsStore,
};

/// adaptive word-group practice for typing trainers
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Tracks how fast you type each word, splits a word list into practice groups \
                  and serves the words you have not yet beaten at your target speed."
)]
pub struct Cli {
    /// storage format for word statistics
    #[clap(long, value_enum, default_value_t = BackendKind::Json)]
    backend: BackendKind,

    /// path of the statistics file (defaults to the state directory)
    #[clap(long)]
    state: Option<PathBuf>,

    /// built-in language to pull words from
    #[clap(short = 'l', long, default_value = "english")]
    language: String,

    /// plain text word list, one word per line (overrides --language)
    #[clap(short = 'f', long)]
    words: Option<PathBuf>,

    /// only practise the first N words of the list
    #[clap(short = 'n', long)]
    limit: Option<usize>,

    /// seed for reproducible word selection
    #[clap(long)]
    seed: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum BackendKind {
    Json,
    Sqlite,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// print the next words to type
    Next {
        #[clap(short = 'c', long, default_value_t = 15)]
        count: usize,
    },
    /// apply a completed test result (JSON, from a file or stdin)
    Record { file: Option<PathBuf> },
    /// show the statistics of one word
    Word { word: String },
    /// list the current group's words with their statistics
    List {
        /// list the whole word list instead of the current group
        #[clap(long)]
        all: bool,
    },
    /// forget the data of one word, or of the whole word list
    Reset { word: Option<String> },
    /// read or change practice settings
    Config {
        #[clap(subcommand)]
        action: ConfigAction,
    },
    /// write all statistics and settings as JSON ("-" for stdout)
    Export { output: Option<PathBuf> },
    /// replace all statistics and settings from an exported JSON file
    Import { file: PathBuf },
    /// per-word statistics as CSV
    Report { output: Option<PathBuf> },
    /// list the built-in languages
    Languages,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// print one setting, or all known settings
    Get { key: Option<String> },
    Set { key: String, value: String },
}

impl Cli {
    fn state_path(&self) -> Option<PathBuf> {
        self.state.clone().or_else(|| match self.backend {
            BackendKind::Json => AppDirs::json_path(),
            BackendKind::Sqlite => AppDirs::db_path(),
        })
    }

    fn open_backend(&self) -> Result<Box<dyn StatsBackend>, Box<dyn Error>> {
        let path = self.state_path().ok_or("unable to determine a state directory")?;
        debug!(path = %path.display(), backend = %self.backend, "opening statistics");
        let backend: Box<dyn StatsBackend> = match self.backend {
            BackendKind::Json => Box::new(JsonFileBackend::with_path(path)),
            BackendKind::Sqlite => Box::new(SqliteBackend::open(path)?),
        };
        Ok(backend)
    }

    fn word_list(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let lang = match &self.words {
            Some(path) => Language::from_file(path)?,
            None => Language::builtin(&self.language)?,
        };
        Ok(lang.wordset(self.limit).into_words())
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("WORDGROUP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::Languages = cli.command {
        for name in Language::builtin_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let store = WordStatsStore::open(cli.open_backend()?)?;
    let mut engine = match cli.seed {
        Some(seed) => AdaptiveEngine::with_seed(store, seed),
        None => AdaptiveEngine::new(store),
    };
    engine.subscribe(|event, _| debug!(event = event.name(), "practice event"));
    engine.announce_config();

    let words = cli.word_list()?;
    engine.on_word_list_observed(&words);

    run(&cli, &mut engine, &words)?;

    engine.deactivate()?;
    Ok(())
}

fn run(
    cli: &Cli,
    engine: &mut AdaptiveEngine<Box<dyn StatsBackend>>,
    words: &[String],
) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Command::Next { count } => {
            let served: Vec<String> = (0..*count).filter_map(|_| engine.next_word(words)).collect();
            println!("{}", served.join(" "));
        }
        Command::Record { file } => {
            let text = match file {
                Some(path) => fs::read_to_string(path)?,
                None => io::read_to_string(io::stdin())?,
            };
            let results: TestResults = serde_json::from_str(&text)?;
            record(engine, &results);
        }
        Command::Word { word } => {
            let summary = engine.store().summary(word);
            let status = engine.word_status(word);
            println!("word:      {}", summary.word);
            println!("typed:     {}", summary.typed);
            println!("missed:    {}", summary.missed);
            println!("worst:     {:.2}", summary.worst);
            println!("mean:      {:.2}", summary.mean);
            println!("median:    {:.2}", summary.median);
            println!("best:      {:.2}", summary.best);
            println!("complete:  {:.0}%", status.completion * 100.0);
        }
        Command::List { all } => {
            let listed = if *all {
                engine.sorted_words(words)
            } else {
                engine.sorted_current_words()
            };
            print_word_table(engine, &listed);
        }
        Command::Reset { word } => match word {
            Some(word) => {
                engine.reset_word(word);
                println!("reset {word}");
            }
            None => {
                engine.reset_current_words();
                println!("reset {} words", words.len());
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Get { key: Some(key) } => {
                println!("{}", engine.store().config_value(key).unwrap_or_default());
            }
            ConfigAction::Get { key: None } => {
                let config = engine.config();
                println!("{}={}", ConfigKey::Sorter, config.sorter());
                println!("{}={}", ConfigKey::TargetSpeed, config.target_speed());
                println!("{}={}", ConfigKey::GroupSize, config.group_size());
                println!(
                    "{}={}",
                    ConfigKey::AnimationsEnabled,
                    u8::from(config.animations_enabled())
                );
                println!(
                    "{}={}",
                    ConfigKey::UnbeatenWordPercentage,
                    config.unbeaten_word_percentage()
                );
            }
            ConfigAction::Set { key, value } => {
                if engine.set_config(key, value)? {
                    println!("{key}={value}");
                } else {
                    println!("{key} unchanged");
                }
            }
        },
        Command::Export { output } => {
            let json = engine.export_json()?;
            match output.as_deref() {
                Some(path) if path == Path::new("-") => println!("{json}"),
                Some(path) => fs::write(path, json)?,
                None => {
                    let stamp = Local::now().format("%Y%m%d-%H%M%S");
                    let path = format!("wordgroup-export-{stamp}.json");
                    fs::write(&path, json)?;
                    println!("{path}");
                }
            }
        }
        Command::Import { file } => {
            let text = fs::read_to_string(file)?;
            engine.import_all(&text)?;
            println!("imported {}", file.display());
        }
        Command::Report { output } => {
            let out: Box<dyn Write> = match output {
                Some(path) => Box::new(fs::File::create(path)?),
                None => Box::new(io::stdout()),
            };
            write_report(engine, words, out)?;
        }
        Command::Languages => {}
    }
    Ok(())
}

fn record(engine: &mut AdaptiveEngine<Box<dyn StatsBackend>>, results: &TestResults) {
    engine.on_test_completed(results);

    let total = engine.total_progress();
    let group = engine.group_progress();
    println!("target speed: {}", engine.target_speed());
    match (engine.current_position(), engine.current_group()) {
        (Some(position), Some(current)) => println!(
            "group {}/{} threshold {}",
            position + 1,
            engine.groups().len(),
            current.threshold()
        ),
        _ => println!("no groups"),
    }
    println!("group progress: {}/{} ({:.0}%)", group.beaten, group.total, group.percent());
    println!("total progress: {}/{} ({:.0}%)", total.beaten, total.total, total.percent());
}

fn print_word_table(engine: &AdaptiveEngine<Box<dyn StatsBackend>>, words: &[String]) {
    println!("{:<20} {:>6} {:>6} {:>8} {:>6}", "word", "typed", "missed", "median", "status");
    for word in words {
        let summary = engine.store().summary(word);
        let status = engine.word_status(word);
        let mark = if status.beaten_at_target {
            "done"
        } else if status.beaten_at_group {
            "group"
        } else {
            ""
        };
        println!(
            "{:<20} {:>6} {:>6} {:>8.2} {:>6}",
            word, summary.typed, summary.missed, summary.median, mark
        );
    }
}

fn write_report<W: Write>(
    engine: &AdaptiveEngine<Box<dyn StatsBackend>>,
    words: &[String],
    out: W,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(out);
    let mut unique = words.to_vec();
    unique.sort();
    unique.dedup();
    for word in &unique {
        writer.serialize(engine.store().summary(word))?;
    }
    writer.flush()?;
    Ok(())
}
