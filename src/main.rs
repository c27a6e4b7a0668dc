//! NBA matchup prediction CLI
//!
//! Predicts the winner of a head-to-head game from the stored matchup history.

use clap::{Parser, Subcommand};
use nba::{Config, Result};

#[derive(Parser)]
#[command(name = "nba")]
#[command(about = "NBA matchup win prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dataset management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Predict the winner of a matchup
    Predict {
        /// First team abbreviation; the prediction is from its point of view
        #[arg(long)]
        team1: Option<String>,
        /// Opponent abbreviation
        #[arg(long)]
        team2: Option<String>,
        /// 1 if team1 plays at home, 0 otherwise
        #[arg(long)]
        home: Option<String>,
        /// Raw query string, e.g. "team1=BOS&team2=LAL&home=1"
        #[arg(long)]
        query: Option<String>,
        /// Raw JSON request body
        #[arg(long)]
        body: Option<String>,
        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
    /// Train a model for one matchup and save it as a snapshot
    Train {
        #[arg(long)]
        team1: String,
        #[arg(long)]
        team2: String,
        /// Snapshot output path
        #[arg(long, default_value = "model/snapshot.json")]
        output: String,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Store a manifest file in the configured backend
    Import {
        /// Manifest JSON file
        file: String,
        /// Matchup key (e.g. BOSvsLAL); taken from the manifest's dataset_id if omitted
        #[arg(long)]
        key: Option<String>,
    },
    /// Show store status
    Status,
    /// List stored matchup keys
    List,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown format: {}. Use json or table.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Import { file, key } => commands::data_import(&config, &file, key),
            DataCommands::Status => commands::data_status(&config),
            DataCommands::List => commands::data_list(&config),
        },
        Commands::Predict {
            team1,
            team2,
            home,
            query,
            body,
            format,
        } => commands::predict(&config, team1, team2, home, query, body, format),
        Commands::Train {
            team1,
            team2,
            output,
        } => commands::train(&config, &team1, &team2, &output),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use nba::api::{self, ApiResponse, PredictRequest};
    use nba::data::{open_store, Database, Manifest, MatchupKey};
    use nba::features::MatchupGames;
    use nba::predict::Pipeline;
    use nba::training::{ModelSnapshot, Trainer};
    use nba::{find_team, NbaError, StoreBackend};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(format!("{}/{}", config.store.directory, config.store.prefix))?;
        std::fs::create_dir_all("model")?;
        println!(
            "Created {}/{}/ and model/ directories",
            config.store.directory, config.store.prefix
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'nba data import <manifest.json>' to add matchup data");
        println!("  3. Run 'nba predict --team1 BOS --team2 LAL --home 1' to make a prediction");

        Ok(())
    }

    pub fn data_import(config: &Config, file: &str, key: Option<String>) -> Result<()> {
        let text = std::fs::read_to_string(file)?;
        let manifest = Manifest::from_json(&text)?;

        let key = match key {
            Some(raw) => MatchupKey::parse(&raw)?,
            None => manifest.matchup_key().ok_or_else(|| {
                NbaError::Validation(
                    "manifest has no dataset_id; pass --key to name the matchup".to_string(),
                )
            })?,
        };

        let store = open_store(config)?;
        store.save(&key, &manifest)?;
        println!("Stored {} games for {}", manifest.events.len(), key);
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        match config.store.backend {
            StoreBackend::Sqlite => {
                let db = Database::open(&config.store.database_path)?;
                let stats = db.get_stats()?;

                println!("Database Status");
                println!("───────────────────────────────");
                println!("  Path:      {}", config.store.database_path);
                println!("  Datasets:  {}", stats.dataset_count);
                println!("  Games:     {}", stats.game_count);
                if let Some(newest) = stats.newest_dataset {
                    println!("  Newest:    {}", newest);
                }
            }
            StoreBackend::Directory => {
                let store = open_store(config)?;
                let keys = store.keys()?;
                let mut games = 0;
                for key in &keys {
                    games += store.load(key)?.events.len();
                }

                println!("Store Status");
                println!("───────────────────────────────");
                println!("  Path:      {}/{}", config.store.directory, config.store.prefix);
                println!("  Datasets:  {}", keys.len());
                println!("  Games:     {}", games);
            }
        }
        Ok(())
    }

    pub fn data_list(config: &Config) -> Result<()> {
        let store = open_store(config)?;
        for key in store.keys()? {
            println!("{}", key);
        }
        Ok(())
    }

    pub fn predict(
        config: &Config,
        team1: Option<String>,
        team2: Option<String>,
        home: Option<String>,
        query: Option<String>,
        body: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let pipeline = Pipeline::from_config(config)?;

        // Flags act like query parameters and override the raw query
        let flags = PredictRequest { team1, team2, home };
        let query = flags.overlay_query(query.as_deref())?;
        let response = api::handle(&pipeline, query.as_deref(), body.as_deref());

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            OutputFormat::Table => print!("{}", format_response(&response)),
        }

        if !response.is_success() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn format_response(response: &ApiResponse) -> String {
        let body = &response.body;
        if !response.is_success() {
            return format!(
                "Status {}: {}\n",
                response.status,
                body["error"].as_str().unwrap_or("unknown error")
            );
        }

        let mut output = String::new();
        output.push_str(&format!(
            "Prediction: {}\n",
            body["prediction"].as_str().unwrap_or("")
        ));
        output.push_str("───────────────────────────────\n");
        output.push_str(&format!(
            "  Win probability:  {:.1}%\n",
            body["winning_rate"].as_f64().unwrap_or(0.0) * 100.0
        ));
        output.push_str(&format!(
            "  Model accuracy:   {:.1}%\n",
            body["model_accuracy"].as_f64().unwrap_or(0.0) * 100.0
        ));
        output
    }

    pub fn train(config: &Config, team1: &str, team2: &str, output: &str) -> Result<()> {
        let (team1, team2) = match (find_team(team1), find_team(team2)) {
            (Some(t1), Some(t2)) => (t1, t2),
            _ => return Err(NbaError::NotFound("Invalid team abbreviation provided.".to_string())),
        };
        let key = MatchupKey::for_teams(&team1, &team2);

        let store = open_store(config)?;
        let games = MatchupGames::from_manifest(&store.load(&key)?)?;
        println!("Training {} on {} games...", key, games.len());

        let model = Trainer::new(config.training.clone()).train(&games.training_matrix())?;

        if let Some(parent) = std::path::Path::new(output).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        ModelSnapshot::new(key.clone(), &model).save(output)?;

        println!("Holdout accuracy: {:.1}%", model.accuracy * 100.0);
        println!("Saved snapshot to {}", output);
        println!(
            "Set [model] provider = \"snapshot\" and snapshot_path = \"{}\" to serve it",
            output
        );
        Ok(())
    }
}
