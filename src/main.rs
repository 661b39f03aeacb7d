use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use stroopkit::{
    app_dirs::AppDirs,
    build_timeline,
    config::{ConfigStore, FileConfigStore},
    datapipe::{self, Outbox, UreqTransport},
    export,
    options::FixationOptions,
    profile::{generate_participant_id, resolve_participant_id, Profile, ProfileStore},
    runtime::DEFAULT_SIMULATED_ACCURACY,
    summarize, SessionRunner, SimulatedResponder, TimelineConfig, TimelineOptions, TrialResult,
};

/// color-word interference experiments from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "stroopkit",
    version,
    about,
    long_about = "Builds Stroop task timelines, runs headless sessions, summarizes trial logs and ships them to DataPipe."
)]
struct Cli {
    /// log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a generated timeline as JSON
    Timeline {
        #[command(flatten)]
        timeline: TimelineArgs,

        /// seed for shuffling and fixation durations
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a session against a simulated participant
    Simulate {
        #[command(flatten)]
        timeline: TimelineArgs,

        #[arg(long)]
        seed: Option<u64>,

        /// probability of answering correctly
        #[arg(long, default_value_t = DEFAULT_SIMULATED_ACCURACY)]
        accuracy: f64,

        /// participant id to tag rows with (defaults to the stored profile)
        #[arg(long)]
        user: Option<String>,

        /// write the trial log as JSON
        #[arg(long)]
        log: Option<PathBuf>,

        /// write the trial log as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// print the full report as JSON instead of the results text
        #[arg(long)]
        json: bool,
    },

    /// Compute the congruent/incongruent summary of a trial log
    Summarize {
        log: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Convert a trial log to CSV
    Export {
        log: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Manage the participant profile
    Profile {
        #[command(subcommand)]
        subcommand: ProfileSubcommand,
    },

    /// Submit a trial log to DataPipe
    Upload { log: PathBuf },

    /// Inspect or resend failed submissions
    Outbox {
        #[command(subcommand)]
        subcommand: OutboxSubcommand,
    },

    /// Inspect the stored configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    /// Print the stored participant id
    Show,
    /// Generate and store a fresh participant id
    New,
    /// Store the given participant id
    Set { id: String },
}

#[derive(Subcommand, Debug)]
enum OutboxSubcommand {
    List,
    Flush,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommand {
    Show,
    Path,
}

/// Flags layered over the stored timeline options
#[derive(Args, Debug, Clone, Default)]
struct TimelineArgs {
    /// practice trials per condition
    #[arg(long = "practice")]
    practice: Option<i64>,

    /// main passes over the congruent set
    #[arg(long = "main")]
    main: Option<i64>,

    /// response window in ms
    #[arg(long)]
    timeout: Option<i64>,

    #[arg(long)]
    fixation_min: Option<i64>,

    #[arg(long)]
    fixation_max: Option<i64>,

    #[arg(long)]
    no_feedback: bool,

    #[arg(long)]
    no_fixation: bool,

    #[arg(long)]
    no_instructions: bool,

    #[arg(long)]
    no_results: bool,
}

impl TimelineArgs {
    fn to_options(&self) -> TimelineOptions {
        let fixation_duration = match (self.fixation_min, self.fixation_max) {
            (None, None) => None,
            (min, max) => Some(FixationOptions { min, max }),
        };
        TimelineOptions {
            practice_trials_per_condition: self.practice,
            main_trials_per_condition: self.main,
            trial_timeout: self.timeout,
            fixation_duration,
            show_practice_feedback: self.no_feedback.then_some(false),
            include_fixation: self.no_fixation.then_some(false),
            show_instructions: self.no_instructions.then_some(false),
            show_results: self.no_results.then_some(false),
        }
    }

    fn resolve(&self, store: &impl ConfigStore) -> anyhow::Result<TimelineConfig> {
        let options = store.load().timeline.overridden_by(&self.to_options());
        Ok(TimelineConfig::from_options(&options)?)
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn read_log(path: &Path) -> anyhow::Result<Vec<TrialResult>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn write_log(path: &Path, log: &[TrialResult]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(log)?)
        .with_context(|| format!("writing {}", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_store = FileConfigStore::new();
    let profiles = ProfileStore::new();

    match cli.command {
        Commands::Timeline { timeline, seed } => {
            let config = timeline.resolve(&config_store)?;
            let built = build_timeline(&config, &mut seeded_rng(seed));
            println!("{}", serde_json::to_string_pretty(&built)?);
        }
        Commands::Simulate {
            timeline,
            seed,
            accuracy,
            user,
            log,
            csv,
            json,
        } => {
            if !(0.0..=1.0).contains(&accuracy) {
                bail!("accuracy must be between 0 and 1, got {accuracy}");
            }
            let config = timeline.resolve(&config_store)?;
            let mut rng = seeded_rng(seed);
            let built = build_timeline(&config, &mut rng);
            let user_id = match user {
                Some(id) => Some(resolve_participant_id(&id, &mut rng)?),
                None => profiles.load()?.map(|p| p.user_id),
            };
            let mut responder = SimulatedResponder::new(StdRng::from_rng(&mut rng)?, accuracy);
            let report = SessionRunner::new(user_id).run(built, &mut responder)?;

            if let Some(path) = log {
                write_log(&path, &report.log)?;
            }
            if let Some(path) = csv {
                export::export_csv_file(&report.log, &path)?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in &report.feedback {
                    println!("{line}");
                }
                let summary = report.summary.unwrap_or_else(|| summarize(&report.log));
                println!("{summary}");
            }
        }
        Commands::Summarize { log, json } => {
            let summary = summarize(&read_log(&log)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
        }
        Commands::Export { log, output } => {
            let data = read_log(&log)?;
            export::export_csv_file(&data, &output)?;
            println!("wrote {} rows to {}", data.len(), output.display());
        }
        Commands::Profile { subcommand } => match subcommand {
            ProfileSubcommand::Show => match profiles.load()? {
                Some(profile) => println!("{}", profile.user_id),
                None => bail!("no participant profile stored; run `stroopkit profile new`"),
            },
            ProfileSubcommand::New => {
                let profile = Profile::new(generate_participant_id(&mut rand::thread_rng()));
                profiles.save(&profile)?;
                println!("{}", profile.user_id);
            }
            ProfileSubcommand::Set { id } => {
                let id = resolve_participant_id(&id, &mut rand::thread_rng())?;
                profiles.save(&Profile::new(id.clone()))?;
                println!("{id}");
            }
        },
        Commands::Upload { log } => {
            let data = read_log(&log)?;
            let config = config_store.load();
            let profile = profiles.load_or_create(&mut rand::thread_rng())?;
            let outbox = Outbox::new(AppDirs::outbox_dir());
            let response = datapipe::submit_or_store(
                &UreqTransport,
                &config.datapipe,
                &data,
                &profile.user_id,
                &outbox,
                &mut |s: &str| eprintln!("{s}"),
            )?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Outbox { subcommand } => {
            let outbox = Outbox::new(AppDirs::outbox_dir());
            match subcommand {
                OutboxSubcommand::List => {
                    for path in outbox.pending()? {
                        println!("{}", path.display());
                    }
                }
                OutboxSubcommand::Flush => {
                    let report = outbox.flush(&UreqTransport, &config_store.load().datapipe)?;
                    println!("sent {}, failed {}", report.sent, report.failed);
                }
            }
        }
        Commands::Config { subcommand } => match subcommand {
            ConfigSubcommand::Show => {
                println!("{}", serde_json::to_string_pretty(&config_store.load())?)
            }
            ConfigSubcommand::Path => println!("{}", config_store.path().display()),
        },
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
