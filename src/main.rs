// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::future::Future;
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ytlearn::analysis::{assistant_prompt_template, GeminiAnalyzer};
use ytlearn::app_config::{self, Config};
use ytlearn::app_controller::AdminController;
use ytlearn::auth::{AdminCredentials, AdminSession};
use ytlearn::file_utils::FileManager;
use ytlearn::models::{format_duration, VideoEdit, VideoRecord};
use ytlearn::transcript;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an admin session (valid for 24 hours)
    Login {
        /// Admin email
        #[arg(short, long)]
        email: String,

        /// Admin password; read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// End the admin session
    Logout,

    /// Show session and configuration status
    Status {
        /// Also verify the Gemini key and model with a live request
        #[arg(long)]
        check: bool,
    },

    /// Normalize an .srt/.vtt/.txt file, or every such file under a directory
    Normalize {
        /// Subtitle file or directory
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Output file (for a file) or directory (required for a directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up YouTube metadata for a video URL
    Youtube {
        /// Video URL
        url: String,
    },

    /// Normalize a subtitle file and analyze it
    Analyze {
        /// Subtitle file (.srt, .vtt or .txt)
        file: PathBuf,
    },

    /// Print the prompt and JSON skeleton for an external assistant
    Prompt,

    /// Manage video analyses
    #[command(subcommand)]
    Videos(VideoCommands),

    /// Manage end-user accounts
    #[command(subcommand)]
    Users(UserCommands),

    /// Database bookkeeping
    #[command(subcommand)]
    Db(DbCommands),

    /// Generate shell completions for ytlearn
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum VideoCommands {
    /// List videos, newest first
    List,

    /// Show one video
    Show {
        video_id: String,
    },

    /// Register a video from its URL and a subtitle file (lookup, normalize, analyze, save)
    Register {
        /// YouTube URL
        #[arg(short, long)]
        url: String,

        /// Subtitle file (.srt, .vtt or .txt)
        #[arg(short, long)]
        subtitles: PathBuf,
    },

    /// Register a video from its URL and a `{analysis, transcript_text}` JSON file
    Import {
        /// YouTube URL
        #[arg(short, long)]
        url: String,

        /// JSON file, or `-` for stdin
        #[arg(short, long)]
        envelope: PathBuf,
    },

    /// Edit fields of a video
    Update {
        video_id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Length in seconds
        #[arg(long)]
        duration: Option<u64>,

        #[arg(long)]
        summary: Option<String>,

        /// Comma-separated keywords
        #[arg(long)]
        keywords: Option<String>,

        /// JSON array of {"expression", "meaning"} objects
        #[arg(long)]
        slang: Option<String>,

        /// Main question; repeat for several
        #[arg(long = "question")]
        questions: Vec<String>,

        /// File with one transcript segment per line
        #[arg(long)]
        transcript_file: Option<PathBuf>,
    },

    /// Delete a video
    Delete {
        video_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// List users
    List,

    /// Change a user's plan (free, plus, pro)
    SetPlan {
        uid: String,
        plan: String,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Seed the system config, a sample user and a sample video
    Setup,

    /// Write and read back an initialization marker
    Init,

    /// Show database location and document counts
    Check,
}

/// ytlearn - admin tool for an English-learning video catalog
///
/// Normalizes subtitle files into timestamped transcripts, analyzes them,
/// and manages the stored video analyses and user plans.
#[derive(Parser, Debug)]
#[command(name = "ytlearn")]
#[command(version)]
#[command(about = "Admin tool for YouTube English-learning content")]
#[command(long_about = "ytlearn turns subtitle files into [MM:SS] transcripts, analyzes them and manages the video catalog.

EXAMPLES:
    ytlearn normalize lecture.srt                    # Print the normalized transcript
    ytlearn normalize subs/ -o transcripts/          # Normalize a whole directory
    ytlearn login -e admin@example.com               # Start an admin session
    ytlearn videos register -u URL -s lecture.vtt    # Lookup, analyze and save
    ytlearn users set-plan user-123 pro              # Change a plan
    ytlearn completions bash > ytlearn.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. ADMIN_EMAIL, ADMIN_PASSWORD, YOUTUBE_DATA_API_KEY,
    GOOGLE_API_KEY and YTLEARN_DB_PATH override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is applied with set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "ytlearn", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    if let Err(e) = run(cli.command, &config).await {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}

// @loads: Config file, environment overrides, CLI overrides, then validation
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config)?;
    config.apply_env_overrides();

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    let session = AdminSession::from_config(config)?;

    match command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let credentials = AdminCredentials::from_config(&config.admin);
            session.login(&credentials, &email, &password)?;
            Ok(())
        }

        Commands::Logout => {
            if !session.logout()? {
                info!("No active session");
            }
            Ok(())
        }

        Commands::Status { check } => {
            print_status(config, &session)?;
            if check {
                let analyzer = GeminiAnalyzer::from_config(&config.gemini);
                match with_spinner("Checking Gemini API", analyzer.test_connection()).await {
                    Ok(()) => println!("Gemini API:      reachable"),
                    Err(e) => println!("Gemini API:      {}", e),
                }
            }
            Ok(())
        }

        Commands::Normalize { path, output } => normalize_command(&path, output.as_deref()),

        Commands::Youtube { url } => {
            let controller = AdminController::from_config(config)?;
            let details = with_spinner("Fetching video details", controller.youtube_details(&url)).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
            Ok(())
        }

        Commands::Analyze { file } => {
            let controller = AdminController::from_config(config)?;
            let transcript_text = controller.load_transcript_file(&file)?;
            let result = with_spinner("Analyzing transcript", controller.analyze_transcript(&transcript_text)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Prompt => {
            println!("{}", assistant_prompt_template());
            Ok(())
        }

        Commands::Videos(command) => {
            session.require_login()?;
            let controller = AdminController::from_config(config)?;
            videos_command(&controller, command).await
        }

        Commands::Users(command) => {
            session.require_login()?;
            let controller = AdminController::from_config(config)?;
            match command {
                UserCommands::List => {
                    let users = controller.list_users().await?;
                    if users.is_empty() {
                        println!("No users found.");
                    }
                    for user in users {
                        println!(
                            "{:<24} {:<28} {:<20} {:<5} analyses: {}",
                            user.uid, user.email, user.display_name, user.plan, user.usage.analysis_count
                        );
                    }
                }
                UserCommands::SetPlan { uid, plan } => {
                    controller.update_plan(&uid, &plan).await?;
                }
            }
            Ok(())
        }

        Commands::Db(command) => {
            session.require_login()?;
            let controller = AdminController::from_config(config)?;
            match command {
                DbCommands::Setup => {
                    let collections = controller.setup_database().await?;
                    println!("Created collections: {}", collections.join(", "));
                }
                DbCommands::Init => {
                    let document = controller.init_database().await?;
                    println!("{}", serde_json::to_string_pretty(&document.data)?);
                }
                DbCommands::Check => {
                    let check = controller.check_database().await?;
                    println!("Database: {}", check.location);
                    println!("{}", check.stats);
                }
            }
            Ok(())
        }

        Commands::Completions { .. } => Ok(()),
    }
}

async fn videos_command(controller: &AdminController, command: VideoCommands) -> Result<()> {
    match command {
        VideoCommands::List => {
            let videos = controller.list_videos().await?;
            if videos.is_empty() {
                println!("No videos registered yet.");
            }
            for video in &videos {
                println!(
                    "{:<12} {:>8}  {}  {}",
                    video.video_id,
                    format_duration(video.duration),
                    video.timestamp,
                    video.youtube_title
                );
            }
        }

        VideoCommands::Show { video_id } => {
            let video = controller.get_video(&video_id).await?;
            print_video(&video);
        }

        VideoCommands::Register { url, subtitles } => {
            let video = with_spinner(
                "Fetching details and analyzing subtitles",
                controller.register_from_subtitles(&url, &subtitles),
            )
            .await?;
            print_video(&video);
        }

        VideoCommands::Import { url, envelope } => {
            let envelope_json = read_input(&envelope)?;
            let details = with_spinner("Fetching video details", controller.youtube_details(&url)).await?;
            let video = controller.register_from_envelope(&details, &envelope_json).await?;
            print_video(&video);
        }

        VideoCommands::Update {
            video_id,
            title,
            description,
            duration,
            summary,
            keywords,
            slang,
            questions,
            transcript_file,
        } => {
            let transcript = transcript_file
                .map(|path| FileManager::read_to_string(&path))
                .transpose()?;

            let edit = VideoEdit {
                title,
                description,
                duration,
                summary,
                keywords,
                slang_expressions: slang,
                main_questions: (!questions.is_empty()).then(|| questions.join("\n")),
                transcript,
            };
            let video = controller.edit_video(&video_id, edit).await?;
            print_video(&video);
        }

        VideoCommands::Delete { video_id } => {
            if !controller.delete_video(&video_id).await? {
                warn!("Video {} did not exist", video_id);
            }
        }
    }

    Ok(())
}

// @processes: One file to stdout/file, or a directory tree into an output directory
fn normalize_command(path: &Path, output: Option<&Path>) -> Result<()> {
    if FileManager::file_exists(path) {
        let normalized = transcript::normalize(&FileManager::read_to_string(path)?);
        match output {
            Some(output) => {
                FileManager::write_to_file(output, &normalized)?;
                info!("Success: {}", output.display());
            }
            None => println!("{}", normalized),
        }
        return Ok(());
    }

    if !FileManager::dir_exists(path) {
        return Err(anyhow!("Input path does not exist: {}", path.display()));
    }

    let output_dir = output.ok_or_else(|| anyhow!("--output is required when normalizing a directory"))?;
    let files = FileManager::find_transcript_files(path)?;
    if files.is_empty() {
        warn!("No .srt, .vtt or .txt files found under {}", path.display());
        return Ok(());
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.green/white} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut processed_count = 0;
    for file in &files {
        progress.set_message(file.display().to_string());
        let target = FileManager::normalized_output_path(file, path, output_dir);

        match FileManager::read_to_string(file)
            .and_then(|raw| FileManager::write_to_file(&target, &transcript::normalize(&raw)))
        {
            Ok(()) => processed_count += 1,
            Err(e) => progress.suspend(|| error!("Error processing file: {}", e)),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!("Finished processing {} files", processed_count);
    Ok(())
}

// @runs: A future behind a spinner on stderr
async fn with_spinner<F, T>(message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = future.await;
    spinner.finish_and_clear();
    result
}

fn print_video(video: &VideoRecord) {
    println!("{} ({})", video.youtube_title, video.video_id);
    println!("Duration:  {}", format_duration(video.duration));
    println!("Updated:   {}", video.timestamp);
    println!("Thumbnail: {}", video.thumbnail_url);
    println!();
    println!("Summary:   {}", video.analysis.summary);
    println!("Keywords:  {}", video.analysis.keywords.join(", "));
    for slang in &video.analysis.slang_expressions {
        println!("Slang:     {} - {}", slang.expression, slang.meaning);
    }
    for question in &video.analysis.main_questions {
        println!("Question:  {}", question);
    }
    println!();
    println!("{}", video.transcript_text.joined());
}

fn print_status(config: &Config, session: &AdminSession) -> Result<()> {
    match session.current()? {
        Some(state) => println!(
            "Logged in as {} until {}",
            state.email,
            state.expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("Not logged in"),
    }

    let configured = |value: &str| if value.is_empty() { "missing" } else { "present" };
    println!("Database:        {}", config.database.resolve_path()?.display());
    println!("Admin account:   {}", configured(&config.admin.email));
    println!("YouTube API key: {}", configured(&config.youtube.api_key));
    println!("Gemini API key:  {} (model {})", configured(&config.gemini.api_key), config.gemini.model);
    Ok(())
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    FileManager::read_to_string(path)
}
