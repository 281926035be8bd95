//! mycourses main entry point
//!
//! Command-line access to a Moodle site through the dashboard service.
//! Every data command prints pretty JSON on stdout.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mycourses::config::{load_config_with_hash, Config};
use mycourses::session::SessionCredential;
use mycourses::Dashboard;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// mycourses: a Moodle session emulator and course scraper
///
/// Signs into a SAML-protected Moodle site and prints profile, course,
/// attendance, syllabus and activity data as JSON.
#[derive(Parser, Debug)]
#[command(name = "mycourses")]
#[command(version)]
#[command(about = "Moodle session emulator and course scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with a username and password
    Login {
        #[arg(long, env = "MYCOURSES_USERNAME")]
        username: String,

        #[arg(long, env = "MYCOURSES_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Validate a raw session cookie and show its action key
    Session {
        #[command(flatten)]
        session: SessionArg,
    },

    /// Show the signed-in user's profile
    Profile {
        #[command(flatten)]
        session: SessionArg,
    },

    /// List enrolled courses
    Courses {
        #[command(flatten)]
        session: SessionArg,

        /// Also fetch attendance for every course
        #[arg(long)]
        with_attendance: bool,
    },

    /// Show attendance records of a course
    Attendance {
        #[command(flatten)]
        session: SessionArg,

        course_id: String,
    },

    /// Show the section and activity tree of a course
    Content {
        #[command(flatten)]
        session: SessionArg,

        course_id: String,
    },

    /// Show a course's syllabus and lecture outline
    Syllabus {
        #[command(flatten)]
        session: SessionArg,

        course_id: String,
    },

    /// Show quiz details by course-module id
    Quiz {
        #[command(flatten)]
        session: SessionArg,

        module_id: String,
    },

    /// Show assignment details by course-module id
    Assignment {
        #[command(flatten)]
        session: SessionArg,

        module_id: String,
    },

    /// Show a course with every quiz and assignment detail attached
    Details {
        #[command(flatten)]
        session: SessionArg,

        course_id: String,
    },

    /// Validate the configuration and print it
    CheckConfig,
}

#[derive(clap::Args, Debug)]
struct SessionArg {
    /// Raw MoodleSession cookie value
    #[arg(long = "session", env = "MYCOURSES_SESSION", hide_env_values = true)]
    token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    match cli.command {
        Command::CheckConfig => handle_check_config(&config, &hash),
        command => {
            let dashboard = Dashboard::new(config)?;
            run(&dashboard, command).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mycourses=info,warn"),
            1 => EnvFilter::new("mycourses=debug,info"),
            2 => EnvFilter::new("mycourses=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Validates a raw cookie into a credential carrying its action key
async fn resume(dashboard: &Dashboard, session: &SessionArg) -> anyhow::Result<SessionCredential> {
    let cached = dashboard
        .validate_session(&session.token)
        .await
        .context("Session rejected")?;
    Ok(cached.value)
}

async fn run(dashboard: &Dashboard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let response = dashboard.login_with_credentials(&username, &password).await;
            let Some(body) = response.body() else {
                bail!("Login produced no response body");
            };
            if !body.success {
                bail!(
                    "{}: {}",
                    body.message,
                    body.error.as_deref().unwrap_or("unknown error")
                );
            }
            print_json(body)
        }
        Command::Session { session } => {
            let credential = resume(dashboard, &session).await?;
            print_json(&serde_json::json!({
                "namespace": credential.namespace(),
                "sesskey": credential.action_key,
            }))
        }
        Command::Profile { session } => {
            let credential = resume(dashboard, &session).await?;
            print_json(&dashboard.fetch_profile(&credential).await?.value)
        }
        Command::Courses {
            session,
            with_attendance,
        } => {
            let credential = resume(dashboard, &session).await?;
            let courses = if with_attendance {
                dashboard.refresh_courses(&credential, &[]).await?
            } else {
                dashboard.fetch_courses(&credential).await?.value
            };
            print_json(&courses)
        }
        Command::Attendance { session, course_id } => {
            let credential = resume(dashboard, &session).await?;
            print_json(&dashboard.fetch_attendance(&credential, &course_id).await?.value)
        }
        Command::Content { session, course_id } => {
            let credential = resume(dashboard, &session).await?;
            print_json(&dashboard.fetch_course_content(&credential, &course_id).await?.value)
        }
        Command::Syllabus { session, course_id } => {
            let credential = resume(dashboard, &session).await?;
            let found = dashboard.fetch_syllabus(&credential, &course_id).await?.value;
            print_json(&serde_json::json!({
                "courseInfo": found.course_info,
                "outline": mycourses::api::build_outline(found.syllabus.rows()),
                "syllabus": found.syllabus,
            }))
        }
        Command::Quiz { session, module_id } => {
            let credential = resume(dashboard, &session).await?;
            print_json(&dashboard.fetch_quiz(&credential, &module_id).await?.value)
        }
        Command::Assignment { session, module_id } => {
            let credential = resume(dashboard, &session).await?;
            print_json(&dashboard.fetch_assignment(&credential, &module_id).await?.value)
        }
        Command::Details { session, course_id } => {
            let credential = resume(dashboard, &session).await?;
            let details = dashboard.fetch_course_details(&credential, &course_id).await?;
            for failure in &details.failures {
                tracing::warn!("Module {}: {}", failure.module_id, failure.error);
            }
            print_json(&details)
        }
        Command::CheckConfig => handle_check_config(dashboard.config(), "-"),
    }
}

/// Handles `check-config`: prints the effective configuration
fn handle_check_config(config: &Config, hash: &str) -> anyhow::Result<()> {
    println!("=== mycourses configuration ===\n");

    println!("Moodle:");
    println!("  Base URL: {}", config.moodle.base_url);
    println!("  Login path: {}", config.moodle.login_path);
    println!("  Home path: {}", config.moodle.home_path);
    println!("  Session cookie: {}", config.moodle.session_cookie);
    println!("  User agent: {}", config.moodle.user_agent);

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Concurrent detail fetches: {}", config.http.max_concurrent_details);

    println!("\nCache TTLs:");
    println!("  Short: {}s", config.cache.short_ttl);
    println!("  Medium: {}s", config.cache.medium_ttl);
    println!("  Long: {}s", config.cache.long_ttl);
    println!("  Very long: {}s", config.cache.very_long_ttl);
    println!("  Sweep interval: {}s", config.cache.sweep_interval);
    println!("  Token lifetime: {}s", config.cache.token_ttl);

    println!("\n✓ Configuration is valid (hash: {})", hash);
    Ok(())
}
