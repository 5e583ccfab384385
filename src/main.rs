mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use jip_calendar_core::config::AppConfig;
use jip_calendar_core::error::CalendarError;
use jip_calendar_core::filter::OpdScope;
use jip_calendar_core::remote::HttpBackend;
use jip_calendar_core::settings::{AgendaGroupBy, BadgeVariant, FileSlot};
use jip_calendar_core::{CalendarController, EventColor, ViewMode};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::Controller;
use crate::render::Render;

#[derive(Parser)]
#[command(name = "jip-calendar")]
#[command(about = "Browse and schedule OPD activities on the JIP calendar")]
struct Cli {
    /// Verbose logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    /// Reference date the views are built around (YYYY-MM-DD, default today)
    #[arg(long, global = true, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Only show events with this color (repeatable)
    #[arg(long = "color", global = true)]
    colors: Vec<EventColor>,

    /// Only show events of this OPD
    #[arg(long, global = true)]
    opd: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Copy)]
struct Step {
    /// Move this many periods forward from the reference date (negative goes back)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    step: i32,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the calendar in the saved view
    Show(Step),
    /// Month grid (bulan)
    Month(Step),
    /// Week time grid (minggu)
    Week(Step),
    /// Day time grid (hari)
    Day(Step),
    /// Twelve small month grids (tahun)
    Year(Step),
    /// Event list for the month
    Agenda(Step),
    /// Switch the saved view (bulan, minggu, hari, tahun, agenda)
    View {
        #[arg(value_parser = parse_view)]
        mode: ViewMode,
    },
    /// Show or change display preferences
    Settings {
        #[arg(long, value_enum)]
        badge: Option<BadgeArg>,

        #[arg(long, conflicts_with = "hour24")]
        hour12: bool,

        #[arg(long)]
        hour24: bool,

        #[arg(long, value_enum)]
        group_by: Option<GroupByArg>,
    },
    /// Schedule a new event (prompts for anything not given)
    Add(commands::event::EventFields),
    /// Change an existing event
    Edit {
        id: String,

        #[command(flatten)]
        fields: commands::event::EventFields,
    },
    /// Move an event to another day, keeping its duration
    Move {
        id: String,

        /// Target day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,

        /// New start time (HH:MM), default keeps the current one
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
    },
    /// Delete an event after confirmation
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List the OPD names events can belong to
    Opds,
    /// Show config paths and backend settings, or change them
    Config {
        /// Base URL of the calendar API
        #[arg(long)]
        api_base_url: Option<String>,

        /// Seconds before a backend request is abandoned
        #[arg(long)]
        timeout: Option<u64>,

        /// Where display preferences are stored
        #[arg(long)]
        settings_path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BadgeArg {
    Dot,
    Colored,
}

impl From<BadgeArg> for BadgeVariant {
    fn from(arg: BadgeArg) -> Self {
        match arg {
            BadgeArg::Dot => BadgeVariant::Dot,
            BadgeArg::Colored => BadgeVariant::Colored,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupByArg {
    Date,
    Color,
}

impl From<GroupByArg> for AgendaGroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Date => AgendaGroupBy::Date,
            GroupByArg::Color => AgendaGroupBy::Color,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(cli).await {
        report(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;
    let backend = HttpBackend::new(&config.api_base_url, config.request_timeout());
    let slot = FileSlot::new(config.settings_path());
    debug!(api = %config.api_base_url, settings = %slot.path().display(), "configuration loaded");
    let today = Local::now().date_naive();

    let mut controller: Controller = CalendarController::new(backend, slot, today);
    if let Some(date) = cli.date {
        controller.set_reference(date);
    }

    for color in &cli.colors {
        controller.toggle_color(*color);
    }
    if let Some(opd) = cli.opd {
        controller.set_opd_scope(OpdScope::Only(opd));
    }

    match cli.command.unwrap_or(Commands::Show(Step { step: 0 })) {
        Commands::Show(step) => commands::show::run(&mut controller, None, step.step, today).await,
        Commands::Month(step) => {
            commands::show::run(&mut controller, Some(ViewMode::Month), step.step, today).await
        }
        Commands::Week(step) => {
            commands::show::run(&mut controller, Some(ViewMode::Week), step.step, today).await
        }
        Commands::Day(step) => {
            commands::show::run(&mut controller, Some(ViewMode::Day), step.step, today).await
        }
        Commands::Year(step) => {
            commands::show::run(&mut controller, Some(ViewMode::Year), step.step, today).await
        }
        Commands::Agenda(step) => {
            commands::show::run(&mut controller, Some(ViewMode::Agenda), step.step, today).await
        }
        Commands::View { mode } => commands::settings::set_view(&mut controller, mode),
        Commands::Settings {
            badge,
            hour12,
            hour24,
            group_by,
        } => {
            let use_24_hour = match (hour12, hour24) {
                (true, _) => Some(false),
                (_, true) => Some(true),
                _ => None,
            };
            commands::settings::run(
                &mut controller,
                badge.map(Into::into),
                use_24_hour,
                group_by.map(Into::into),
            )
        }
        Commands::Add(fields) => commands::event::add(&mut controller, fields).await,
        Commands::Edit { id, fields } => commands::event::edit(&mut controller, &id, fields).await,
        Commands::Move { id, to, time } => {
            commands::event::move_to(&mut controller, &id, to, time).await
        }
        Commands::Delete { id, force } => {
            commands::event::delete(&mut controller, &id, force).await
        }
        Commands::Opds => commands::opds::run(&mut controller).await,
        Commands::Config {
            api_base_url,
            timeout,
            settings_path,
        } => commands::config::run(&config, api_base_url, timeout, settings_path),
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("jip_calendar=debug,jip_calendar_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("jip_calendar=warn,jip_calendar_core=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// One red line per failure; validation failures list each field below it.
fn report(error: &anyhow::Error) {
    if let Some(CalendarError::Validation(errors)) = error.downcast_ref::<CalendarError>() {
        eprintln!("{} {}", "✗".red(), "Invalid event".red());
        eprintln!("{}", errors.render());
        return;
    }

    eprintln!("{} {}", "✗".red(), error.to_string().red());
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| format!("Invalid time '{}', expected HH:MM", s))
}

fn parse_view(s: &str) -> Result<ViewMode, String> {
    ViewMode::parse(s).ok_or_else(|| {
        format!(
            "Unknown view '{}'. Expected one of: bulan, minggu, hari, tahun, agenda",
            s
        )
    })
}
