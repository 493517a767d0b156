use clap::{Args, Parser, Subcommand};
use ministry_scheduling::config::{AppConfig, SchedulingConfig};
use ministry_scheduling::error::AppError;
use ministry_scheduling::telemetry;
use ministry_scheduling::workflows::intake::{self, RosterImporter};
use ministry_scheduling::workflows::scheduling::{
    AlignmentSummary, CalendarConfig, ConfiguredHouseholdPolicy, EngineConfig, ParserSettings,
    QuestionnaireParser, Schedule, ScheduleGenerator, SchedulePeriod, ScheduleReport, VolunteerId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Ministry Scheduler",
    about = "Generate monthly volunteer schedules from roster, questionnaires and history",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the schedule for a month and write it as JSON
    Generate(GenerateArgs),
    /// List the services of a month in processing order
    Calendar(CalendarArgs),
    /// Show how one questionnaire payload is understood
    ParseResponse(ParseResponseArgs),
}

#[derive(Args, Debug)]
struct PeriodArgs {
    /// Target month (1-12)
    #[arg(long)]
    month: String,
    /// Target year
    #[arg(long)]
    year: String,
    /// Calendar configuration JSON (defaults to SCHEDULER_CALENDAR_PATH, then the parish default).
    /// SCHEDULER_DEFAULT_POSITIONS applies when the file sets no default_positions
    #[arg(long)]
    calendar: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    period: PeriodArgs,
    /// Volunteer roster (.json or .csv)
    #[arg(long)]
    roster: PathBuf,
    /// Questionnaire responses JSON
    #[arg(long)]
    responses: PathBuf,
    /// Previously published schedules JSON
    #[arg(long)]
    history: Option<PathBuf>,
    /// Write the result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Override the per-volunteer monthly cap
    #[arg(long)]
    cap: Option<u32>,
}

#[derive(Args, Debug)]
struct CalendarArgs {
    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Args, Debug)]
struct ParseResponseArgs {
    #[command(flatten)]
    period: PeriodArgs,
    /// File holding one raw questionnaire payload
    #[arg(long)]
    file: PathBuf,
}

#[derive(Debug, Serialize)]
struct GenerateOutput<'a> {
    period: SchedulePeriod,
    schedule: &'a Schedule,
    report: &'a ScheduleReport,
    alignment: Option<AlignmentSummary>,
    assignment_counts: &'a BTreeMap<VolunteerId, u32>,
}

#[derive(Debug, Serialize)]
struct CalendarEntry {
    occurrence: String,
    weekday: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'static str>,
    special: bool,
    priority: bool,
    required_positions: u8,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    info!(environment = ?config.environment, "ministry scheduler starting");

    match cli.command {
        Command::Generate(args) => run_generate(args, &config.scheduling),
        Command::Calendar(args) => run_calendar(args, &config.scheduling),
        Command::ParseResponse(args) => run_parse_response(args, &config.scheduling),
    }
}

fn resolve(args: &PeriodArgs, settings: &SchedulingConfig) -> Result<(SchedulePeriod, CalendarConfig), AppError> {
    let period = intake::resolve_period(&args.month, &args.year)?;
    let calendar = match args.calendar.as_ref().or(settings.calendar_path.as_ref()) {
        Some(path) => CalendarConfig::from_path_with_default_positions(path, settings.default_positions)?,
        None => CalendarConfig {
            default_positions: settings.default_positions,
            ..CalendarConfig::parish_default()
        },
    };
    Ok((period, calendar))
}

fn run_generate(args: GenerateArgs, settings: &SchedulingConfig) -> Result<(), AppError> {
    let (period, calendar) = resolve(&args.period, settings)?;

    let roster = RosterImporter::from_path(&args.roster)?;
    let responses = intake::load_responses(&args.responses)?;
    let history = match &args.history {
        Some(path) => intake::load_history(path)?,
        None => Vec::new(),
    };

    let engine_config = EngineConfig {
        monthly_cap: args.cap.unwrap_or(settings.monthly_cap),
        ..EngineConfig::default()
    };
    let generator = ScheduleGenerator::new(engine_config, calendar, Arc::new(roster.households), &history);
    let parser = QuestionnaireParser::new(generator.parser_settings(period));
    let volunteers = intake::assemble_volunteers(roster.volunteers, &responses, &parser, period);

    let generated = generator.generate(period, &volunteers);
    let output = GenerateOutput {
        period: generated.period,
        schedule: &generated.schedule,
        report: &generated.report,
        alignment: generated.alignment,
        assignment_counts: &generated.assignment_counts,
    };

    write_json(&output, args.output.as_deref())
}

fn run_calendar(args: CalendarArgs, settings: &SchedulingConfig) -> Result<(), AppError> {
    let (period, calendar) = resolve(&args.period, settings)?;
    let generator = ScheduleGenerator::new(
        EngineConfig::default(),
        calendar,
        Arc::new(ConfiguredHouseholdPolicy::default()),
        &[],
    );

    let entries: Vec<CalendarEntry> = generator
        .occurrences(period)
        .into_iter()
        .map(|occurrence| CalendarEntry {
            occurrence: occurrence.key().to_string(),
            weekday: occurrence.date.format("%A").to_string(),
            category: occurrence.category.clone(),
            label: occurrence.special_category().map(|category| category.label()),
            special: occurrence.special,
            priority: occurrence.priority,
            required_positions: occurrence.required_positions,
        })
        .collect();

    write_json(&entries, None)
}

fn run_parse_response(args: ParseResponseArgs, settings: &SchedulingConfig) -> Result<(), AppError> {
    let (period, calendar) = resolve(&args.period, settings)?;
    let raw: serde_json::Value = serde_json::from_reader(File::open(&args.file)?)?;

    let parser_settings = ParserSettings {
        feast_date: calendar.feast_date(period),
        ..ParserSettings::default()
    };
    let availability = QuestionnaireParser::new(parser_settings).parse(&raw, period);

    write_json(&availability, None)
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), AppError> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            info!(path = %path.display(), "output written");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}
