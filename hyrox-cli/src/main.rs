use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use hyrox::coach::{self, PerformanceSummary};
use hyrox::config::{self, Config};
use hyrox::db::SqliteConnection;
use hyrox::db::models::NewHyroxRaceResult;
use hyrox::db::operations::{
    create_exercise_result, create_personal_record, create_race_result, create_workout_result,
    delete_program, get_exercise_history, get_exercise_results, get_exercises_by_workout,
    get_personal_records, get_program, get_programs, get_race_result, get_race_results,
    get_todays_workout, get_workout, get_workout_result, get_workout_results, get_workout_stats,
    get_workouts_by_program, import_parsed_program,
};
use hyrox::llm::LlmInterface;
use hyrox::parser::parse_workout_program;
use hyrox::stats::{
    TrainingSummary, fastest_station, format_duration, parse_duration, slowest_station,
    station_splits,
};

#[derive(Parser, Debug)]
#[command(version, about = "Hyrox - training log and race prep CLI", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Provider {
    Ollama,
    #[value(name = "openai")]
    OpenAi,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a credentials template (never overwrites) and apply the schema
    Init,
    /// Parse a free-text training plan with the LLM and store it
    Import {
        /// Path to the plan text file
        file: PathBuf,
        #[arg(short, long)]
        name: String,
        /// First training day; scheduled dates are derived from it
        #[arg(short, long)]
        start_date: Option<NaiveDate>,
        #[arg(short, long)]
        provider: Option<Provider>,
        #[arg(short, long)]
        model: Option<String>,
    },
    /// List stored programs
    Programs,
    /// Show one program with its workouts
    Program { id: String },
    /// Delete a program and everything under it
    DeleteProgram { id: String },
    /// Show today's scheduled workout(s)
    Today {
        #[arg(short, long)]
        program: Option<String>,
    },
    /// LLM guidance for one workout
    Guide {
        workout: String,
        #[arg(short, long)]
        provider: Option<Provider>,
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Record a completed workout
    Complete {
        workout: String,
        /// Total time, e.g. "58:30" or "3510"
        #[arg(short, long)]
        duration: Option<String>,
        /// RPE 1-10
        #[arg(short, long)]
        rpe: Option<i32>,
        /// great | good | okay | tired | exhausted
        #[arg(short, long)]
        feeling: Option<String>,
        #[arg(long)]
        hr_avg: Option<i32>,
        #[arg(long)]
        hr_max: Option<i32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Recent workout results
    Results {
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// One logged result with its per-exercise outcomes
    Result { id: String },
    /// Record how a single prescribed exercise went within a logged result
    LogExercise {
        result: String,
        exercise: String,
        #[arg(long)]
        sets: Option<i32>,
        /// Free-form, e.g. "25,22,20" or "AMRAP"
        #[arg(long)]
        reps: Option<String>,
        #[arg(long)]
        weight: Option<String>,
        /// e.g. "3:45"
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        distance: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Completed-exercise history by name fragment
    History {
        exercise: String,
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// Personal records
    #[command(subcommand)]
    Pr(PrCommands),
    /// Official race results
    #[command(subcommand)]
    Race(RaceCommands),
    /// Training summary over the last N days
    Stats {
        #[arg(short, long, default_value_t = 30)]
        days: i64,
    },
    /// Ask the LLM coach about recent training
    Coach {
        #[arg(short, long)]
        question: Option<String>,
        #[arg(short, long, default_value_t = 90)]
        days: i64,
        #[arg(short, long)]
        provider: Option<Provider>,
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum PrCommands {
    Add {
        /// skierg, rowing, wall_balls, run, strength, ...
        #[arg(long)]
        exercise_type: String,
        #[arg(long)]
        name: String,
        /// time | weight | reps | distance
        #[arg(long)]
        record_type: String,
        /// e.g. "3:45" or "100kg"
        #[arg(long)]
        value: String,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        #[arg(long)]
        exercise_type: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum RaceCommands {
    Add {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        location: Option<String>,
        /// open | pro | doubles
        #[arg(long)]
        division: Option<String>,
        /// Total race time, e.g. "1:23:00"
        #[arg(long)]
        total: String,
        #[arg(long)]
        skierg: Option<String>,
        #[arg(long)]
        sled_push: Option<String>,
        #[arg(long)]
        sled_pull: Option<String>,
        #[arg(long)]
        burpee_broad_jump: Option<String>,
        #[arg(long)]
        rowing: Option<String>,
        #[arg(long)]
        farmers_carry: Option<String>,
        #[arg(long)]
        sandbag_lunges: Option<String>,
        #[arg(long)]
        wall_balls: Option<String>,
        /// 1km run splits in course order, e.g. --run 4:10 --run 4:25 ...
        #[arg(long = "run", num_args = 1)]
        runs: Vec<String>,
        #[arg(long)]
        transitions: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    List,
    /// Station-by-station breakdown plus LLM analysis
    Analyze {
        id: String,
        #[arg(short, long)]
        provider: Option<Provider>,
        #[arg(short, long)]
        model: Option<String>,
    },
}

async fn build_llm(
    provider: Option<Provider>,
    model: Option<String>,
    config: &Config,
) -> Result<LlmInterface> {
    let provider = provider.unwrap_or(match config.llm_provider.as_deref() {
        Some("openai") => Provider::OpenAi,
        _ => Provider::Ollama,
    });
    match provider {
        Provider::Ollama => LlmInterface::new_ollama(model).await,
        Provider::OpenAi => LlmInterface::new_openai(config.openai_api_key.clone(), model).await,
    }
}

fn parse_optional_duration(input: Option<String>) -> Result<Option<i32>> {
    input.map(|s| parse_duration(&s)).transpose()
}

fn summary_since(conn: &mut SqliteConnection, days: i64) -> Result<PerformanceSummary> {
    let since = Local::now().naive_local() - Duration::days(days);
    let results = get_workout_stats(conn, since)?;
    let records = get_personal_records(conn, None)?;
    Ok(PerformanceSummary::build(&results, &records))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = Config::from_env();
    config.warn_missing_credentials();

    if let Commands::Init = args.command {
        if config::write_env_template(Path::new(".env"))? {
            println!("Wrote credentials template to .env");
        } else {
            println!(".env already exists, leaving it untouched");
        }
        hyrox::db::init_database(&config.database_url, 1)?;
        println!("Database ready at {}", config.database_url);
        return Ok(());
    }

    let pool = hyrox::db::init_database(&config.database_url, 4)?;
    let mut conn = pool.get()?;

    match args.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Import {
            file,
            name,
            start_date,
            provider,
            model,
        } => {
            let raw_text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let llm = build_llm(provider, model, &config).await?;
            let parsed = parse_workout_program(&llm, &raw_text, &name, start_date).await?;
            let program = import_parsed_program(&mut conn, &parsed, &raw_text, start_date)?;
            println!(
                "Imported '{}' ({} workouts over {} days): {}",
                program.name,
                parsed.workouts.len(),
                parsed.program.total_days,
                program.id
            );
        }
        Commands::Programs => {
            for program in get_programs(&mut conn)? {
                let window = match (program.start_date, program.end_date) {
                    (Some(start), Some(end)) => format!(" [{} - {}]", start, end),
                    (Some(start), None) => format!(" [from {}]", start),
                    _ => String::new(),
                };
                println!("{}  {}{}", program.id, program.name, window);
            }
        }
        Commands::Program { id } => {
            let program = get_program(&mut conn, &id)?;
            println!("{}", program.name);
            if let Some(description) = &program.description {
                println!("{}", description);
            }
            for workout in get_workouts_by_program(&mut conn, &id)? {
                let date = workout
                    .scheduled_date
                    .map(|d| format!(" ({})", d))
                    .unwrap_or_default();
                println!("\n{}{}  [{}]", workout, date, workout.id);
                for exercise in get_exercises_by_workout(&mut conn, &workout.id)? {
                    println!("  - {}", exercise);
                }
            }
        }
        Commands::DeleteProgram { id } => {
            let deleted = delete_program(&mut conn, &id)?;
            println!("Deleted {} program(s)", deleted);
        }
        Commands::Today { program } => {
            let today = Local::now().date_naive();
            let todays = get_todays_workout(&mut conn, today, program.as_deref())?;
            if todays.is_empty() {
                println!("Nothing scheduled for {}", today);
            }
            for workout in todays {
                println!("{}  [{}]", workout, workout.id);
                for exercise in get_exercises_by_workout(&mut conn, &workout.id)? {
                    println!("  - {}", exercise);
                }
            }
        }
        Commands::Guide {
            workout,
            provider,
            model,
        } => {
            let workout = get_workout(&mut conn, &workout)?;
            let exercises = get_exercises_by_workout(&mut conn, &workout.id)?;
            let summary = summary_since(&mut conn, 90)?;
            let llm = build_llm(provider, model, &config).await?;
            let guidance =
                coach::workout_guidance(&llm, &workout, &exercises, Some(&summary)).await?;
            println!("{}", guidance);
        }
        Commands::Complete {
            workout,
            duration,
            rpe,
            feeling,
            hr_avg,
            hr_max,
            notes,
        } => {
            let total_duration_seconds = parse_optional_duration(duration)?;
            let result = create_workout_result(
                &mut conn,
                &workout,
                total_duration_seconds,
                rpe,
                hr_avg,
                hr_max,
                feeling,
                notes,
            )?;
            println!("Logged result {}: {}", result.id, result);
        }
        Commands::Results { limit } => {
            for result in get_workout_results(&mut conn, None, limit)? {
                println!("{}  [{}]", result, result.id);
            }
        }
        Commands::Result { id } => {
            let result = get_workout_result(&mut conn, &id)?;
            println!("{}", result);
            let names: HashMap<String, String> =
                get_exercises_by_workout(&mut conn, &result.workout_id)?
                    .into_iter()
                    .map(|e| (e.id, e.exercise_name))
                    .collect();
            for outcome in get_exercise_results(&mut conn, &result.id)? {
                let name = names
                    .get(&outcome.workout_exercise_id)
                    .map(String::as_str)
                    .unwrap_or("?");
                let time = outcome
                    .time_seconds
                    .map(format_duration)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  - {}: sets {}  reps {}  weight {}  time {}  distance {}",
                    name,
                    outcome.sets_completed.map_or("-".to_string(), |s| s.to_string()),
                    outcome.reps_completed.as_deref().unwrap_or("-"),
                    outcome.weight_used.as_deref().unwrap_or("-"),
                    time,
                    outcome.distance_completed.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::LogExercise {
            result,
            exercise,
            sets,
            reps,
            weight,
            time,
            distance,
            notes,
        } => {
            let time_seconds = parse_optional_duration(time)?;
            let outcome = create_exercise_result(
                &mut conn,
                &result,
                &exercise,
                sets,
                reps,
                weight,
                time_seconds,
                distance,
                notes,
            )?;
            println!("Logged exercise result {}", outcome.id);
        }
        Commands::History { exercise, limit } => {
            for (result, prescription) in get_exercise_history(&mut conn, &exercise, limit)? {
                let time = result
                    .time_seconds
                    .map(format_duration)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {}  time {}  sets {}  reps {}",
                    result.created_at.format("%Y-%m-%d"),
                    prescription.exercise_name,
                    time,
                    result.sets_completed.map_or("-".to_string(), |s| s.to_string()),
                    result.reps_completed.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::Pr(PrCommands::Add {
            exercise_type,
            name,
            record_type,
            value,
            notes,
        }) => {
            let record = create_personal_record(
                &mut conn,
                &exercise_type,
                &name,
                &record_type,
                &value,
                None,
                notes,
            )?;
            println!("Saved PR: {}", record);
        }
        Commands::Pr(PrCommands::List { exercise_type }) => {
            for record in get_personal_records(&mut conn, exercise_type.as_deref())? {
                println!("{:>14}  {}", record.exercise_type, record);
            }
        }
        Commands::Race(RaceCommands::Add {
            date,
            location,
            division,
            total,
            skierg,
            sled_push,
            sled_pull,
            burpee_broad_jump,
            rowing,
            farmers_carry,
            sandbag_lunges,
            wall_balls,
            runs,
            transitions,
            notes,
        }) => {
            if runs.len() > 8 {
                anyhow::bail!("a Hyrox race has at most 8 run splits, got {}", runs.len());
            }
            let mut run_splits = [None; 8];
            for (i, run) in runs.iter().enumerate() {
                run_splits[i] = Some(parse_duration(run)?);
            }
            let race = create_race_result(
                &mut conn,
                NewHyroxRaceResult {
                    id: String::new(),
                    race_date: date,
                    race_location: location,
                    division,
                    total_time_seconds: parse_duration(&total)?,
                    skierg_time: parse_optional_duration(skierg)?,
                    sled_push_time: parse_optional_duration(sled_push)?,
                    sled_pull_time: parse_optional_duration(sled_pull)?,
                    burpee_broad_jump_time: parse_optional_duration(burpee_broad_jump)?,
                    rowing_time: parse_optional_duration(rowing)?,
                    farmers_carry_time: parse_optional_duration(farmers_carry)?,
                    sandbag_lunges_time: parse_optional_duration(sandbag_lunges)?,
                    wall_balls_time: parse_optional_duration(wall_balls)?,
                    run_1_time: run_splits[0],
                    run_2_time: run_splits[1],
                    run_3_time: run_splits[2],
                    run_4_time: run_splits[3],
                    run_5_time: run_splits[4],
                    run_6_time: run_splits[5],
                    run_7_time: run_splits[6],
                    run_8_time: run_splits[7],
                    transitions_total_time: parse_optional_duration(transitions)?,
                    notes,
                },
            )?;
            println!("Saved race result: {}", race);
        }
        Commands::Race(RaceCommands::List) => {
            for race in get_race_results(&mut conn)? {
                println!("{}  [{}]", race, race.id);
            }
        }
        Commands::Race(RaceCommands::Analyze {
            id,
            provider,
            model,
        }) => {
            let race = get_race_result(&mut conn, &id)?;
            println!("{}\n", race);
            for (station, split) in station_splits(&race) {
                println!("{:>18}: {}", station.to_string(), format_duration(split));
            }
            if let Some((station, split)) = fastest_station(&race) {
                println!("\nFastest station: {} ({})", station, format_duration(split));
            }
            if let Some((station, split)) = slowest_station(&race) {
                println!("Slowest station: {} ({})", station, format_duration(split));
            }

            let summary = summary_since(&mut conn, 90)?;
            let llm = build_llm(provider, model, &config).await?;
            let analysis = coach::analyze_race(&llm, &race, Some(&summary)).await?;
            println!("\n{}", analysis);
        }
        Commands::Stats { days } => {
            let since = Local::now().naive_local() - Duration::days(days);
            let results = get_workout_stats(&mut conn, since)?;
            if results.is_empty() {
                println!("No workouts completed in the last {} days", days);
            } else {
                let summary = TrainingSummary::build(&results, Local::now().date_naive());
                println!("Last {} days: {}", days, summary);
            }
        }
        Commands::Coach {
            question,
            days,
            provider,
            model,
        } => {
            let summary = summary_since(&mut conn, days)?;
            let llm = build_llm(provider, model, &config).await?;
            let insights = coach::coaching_insights(&llm, &summary, question.as_deref()).await?;
            println!("{}", insights);
        }
    }

    Ok(())
}
