use anyhow::Result;
use chrono::{Days, NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use log::{debug, info};
use uuid::Uuid;

use crate::db::models::{
    ExerciseResult, HyroxRaceResult, NewExerciseResult, NewHyroxRaceResult, NewPersonalRecord,
    NewWorkout, NewWorkoutExercise, NewWorkoutProgram, NewWorkoutResult, PersonalRecord, Workout,
    WorkoutExercise, WorkoutProgram, WorkoutResult,
};
use crate::db::schema::{
    exercise_results, hyrox_race_results, personal_records, workout_exercises, workout_programs,
    workout_results, workouts,
};
use crate::parser::ParsedProgram;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// Programs
pub fn create_program(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<String>,
    raw_input: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<WorkoutProgram> {
    diesel::insert_into(workout_programs::table)
        .values(&NewWorkoutProgram {
            id: new_id(),
            name: name.to_string(),
            description,
            raw_input: raw_input.to_string(),
            start_date,
            end_date,
        })
        .get_result::<WorkoutProgram>(conn)
        .map_err(Into::into)
}

pub fn get_programs(conn: &mut SqliteConnection) -> Result<Vec<WorkoutProgram>> {
    workout_programs::table
        .order(workout_programs::created_at.desc())
        .load::<WorkoutProgram>(conn)
        .map_err(Into::into)
}

pub fn get_program(conn: &mut SqliteConnection, program_id: &str) -> Result<WorkoutProgram> {
    workout_programs::table
        .find(program_id)
        .first::<WorkoutProgram>(conn)
        .map_err(Into::into)
}

pub fn delete_program(conn: &mut SqliteConnection, program_id: &str) -> Result<usize> {
    diesel::delete(workout_programs::table.find(program_id))
        .execute(conn)
        .map_err(Into::into)
}

/// The only mutation the log allows: refresh a program's `updated_at` when
/// workouts are attached to it.
pub fn touch_program(conn: &mut SqliteConnection, program_id: &str) -> Result<usize> {
    diesel::update(workout_programs::table.find(program_id))
        .set(workout_programs::updated_at.eq(diesel::dsl::now))
        .execute(conn)
        .map_err(Into::into)
}

// Workouts
#[allow(clippy::too_many_arguments)]
pub fn create_workout(
    conn: &mut SqliteConnection,
    program_id: &str,
    day_number: i32,
    week_number: Option<i32>,
    scheduled_date: Option<NaiveDate>,
    title: Option<String>,
    workout_type: Option<String>,
    description: Option<String>,
) -> Result<Workout> {
    diesel::insert_into(workouts::table)
        .values(&NewWorkout {
            id: new_id(),
            program_id: program_id.to_string(),
            day_number,
            week_number,
            scheduled_date,
            title,
            workout_type,
            description,
        })
        .get_result::<Workout>(conn)
        .map_err(Into::into)
}

pub fn get_workouts_by_program(
    conn: &mut SqliteConnection,
    program_id: &str,
) -> Result<Vec<Workout>> {
    workouts::table
        .filter(workouts::program_id.eq(program_id))
        .order(workouts::day_number.asc())
        .load::<Workout>(conn)
        .map_err(Into::into)
}

pub fn get_workout(conn: &mut SqliteConnection, workout_id: &str) -> Result<Workout> {
    workouts::table
        .find(workout_id)
        .first::<Workout>(conn)
        .map_err(Into::into)
}

pub fn get_todays_workout(
    conn: &mut SqliteConnection,
    today: NaiveDate,
    program_id: Option<&str>,
) -> Result<Vec<Workout>> {
    let mut query = workouts::table
        .filter(workouts::scheduled_date.eq(today))
        .into_boxed();
    if let Some(program_id) = program_id {
        query = query.filter(workouts::program_id.eq(program_id.to_string()));
    }
    query.load::<Workout>(conn).map_err(Into::into)
}

pub fn get_workouts_by_date_range(
    conn: &mut SqliteConnection,
    start_date: NaiveDate,
    end_date: NaiveDate,
    program_id: Option<&str>,
) -> Result<Vec<Workout>> {
    let mut query = workouts::table
        .filter(workouts::scheduled_date.ge(start_date))
        .filter(workouts::scheduled_date.le(end_date))
        .into_boxed();
    if let Some(program_id) = program_id {
        query = query.filter(workouts::program_id.eq(program_id.to_string()));
    }
    query
        .order(workouts::scheduled_date.asc())
        .load::<Workout>(conn)
        .map_err(Into::into)
}

// Exercise prescriptions
#[allow(clippy::too_many_arguments)]
pub fn create_exercise(
    conn: &mut SqliteConnection,
    workout_id: &str,
    exercise_order: i32,
    exercise_name: &str,
    exercise_type: Option<String>,
    sets: Option<i32>,
    reps: Option<String>,
    weight: Option<String>,
    distance: Option<String>,
    duration: Option<String>,
    rest_period: Option<String>,
    notes: Option<String>,
) -> Result<WorkoutExercise> {
    diesel::insert_into(workout_exercises::table)
        .values(&NewWorkoutExercise {
            id: new_id(),
            workout_id: workout_id.to_string(),
            exercise_order,
            exercise_name: exercise_name.to_string(),
            exercise_type,
            sets,
            reps,
            weight,
            distance,
            duration,
            rest_period,
            notes,
        })
        .get_result::<WorkoutExercise>(conn)
        .map_err(Into::into)
}

pub fn create_exercises_batch(
    conn: &mut SqliteConnection,
    exercises: &[NewWorkoutExercise],
) -> Result<usize> {
    diesel::insert_into(workout_exercises::table)
        .values(exercises)
        .execute(conn)
        .map_err(Into::into)
}

pub fn get_exercises_by_workout(
    conn: &mut SqliteConnection,
    workout_id: &str,
) -> Result<Vec<WorkoutExercise>> {
    workout_exercises::table
        .filter(workout_exercises::workout_id.eq(workout_id))
        .order(workout_exercises::exercise_order.asc())
        .load::<WorkoutExercise>(conn)
        .map_err(Into::into)
}

// Workout results
#[allow(clippy::too_many_arguments)]
pub fn create_workout_result(
    conn: &mut SqliteConnection,
    workout_id: &str,
    total_duration_seconds: Option<i32>,
    perceived_effort: Option<i32>,
    heart_rate_avg: Option<i32>,
    heart_rate_max: Option<i32>,
    feeling: Option<String>,
    notes: Option<String>,
) -> Result<WorkoutResult> {
    diesel::insert_into(workout_results::table)
        .values(&NewWorkoutResult {
            id: new_id(),
            workout_id: workout_id.to_string(),
            total_duration_seconds,
            perceived_effort,
            heart_rate_avg,
            heart_rate_max,
            feeling,
            notes,
        })
        .get_result::<WorkoutResult>(conn)
        .map_err(Into::into)
}

pub fn get_workout_results(
    conn: &mut SqliteConnection,
    workout_id: Option<&str>,
    limit: i64,
) -> Result<Vec<WorkoutResult>> {
    let mut query = workout_results::table.into_boxed();
    if let Some(workout_id) = workout_id {
        query = query.filter(workout_results::workout_id.eq(workout_id.to_string()));
    }
    query
        .order(workout_results::completed_at.desc())
        .limit(limit)
        .load::<WorkoutResult>(conn)
        .map_err(Into::into)
}

pub fn get_workout_result(
    conn: &mut SqliteConnection,
    result_id: &str,
) -> Result<WorkoutResult> {
    workout_results::table
        .find(result_id)
        .first::<WorkoutResult>(conn)
        .map_err(Into::into)
}

/// Results completed on or after `since`, oldest first. Feeds the stats and
/// coaching layers.
pub fn get_workout_stats(
    conn: &mut SqliteConnection,
    since: NaiveDateTime,
) -> Result<Vec<WorkoutResult>> {
    workout_results::table
        .filter(workout_results::completed_at.ge(since))
        .order(workout_results::completed_at.asc())
        .load::<WorkoutResult>(conn)
        .map_err(Into::into)
}

// Exercise results
#[allow(clippy::too_many_arguments)]
pub fn create_exercise_result(
    conn: &mut SqliteConnection,
    workout_result_id: &str,
    workout_exercise_id: &str,
    sets_completed: Option<i32>,
    reps_completed: Option<String>,
    weight_used: Option<String>,
    time_seconds: Option<i32>,
    distance_completed: Option<String>,
    notes: Option<String>,
) -> Result<ExerciseResult> {
    diesel::insert_into(exercise_results::table)
        .values(&NewExerciseResult {
            id: new_id(),
            workout_result_id: workout_result_id.to_string(),
            workout_exercise_id: workout_exercise_id.to_string(),
            sets_completed,
            reps_completed,
            weight_used,
            time_seconds,
            distance_completed,
            notes,
        })
        .get_result::<ExerciseResult>(conn)
        .map_err(Into::into)
}

pub fn create_exercise_results_batch(
    conn: &mut SqliteConnection,
    results: &[NewExerciseResult],
) -> Result<usize> {
    diesel::insert_into(exercise_results::table)
        .values(results)
        .execute(conn)
        .map_err(Into::into)
}

pub fn get_exercise_results(
    conn: &mut SqliteConnection,
    workout_result_id: &str,
) -> Result<Vec<ExerciseResult>> {
    exercise_results::table
        .filter(exercise_results::workout_result_id.eq(workout_result_id))
        .load::<ExerciseResult>(conn)
        .map_err(Into::into)
}

/// History for a named exercise: completed results joined to the
/// prescription they fulfilled, newest first. The name match is a
/// case-insensitive substring, so "row" finds "1000m Rowing".
pub fn get_exercise_history(
    conn: &mut SqliteConnection,
    exercise_name: &str,
    limit: i64,
) -> Result<Vec<(ExerciseResult, WorkoutExercise)>> {
    let pattern = format!("%{}%", exercise_name);
    exercise_results::table
        .inner_join(workout_exercises::table)
        .filter(workout_exercises::exercise_name.like(pattern))
        .order(exercise_results::created_at.desc())
        .limit(limit)
        .load::<(ExerciseResult, WorkoutExercise)>(conn)
        .map_err(Into::into)
}

// Personal records
pub fn create_personal_record(
    conn: &mut SqliteConnection,
    exercise_type: &str,
    exercise_name: &str,
    record_type: &str,
    record_value: &str,
    workout_result_id: Option<String>,
    notes: Option<String>,
) -> Result<PersonalRecord> {
    diesel::insert_into(personal_records::table)
        .values(&NewPersonalRecord {
            id: new_id(),
            exercise_type: exercise_type.to_string(),
            exercise_name: exercise_name.to_string(),
            record_type: record_type.to_string(),
            record_value: record_value.to_string(),
            workout_result_id,
            notes,
        })
        .get_result::<PersonalRecord>(conn)
        .map_err(Into::into)
}

pub fn get_personal_records(
    conn: &mut SqliteConnection,
    exercise_type: Option<&str>,
) -> Result<Vec<PersonalRecord>> {
    let mut query = personal_records::table.into_boxed();
    if let Some(exercise_type) = exercise_type {
        query = query.filter(personal_records::exercise_type.eq(exercise_type.to_string()));
    }
    query
        .order(personal_records::achieved_at.desc())
        .load::<PersonalRecord>(conn)
        .map_err(Into::into)
}

// Race results
pub fn create_race_result(
    conn: &mut SqliteConnection,
    mut race: NewHyroxRaceResult,
) -> Result<HyroxRaceResult> {
    race.id = new_id();
    diesel::insert_into(hyrox_race_results::table)
        .values(&race)
        .get_result::<HyroxRaceResult>(conn)
        .map_err(Into::into)
}

pub fn get_race_results(conn: &mut SqliteConnection) -> Result<Vec<HyroxRaceResult>> {
    hyrox_race_results::table
        .order(hyrox_race_results::race_date.desc())
        .load::<HyroxRaceResult>(conn)
        .map_err(Into::into)
}

pub fn get_race_result(conn: &mut SqliteConnection, race_id: &str) -> Result<HyroxRaceResult> {
    hyrox_race_results::table
        .find(race_id)
        .first::<HyroxRaceResult>(conn)
        .map_err(Into::into)
}

/// Persist one parsed program with all its workouts and prescriptions in a
/// single transaction. Scheduled dates fall back to `start_date + day - 1`
/// when the parser left them out.
pub fn import_parsed_program(
    conn: &mut SqliteConnection,
    parsed: &ParsedProgram,
    raw_input: &str,
    start_date: Option<NaiveDate>,
) -> Result<WorkoutProgram> {
    let end_date = match (start_date, parsed.program.total_days) {
        (Some(start), days) if days > 0 => start.checked_add_days(Days::new(days as u64 - 1)),
        _ => None,
    };

    conn.transaction::<WorkoutProgram, anyhow::Error, _>(|conn| {
        let program = create_program(
            conn,
            &parsed.program.name,
            parsed.program.description.clone(),
            raw_input,
            start_date,
            end_date,
        )?;

        for workout in &parsed.workouts {
            let day_offset = u64::try_from(workout.day_number.saturating_sub(1)).ok();
            let scheduled = workout.scheduled_date.or(match (start_date, day_offset) {
                (Some(start), Some(days)) => start.checked_add_days(Days::new(days)),
                _ => None,
            });
            let created = create_workout(
                conn,
                &program.id,
                workout.day_number,
                workout.week_number,
                scheduled,
                Some(workout.title.clone()),
                Some(workout.workout_type.clone()),
                workout.description.clone(),
            )?;

            let rows: Vec<NewWorkoutExercise> = workout
                .exercises
                .iter()
                .map(|ex| NewWorkoutExercise {
                    id: new_id(),
                    workout_id: created.id.clone(),
                    exercise_order: ex.exercise_order,
                    exercise_name: ex.exercise_name.clone(),
                    exercise_type: ex.exercise_type.clone(),
                    sets: ex.sets,
                    reps: ex.reps.clone(),
                    weight: ex.weight.clone(),
                    distance: ex.distance.clone(),
                    duration: ex.duration.clone(),
                    rest_period: ex.rest_period.clone(),
                    notes: ex.notes.clone(),
                })
                .collect();
            create_exercises_batch(conn, &rows)?;
            debug!(
                "Imported day {} with {} exercises",
                workout.day_number,
                rows.len()
            );
        }

        touch_program(conn, &program.id)?;
        info!(
            "Imported program '{}' with {} workouts",
            program.name,
            parsed.workouts.len()
        );
        Ok(program)
    })
}
