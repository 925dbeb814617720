use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Insertable, Queryable};
use serde::Serialize;
use std::fmt;

use crate::db::schema;

// Program models
#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = schema::workout_programs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutProgram {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub raw_input: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::workout_programs)]
pub struct NewWorkoutProgram {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub raw_input: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// Workout models
#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = schema::workouts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Workout {
    pub id: String,
    pub program_id: String,
    pub day_number: i32,
    pub week_number: Option<i32>,
    pub scheduled_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub workout_type: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::workouts)]
pub struct NewWorkout {
    pub id: String,
    pub program_id: String,
    pub day_number: i32,
    pub week_number: Option<i32>,
    pub scheduled_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub workout_type: Option<String>,
    pub description: Option<String>,
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.title.as_deref().unwrap_or("Workout");
        let week = self
            .week_number
            .map(|w| format!(" (week {})", w))
            .unwrap_or_default();
        write!(f, "Day {}{}: {}", self.day_number, week, title)
    }
}

// Exercise prescription models
#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = schema::workout_exercises)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutExercise {
    pub id: String,
    pub workout_id: String,
    pub exercise_order: i32,
    pub exercise_name: String,
    pub exercise_type: Option<String>,
    pub sets: Option<i32>,
    pub reps: Option<String>,
    pub weight: Option<String>,
    pub distance: Option<String>,
    pub duration: Option<String>,
    pub rest_period: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::workout_exercises)]
pub struct NewWorkoutExercise {
    pub id: String,
    pub workout_id: String,
    pub exercise_order: i32,
    pub exercise_name: String,
    pub exercise_type: Option<String>,
    pub sets: Option<i32>,
    pub reps: Option<String>,
    pub weight: Option<String>,
    pub distance: Option<String>,
    pub duration: Option<String>,
    pub rest_period: Option<String>,
    pub notes: Option<String>,
}

impl fmt::Display for WorkoutExercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut target = Vec::new();
        if let Some(sets) = self.sets {
            target.push(format!("{} sets", sets));
        }
        if let Some(reps) = &self.reps {
            target.push(format!("{} reps", reps));
        }
        if let Some(weight) = &self.weight {
            target.push(weight.clone());
        }
        if let Some(distance) = &self.distance {
            target.push(distance.clone());
        }
        if let Some(duration) = &self.duration {
            target.push(duration.clone());
        }
        if target.is_empty() {
            write!(f, "{}", self.exercise_name)
        } else {
            write!(f, "{}: {}", self.exercise_name, target.join(" x "))
        }
    }
}

// Result models
#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = schema::workout_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutResult {
    pub id: String,
    pub workout_id: String,
    pub completed_at: NaiveDateTime,
    pub total_duration_seconds: Option<i32>,
    pub perceived_effort: Option<i32>,
    pub heart_rate_avg: Option<i32>,
    pub heart_rate_max: Option<i32>,
    pub feeling: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::workout_results)]
pub struct NewWorkoutResult {
    pub id: String,
    pub workout_id: String,
    pub total_duration_seconds: Option<i32>,
    pub perceived_effort: Option<i32>,
    pub heart_rate_avg: Option<i32>,
    pub heart_rate_max: Option<i32>,
    pub feeling: Option<String>,
    pub notes: Option<String>,
}

impl fmt::Display for WorkoutResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self
            .total_duration_seconds
            .map(|s| format!("{}:{:02}", s / 60, s % 60))
            .unwrap_or_else(|| "-".to_string());
        let rpe = self
            .perceived_effort
            .map(|e| format!("RPE {}/10", e))
            .unwrap_or_else(|| "RPE n/a".to_string());
        write!(
            f,
            "{} | {} | {}",
            self.completed_at.format("%Y-%m-%d %H:%M"),
            duration,
            rpe
        )
    }
}

#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = schema::exercise_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExerciseResult {
    pub id: String,
    pub workout_result_id: String,
    pub workout_exercise_id: String,
    pub sets_completed: Option<i32>,
    pub reps_completed: Option<String>,
    pub weight_used: Option<String>,
    pub time_seconds: Option<i32>,
    pub distance_completed: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::exercise_results)]
pub struct NewExerciseResult {
    pub id: String,
    pub workout_result_id: String,
    pub workout_exercise_id: String,
    pub sets_completed: Option<i32>,
    pub reps_completed: Option<String>,
    pub weight_used: Option<String>,
    pub time_seconds: Option<i32>,
    pub distance_completed: Option<String>,
    pub notes: Option<String>,
}

// Personal record models
#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = schema::personal_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PersonalRecord {
    pub id: String,
    pub exercise_type: String,
    pub exercise_name: String,
    pub record_type: String,
    pub record_value: String,
    pub workout_result_id: Option<String>,
    pub achieved_at: NaiveDateTime,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::personal_records)]
pub struct NewPersonalRecord {
    pub id: String,
    pub exercise_type: String,
    pub exercise_name: String,
    pub record_type: String,
    pub record_value: String,
    pub workout_result_id: Option<String>,
    pub notes: Option<String>,
}

impl fmt::Display for PersonalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} [{}]",
            self.exercise_name,
            self.record_type,
            self.record_value,
            self.achieved_at.format("%Y-%m-%d")
        )
    }
}

// Race models
#[derive(Queryable, Serialize, Debug, Clone)]
#[diesel(table_name = schema::hyrox_race_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HyroxRaceResult {
    pub id: String,
    pub race_date: NaiveDate,
    pub race_location: Option<String>,
    pub division: Option<String>,
    pub total_time_seconds: i32,
    pub skierg_time: Option<i32>,
    pub sled_push_time: Option<i32>,
    pub sled_pull_time: Option<i32>,
    pub burpee_broad_jump_time: Option<i32>,
    pub rowing_time: Option<i32>,
    pub farmers_carry_time: Option<i32>,
    pub sandbag_lunges_time: Option<i32>,
    pub wall_balls_time: Option<i32>,
    pub run_1_time: Option<i32>,
    pub run_2_time: Option<i32>,
    pub run_3_time: Option<i32>,
    pub run_4_time: Option<i32>,
    pub run_5_time: Option<i32>,
    pub run_6_time: Option<i32>,
    pub run_7_time: Option<i32>,
    pub run_8_time: Option<i32>,
    pub transitions_total_time: Option<i32>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::hyrox_race_results)]
pub struct NewHyroxRaceResult {
    pub id: String,
    pub race_date: NaiveDate,
    pub race_location: Option<String>,
    pub division: Option<String>,
    pub total_time_seconds: i32,
    pub skierg_time: Option<i32>,
    pub sled_push_time: Option<i32>,
    pub sled_pull_time: Option<i32>,
    pub burpee_broad_jump_time: Option<i32>,
    pub rowing_time: Option<i32>,
    pub farmers_carry_time: Option<i32>,
    pub sandbag_lunges_time: Option<i32>,
    pub wall_balls_time: Option<i32>,
    pub run_1_time: Option<i32>,
    pub run_2_time: Option<i32>,
    pub run_3_time: Option<i32>,
    pub run_4_time: Option<i32>,
    pub run_5_time: Option<i32>,
    pub run_6_time: Option<i32>,
    pub run_7_time: Option<i32>,
    pub run_8_time: Option<i32>,
    pub transitions_total_time: Option<i32>,
    pub notes: Option<String>,
}

impl fmt::Display for HyroxRaceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.race_location.as_deref().unwrap_or("Unknown location");
        let division = self.division.as_deref().unwrap_or("open");
        write!(
            f,
            "{} @ {} [{}]: {}:{:02}",
            self.race_date,
            location,
            division,
            self.total_time_seconds / 60,
            self.total_time_seconds % 60
        )
    }
}
