//! Schema lifecycle properties, run against in-memory SQLite: idempotent
//! migrations, foreign-key enforcement, cascade and set-null deletion, and
//! the RPE check constraint.

use chrono::NaiveDate;
use diesel::dsl::count_star;
use diesel::prelude::*;

use hyrox::db::models::{NewExerciseResult, NewHyroxRaceResult, Workout, WorkoutProgram};
use hyrox::db::schema::{exercise_results, workout_exercises, workout_results, workouts};
use hyrox::db::{establish, operations as ops, run_migrations};

fn test_conn() -> SqliteConnection {
    let mut conn = establish(":memory:").unwrap();
    run_migrations(&mut conn).unwrap();
    conn
}

fn seed_program(conn: &mut SqliteConnection) -> (WorkoutProgram, Workout) {
    let program = ops::create_program(
        conn,
        "8 Week Hyrox Prep",
        Some("Race prep block".into()),
        "raw plan text",
        NaiveDate::from_ymd_opt(2026, 9, 1),
        None,
    )
    .unwrap();
    let workout = ops::create_workout(
        conn,
        &program.id,
        1,
        Some(1),
        NaiveDate::from_ymd_opt(2026, 9, 1),
        Some("Engine Day".into()),
        Some("hyrox_simulation".into()),
        None,
    )
    .unwrap();
    (program, workout)
}

#[test]
fn migrations_apply_twice_without_error() {
    let mut conn = establish(":memory:").unwrap();
    run_migrations(&mut conn).unwrap();
    run_migrations(&mut conn).unwrap();
}

#[test]
fn exercise_with_unknown_workout_is_rejected() {
    let mut conn = test_conn();
    let result = ops::create_exercise(
        &mut conn,
        "no-such-workout",
        1,
        "SkiErg",
        Some("skierg".into()),
        None,
        None,
        None,
        Some("1000m".into()),
        None,
        None,
        None,
    );
    assert!(result.is_err());
}

#[test]
fn deleting_a_program_cascades_through_the_hierarchy() {
    let mut conn = test_conn();
    let (program, workout) = seed_program(&mut conn);

    let exercise = ops::create_exercise(
        &mut conn,
        &workout.id,
        1,
        "Wall Balls",
        Some("wall_balls".into()),
        Some(3),
        Some("AMRAP".into()),
        Some("6kg".into()),
        None,
        Some("60 seconds".into()),
        None,
        None,
    )
    .unwrap();
    let result = ops::create_workout_result(
        &mut conn,
        &workout.id,
        Some(3600),
        Some(7),
        Some(152),
        Some(181),
        Some("good".into()),
        None,
    )
    .unwrap();
    ops::create_exercise_result(
        &mut conn,
        &result.id,
        &exercise.id,
        Some(3),
        Some("25,22,20".into()),
        Some("6kg".into()),
        None,
        None,
        None,
    )
    .unwrap();

    assert_eq!(ops::delete_program(&mut conn, &program.id).unwrap(), 1);

    let workouts_left: i64 = workouts::table
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    let exercises_left: i64 = workout_exercises::table
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    let results_left: i64 = workout_results::table
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    let exercise_results_left: i64 = exercise_results::table
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    assert_eq!(
        (workouts_left, exercises_left, results_left, exercise_results_left),
        (0, 0, 0, 0)
    );
}

#[test]
fn personal_records_outlive_their_source_result() {
    let mut conn = test_conn();
    let (_, workout) = seed_program(&mut conn);
    let result = ops::create_workout_result(
        &mut conn,
        &workout.id,
        Some(1800),
        Some(9),
        None,
        None,
        None,
        None,
    )
    .unwrap();
    let record = ops::create_personal_record(
        &mut conn,
        "rowing",
        "1km Row",
        "time",
        "3:45",
        Some(result.id.clone()),
        None,
    )
    .unwrap();
    assert_eq!(record.workout_result_id.as_deref(), Some(result.id.as_str()));

    diesel::delete(workout_results::table.find(&result.id))
        .execute(&mut conn)
        .unwrap();

    let survivors = ops::get_personal_records(&mut conn, Some("rowing")).unwrap();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].record_value, "3:45");
    assert!(survivors[0].workout_result_id.is_none());
}

#[test]
fn perceived_effort_must_stay_in_range() {
    let mut conn = test_conn();
    let (_, workout) = seed_program(&mut conn);

    for bad_rpe in [0, 11] {
        let result = ops::create_workout_result(
            &mut conn,
            &workout.id,
            None,
            Some(bad_rpe),
            None,
            None,
            None,
            None,
        );
        assert!(result.is_err(), "RPE {} should be rejected", bad_rpe);
    }

    ops::create_workout_result(&mut conn, &workout.id, None, Some(10), None, None, None, None)
        .unwrap();
}

#[test]
fn todays_workout_and_date_range_queries() {
    let mut conn = test_conn();
    let (program, _) = seed_program(&mut conn);
    ops::create_workout(
        &mut conn,
        &program.id,
        2,
        Some(1),
        NaiveDate::from_ymd_opt(2026, 9, 2),
        Some("Recovery".into()),
        Some("recovery".into()),
        None,
    )
    .unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
    let todays = ops::get_todays_workout(&mut conn, today, Some(&program.id)).unwrap();
    assert_eq!(todays.len(), 1);
    assert_eq!(todays[0].day_number, 2);

    let in_range = ops::get_workouts_by_date_range(
        &mut conn,
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
        None,
    )
    .unwrap();
    assert_eq!(in_range.len(), 2);
    assert_eq!(in_range[0].day_number, 1);
}

#[test]
fn exercise_history_matches_name_fragments() {
    let mut conn = test_conn();
    let (_, workout) = seed_program(&mut conn);
    let exercise = ops::create_exercise(
        &mut conn,
        &workout.id,
        1,
        "1000m Rowing",
        Some("rowing".into()),
        None,
        None,
        None,
        Some("1000m".into()),
        None,
        None,
        None,
    )
    .unwrap();
    let result = ops::create_workout_result(
        &mut conn,
        &workout.id,
        Some(1200),
        Some(6),
        None,
        None,
        None,
        None,
    )
    .unwrap();
    ops::create_exercise_result(
        &mut conn,
        &result.id,
        &exercise.id,
        None,
        None,
        None,
        Some(225),
        Some("1000m".into()),
        None,
    )
    .unwrap();

    let history = ops::get_exercise_history(&mut conn, "row", 10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].1.exercise_name, "1000m Rowing");
    assert_eq!(history[0].0.time_seconds, Some(225));

    assert!(ops::get_exercise_history(&mut conn, "sled", 10).unwrap().is_empty());
}

#[test]
fn exercise_results_batch_lands_under_the_right_result() {
    let mut conn = test_conn();
    let (_, workout) = seed_program(&mut conn);
    let skierg = ops::create_exercise(
        &mut conn,
        &workout.id,
        1,
        "SkiErg",
        Some("skierg".into()),
        None,
        None,
        None,
        Some("1000m".into()),
        None,
        None,
        None,
    )
    .unwrap();
    let wall_balls = ops::create_exercise(
        &mut conn,
        &workout.id,
        2,
        "Wall Balls",
        Some("wall_balls".into()),
        Some(3),
        Some("AMRAP".into()),
        Some("6kg".into()),
        None,
        None,
        None,
        None,
    )
    .unwrap();
    let logged = ops::create_workout_result(
        &mut conn,
        &workout.id,
        Some(3600),
        Some(7),
        None,
        None,
        None,
        None,
    )
    .unwrap();
    let other = ops::create_workout_result(
        &mut conn, &workout.id, None, None, None, None, None, None,
    )
    .unwrap();

    let rows = vec![
        NewExerciseResult {
            id: uuid::Uuid::new_v4().to_string(),
            workout_result_id: logged.id.clone(),
            workout_exercise_id: skierg.id.clone(),
            sets_completed: None,
            reps_completed: None,
            weight_used: None,
            time_seconds: Some(238),
            distance_completed: Some("1000m".into()),
            notes: None,
        },
        NewExerciseResult {
            id: uuid::Uuid::new_v4().to_string(),
            workout_result_id: logged.id.clone(),
            workout_exercise_id: wall_balls.id.clone(),
            sets_completed: Some(3),
            reps_completed: Some("25,22,20".into()),
            weight_used: Some("6kg".into()),
            time_seconds: None,
            distance_completed: None,
            notes: None,
        },
    ];
    assert_eq!(ops::create_exercise_results_batch(&mut conn, &rows).unwrap(), 2);

    let fetched = ops::get_exercise_results(&mut conn, &logged.id).unwrap();
    assert_eq!(fetched.len(), 2);
    let skierg_outcome = fetched
        .iter()
        .find(|r| r.workout_exercise_id == skierg.id)
        .unwrap();
    assert_eq!(skierg_outcome.time_seconds, Some(238));

    assert!(ops::get_exercise_results(&mut conn, &other.id).unwrap().is_empty());
}

#[test]
fn race_results_round_trip_newest_first() {
    let mut conn = test_conn();
    for (date, total) in [("2026-05-10", 5400), ("2026-08-01", 4980)] {
        ops::create_race_result(
            &mut conn,
            NewHyroxRaceResult {
                id: String::new(),
                race_date: date.parse().unwrap(),
                race_location: Some("London Excel".into()),
                division: Some("open".into()),
                total_time_seconds: total,
                skierg_time: Some(260),
                sled_push_time: None,
                sled_pull_time: None,
                burpee_broad_jump_time: None,
                rowing_time: None,
                farmers_carry_time: None,
                sandbag_lunges_time: None,
                wall_balls_time: None,
                run_1_time: None,
                run_2_time: None,
                run_3_time: None,
                run_4_time: None,
                run_5_time: None,
                run_6_time: None,
                run_7_time: None,
                run_8_time: None,
                transitions_total_time: None,
                notes: None,
            },
        )
        .unwrap();
    }

    let races = ops::get_race_results(&mut conn).unwrap();
    assert_eq!(races.len(), 2);
    assert_eq!(races[0].total_time_seconds, 4980);
    assert!(!races[0].id.is_empty());
}

#[test]
fn imported_program_fills_missing_schedule_from_start_date() {
    use hyrox::parser::{ParsedExercise, ParsedProgram, ParsedProgramMeta, ParsedWorkout};

    let mut conn = test_conn();
    let parsed = ParsedProgram {
        program: ParsedProgramMeta {
            name: "Two Day Block".into(),
            description: Some("Short test block".into()),
            total_weeks: None,
            total_days: 2,
        },
        workouts: vec![
            ParsedWorkout {
                day_number: 1,
                week_number: Some(1),
                scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 1),
                title: "Engine Day".into(),
                workout_type: "hyrox_simulation".into(),
                description: None,
                exercises: vec![ParsedExercise {
                    exercise_order: 1,
                    exercise_name: "SkiErg".into(),
                    exercise_type: Some("skierg".into()),
                    sets: None,
                    reps: None,
                    weight: None,
                    distance: Some("1000m".into()),
                    duration: None,
                    rest_period: None,
                    notes: None,
                }],
            },
            ParsedWorkout {
                day_number: 2,
                week_number: Some(1),
                scheduled_date: None,
                title: "Recovery".into(),
                workout_type: "recovery".into(),
                description: None,
                exercises: vec![],
            },
        ],
    };

    let program = ops::import_parsed_program(
        &mut conn,
        &parsed,
        "raw plan text",
        NaiveDate::from_ymd_opt(2026, 9, 1),
    )
    .unwrap();
    assert_eq!(program.end_date, NaiveDate::from_ymd_opt(2026, 9, 2));

    let imported = ops::get_workouts_by_program(&mut conn, &program.id).unwrap();
    assert_eq!(imported.len(), 2);
    // Day 2 had no scheduled_date in the parse; it falls back to start + 1.
    assert_eq!(imported[1].scheduled_date, NaiveDate::from_ymd_opt(2026, 9, 2));

    let exercises = ops::get_exercises_by_workout(&mut conn, &imported[0].id).unwrap();
    assert_eq!(exercises.len(), 1);
    assert_eq!(exercises[0].exercise_name, "SkiErg");
}

#[test]
fn personal_record_filter_by_type() {
    let mut conn = test_conn();
    ops::create_personal_record(&mut conn, "skierg", "1000m SkiErg", "time", "3:58", None, None)
        .unwrap();
    ops::create_personal_record(&mut conn, "strength", "Back Squat", "weight", "140kg", None, None)
        .unwrap();

    let all = ops::get_personal_records(&mut conn, None).unwrap();
    assert_eq!(all.len(), 2);
    let skierg_only = ops::get_personal_records(&mut conn, Some("skierg")).unwrap();
    assert_eq!(skierg_only.len(), 1);
    assert_eq!(skierg_only[0].exercise_name, "1000m SkiErg");
}
