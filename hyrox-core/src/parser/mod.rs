//! Turns free-text training plans into a structured program via the LLM.
//!
//! The JSON contract is deliberately lenient where models are sloppy:
//! numeric fields accept integer-or-float, prescription fields stay
//! free-form text ("10-12", "bodyweight", "AMRAP").

use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::llm::LlmInterface;

const PARSE_ATTEMPTS: usize = 3;
const PARSE_RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

fn deserialize_lenient_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrFloat {
        Int(i32),
        Float(f64),
    }

    match Option::<IntOrFloat>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrFloat::Int(i)) => Ok(Some(i)),
        Some(IntOrFloat::Float(f)) => {
            if f.is_finite() && f >= 0.0 {
                Ok(Some(f.round() as i32))
            } else {
                Err(Error::custom(format!("invalid integer value: {}", f)))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedProgramMeta {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub total_weeks: Option<i32>,
    pub total_days: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedWorkout {
    pub day_number: i32,
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub week_number: Option<i32>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    pub title: String,
    pub workout_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ParsedExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedExercise {
    pub exercise_order: i32,
    pub exercise_name: String,
    #[serde(default)]
    pub exercise_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub sets: Option<i32>,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rest_period: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedProgram {
    pub program: ParsedProgramMeta,
    pub workouts: Vec<ParsedWorkout>,
}

pub const PROGRAM_PARSER_SYSTEM_PROMPT: &str = "\
You are an expert fitness coach specializing in Hyrox training.
Your task is to parse workout program descriptions into structured JSON format.

Hyrox is a fitness race combining running with functional workout stations:
- 8 x 1km runs
- SkiErg (1000m)
- Sled Push (50m)
- Sled Pull (50m)
- Burpee Broad Jumps (80m)
- Rowing (1000m)
- Farmers Carry (200m)
- Sandbag Lunges (100m)
- Wall Balls (100 reps for men, 75 for women)

When parsing workouts, identify:
1. Individual training days/sessions
2. Exercise names and types
3. Sets, reps, weight, distance, duration
4. Rest periods
5. Any special notes or instructions

Exercise types should be categorized as:
- run, skierg, sled_push, sled_pull, burpee_broad_jump, rowing, farmers_carry, sandbag_lunges, wall_balls (Hyrox specific)
- strength, cardio, mobility, recovery (general categories)

Always output valid JSON matching the requested schema.";

fn user_parse_prompt(raw_text: &str, program_name: &str, start_date: Option<NaiveDate>) -> String {
    let start = start_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "Not specified - use day numbers only".to_string());
    format!(
        r#"Parse the following workout program into structured JSON format.

Program Name: {program_name}
Start Date: {start}

Workout Text:
{raw_text}

Return a JSON object with this structure:
{{
    "program": {{
        "name": "{program_name}",
        "description": "Brief description of the program",
        "total_weeks": number or null,
        "total_days": number
    }},
    "workouts": [
        {{
            "day_number": 1,
            "week_number": 1 or null,
            "scheduled_date": "YYYY-MM-DD" or null,
            "title": "Workout title",
            "workout_type": "strength|running|hyrox_simulation|recovery|mixed",
            "description": "Brief description of this workout",
            "exercises": [
                {{
                    "exercise_order": 1,
                    "exercise_name": "Exercise name",
                    "exercise_type": "run|skierg|sled_push|etc",
                    "sets": number or null,
                    "reps": "10" or "10-12" or "AMRAP" or null,
                    "weight": "50kg" or "bodyweight" or null,
                    "distance": "1km" or null,
                    "duration": "30 seconds" or null,
                    "rest_period": "60 seconds" or null,
                    "notes": "Any special instructions" or null
                }}
            ]
        }}
    ]
}}

If a start_date is provided, calculate scheduled_date for each workout day.
Be thorough and capture all exercises mentioned.
Respond with valid JSON only, no other text."#
    )
}

pub async fn parse_workout_program(
    llm: &LlmInterface,
    raw_text: &str,
    program_name: &str,
    start_date: Option<NaiveDate>,
) -> Result<ParsedProgram> {
    debug!(
        "parse_workout_program called name='{}' text_len={}",
        program_name,
        raw_text.len()
    );
    let user = user_parse_prompt(raw_text, program_name, start_date);
    // Models are flaky about emitting clean JSON; retry a couple of times
    // before giving up on the plan text.
    let parsed: ParsedProgram = llm
        .call_json_with_retry(
            PROGRAM_PARSER_SYSTEM_PROMPT,
            &user,
            PARSE_ATTEMPTS,
            PARSE_RETRY_BASE_DELAY,
        )
        .await?;
    info!(
        "parse_workout_program parsed '{}': {} days, {} workouts",
        parsed.program.name,
        parsed.program.total_days,
        parsed.workouts.len()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"```json
{
    "program": {"name": "8 Week Hyrox Prep", "description": "Race prep block", "total_weeks": 8.0, "total_days": 2},
    "workouts": [
        {
            "day_number": 1,
            "week_number": 1,
            "scheduled_date": "2026-09-01",
            "title": "Engine Day",
            "workout_type": "hyrox_simulation",
            "description": "Runs and stations",
            "exercises": [
                {"exercise_order": 1, "exercise_name": "1km Run", "exercise_type": "run", "sets": null, "reps": null, "weight": null, "distance": "1km", "duration": null, "rest_period": "90 seconds", "notes": null},
                {"exercise_order": 2, "exercise_name": "Wall Balls", "exercise_type": "wall_balls", "sets": 3.0, "reps": "AMRAP", "weight": "6kg", "distance": null, "duration": "60 seconds", "rest_period": null, "notes": "unbroken if possible"}
            ]
        },
        {
            "day_number": 2,
            "week_number": 1,
            "scheduled_date": null,
            "title": "Recovery",
            "workout_type": "recovery",
            "description": null,
            "exercises": []
        }
    ]
}
```"#;

    #[tokio::test]
    async fn parses_mocked_program_reply() {
        let llm = crate::llm::LlmInterface::new_mock_fn(|_s, _u| REPLY.to_string());
        let parsed = parse_workout_program(
            &llm,
            "Week 1: Day 1 engine day...",
            "8 Week Hyrox Prep",
            Some(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()),
        )
        .await
        .unwrap();

        assert_eq!(parsed.program.total_days, 2);
        assert_eq!(parsed.program.total_weeks, Some(8));
        assert_eq!(parsed.workouts.len(), 2);

        let day1 = &parsed.workouts[0];
        assert_eq!(
            day1.scheduled_date,
            Some(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap())
        );
        assert_eq!(day1.exercises.len(), 2);
        assert_eq!(day1.exercises[1].sets, Some(3));
        assert_eq!(day1.exercises[1].reps.as_deref(), Some("AMRAP"));
        assert!(parsed.workouts[1].exercises.is_empty());
    }

    #[tokio::test]
    async fn start_date_lands_in_user_prompt() {
        let llm = crate::llm::LlmInterface::new_mock_fn(|_s, u| {
            assert!(u.contains("Start Date: 2026-09-01"));
            assert!(u.contains("Program Name: Prep"));
            REPLY.to_string()
        });
        parse_workout_program(
            &llm,
            "some plan",
            "Prep",
            Some(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn rejects_negative_numeric_fields() {
        let llm = crate::llm::LlmInterface::new_mock_fn(|_s, _u| {
            r#"{"program": {"name": "x", "total_days": 1, "total_weeks": -2.5}, "workouts": []}"#
                .to_string()
        });
        assert!(
            parse_workout_program(&llm, "plan", "x", None)
                .await
                .is_err()
        );
    }
}
