//! Coaching layer: turns logged training data into prompts and hands them
//! to the LLM for analysis, guidance and race breakdowns.

use anyhow::Result;
use log::{debug, info};
use serde::Serialize;
use serde_json::json;

use crate::db::models::{
    HyroxRaceResult, PersonalRecord, Workout, WorkoutExercise, WorkoutResult,
};
use crate::llm::LlmInterface;

pub const COACHING_SYSTEM_PROMPT: &str = "\
You are an expert Hyrox coach providing personalized training guidance.
Your role is to analyze workout performance data and provide actionable insights.

Consider:
1. Progress trends over time
2. Weaknesses in specific Hyrox stations
3. Recovery and training balance
4. Race preparation strategies
5. Technique improvements

Be encouraging but honest. Provide specific, actionable recommendations.
Keep responses concise and focused on the most important insights.";

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutHistoryEntry {
    pub date: String,
    pub duration_mins: f64,
    pub rpe: Option<i32>,
    pub feeling: Option<String>,
}

/// What the coach gets to see: recent history, averages, and the record
/// board. Serialized as JSON straight into the user prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_workouts: usize,
    pub workout_history: Vec<WorkoutHistoryEntry>,
    pub avg_rpe: f64,
    pub personal_records: Vec<PersonalRecord>,
}

const HISTORY_ENTRIES: usize = 20;
const RECORD_ENTRIES: usize = 10;

impl PerformanceSummary {
    pub fn build(results: &[WorkoutResult], records: &[PersonalRecord]) -> Self {
        let rpe_values: Vec<i32> = results.iter().filter_map(|r| r.perceived_effort).collect();
        let avg_rpe = if rpe_values.is_empty() {
            0.0
        } else {
            rpe_values.iter().sum::<i32>() as f64 / rpe_values.len() as f64
        };

        let workout_history = results
            .iter()
            .rev()
            .take(HISTORY_ENTRIES)
            .rev()
            .map(|r| WorkoutHistoryEntry {
                date: r.completed_at.format("%Y-%m-%d %H:%M").to_string(),
                duration_mins: r.total_duration_seconds.unwrap_or(0) as f64 / 60.0,
                rpe: r.perceived_effort,
                feeling: r.feeling.clone(),
            })
            .collect();

        Self {
            total_workouts: results.len(),
            workout_history,
            avg_rpe,
            personal_records: records.iter().take(RECORD_ENTRIES).cloned().collect(),
        }
    }
}

pub async fn coaching_insights(
    llm: &LlmInterface,
    summary: &PerformanceSummary,
    question: Option<&str>,
) -> Result<String> {
    debug!(
        "coaching_insights called workouts={} question={:?}",
        summary.total_workouts, question
    );
    let data = serde_json::to_string_pretty(summary)?;
    let focus = match question {
        Some(q) => format!("User Question: {}", q),
        None => "Provide a general analysis with key insights and recommendations.".to_string(),
    };
    let user = format!(
        "Analyze this Hyrox training performance data and provide coaching insights:\n\n\
         Performance Data:\n{data}\n\n\
         {focus}\n\n\
         Focus on:\n\
         1. Overall progress assessment\n\
         2. Strongest and weakest areas\n\
         3. Top 3 specific recommendations for improvement\n\
         4. Any concerns or areas needing attention\n\n\
         Keep response under 500 words and format with clear sections."
    );
    let insights = llm.call(COACHING_SYSTEM_PROMPT, &user).await?;
    info!("coaching_insights response length={}", insights.len());
    Ok(insights)
}

pub async fn workout_guidance(
    llm: &LlmInterface,
    workout: &Workout,
    exercises: &[WorkoutExercise],
    past_performance: Option<&PerformanceSummary>,
) -> Result<String> {
    debug!(
        "workout_guidance called workout={} exercises={}",
        workout.id,
        exercises.len()
    );
    let details = serde_json::to_string_pretty(&json!({
        "workout": workout,
        "exercises": exercises,
    }))?;
    let history = match past_performance {
        Some(summary) => format!(
            "Past Performance for Similar Exercises:\n{}",
            serde_json::to_string_pretty(summary)?
        ),
        None => "No past performance data available.".to_string(),
    };
    let user = format!(
        "Provide guidance for today's workout:\n\n\
         Workout Details:\n{details}\n\n\
         {history}\n\n\
         Provide:\n\
         1. Brief warmup recommendations\n\
         2. Pacing strategy for this workout\n\
         3. Key technique focus points\n\
         4. Target metrics based on past performance (if available)\n\
         5. Post-workout recovery tips\n\n\
         Keep response concise and actionable."
    );
    llm.call(COACHING_SYSTEM_PROMPT, &user).await
}

pub async fn analyze_race(
    llm: &LlmInterface,
    race: &HyroxRaceResult,
    training_history: Option<&PerformanceSummary>,
) -> Result<String> {
    debug!("analyze_race called race={}", race.id);
    let result = serde_json::to_string_pretty(race)?;
    let history = match training_history {
        Some(summary) => format!(
            "Recent Training History:\n{}",
            serde_json::to_string_pretty(summary)?
        ),
        None => String::new(),
    };
    let user = format!(
        "Analyze this Hyrox race performance:\n\n\
         Race Result:\n{result}\n\n\
         {history}\n\n\
         Provide:\n\
         1. Overall race analysis\n\
         2. Station-by-station breakdown (identify fastest/slowest)\n\
         3. Transition time analysis\n\
         4. Comparison to typical Hyrox benchmarks\n\
         5. Specific training focus areas for next race\n\
         6. Predicted improvement areas with targeted training\n\n\
         Format clearly with sections."
    );
    llm.call(COACHING_SYSTEM_PROMPT, &user).await
}
