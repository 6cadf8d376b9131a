//! The progress-analysis prompt sent to the model.

use istart_core::{log::Log, project::Project};

/// Compose the scoring prompt for `today_work` on day `current_day`.
///
/// `logs` is the project's history ordered by day; it is rendered one line
/// per entry with the score each day received.
pub fn build_prompt(project: &Project, logs: &[Log], current_day: i64, today_work: &str) -> String {
  let remaining = i64::from(project.deadline) - current_day;

  let history = if logs.is_empty() {
    "No previous work logged.".to_owned()
  } else {
    logs
      .iter()
      .map(|log| format!("Day {}: {} (Score: {}/20)", log.day, log.work, log.score))
      .collect::<Vec<_>>()
      .join("\n")
  };

  format!(
    "You are a project progress analyzer. Here's the project:

Project: {name}
Description: {description}
Milestones: {milestones}
Deadline: {deadline} days
Days Elapsed: {current_day}
Days Remaining: {remaining}

Previous Work Log:
{history}

Today (Day {current_day}): {today_work}

Based on ALL the progress so far, analyze if the user can complete this project on time.

Give today a score from 0-20 points based on:
- How much meaningful work was done today
- Whether this pace will complete the project on time
- Complexity of remaining tasks
- Quality and relevance of work done

Return ONLY valid JSON (no markdown, no code blocks):
{{
  \"score\": <number 0-20>,
  \"analysis\": \"<brief explanation of today's score in 1-2 sentences>\",
  \"onTrack\": <boolean>,
  \"suggestion\": \"<specific actionable advice for tomorrow in 1 sentence>\"
}}",
    name = project.name,
    description = project.description,
    milestones = project.milestones.join(", "),
    deadline = project.deadline,
  )
}
