//! Plain-text rendering for command output (stdout)

use crate::poller::TaskOutcome;
use skillcoach_common::api::{
    AnalysisResult, ChatHistoryEntry, DevelopmentPlan, ProfileWithHistory, Test, User,
    UserTestResult,
};
use skillcoach_common::{Skill, SkillScores};

/// Width of the score bar at 100 points
const BAR_WIDTH: usize = 20;

pub fn user_line(user: &User) -> String {
    let mut line = format!("{} <{}> (id {}, {})", user.display_name(), user.email, user.id, role_name(user));
    if !user.is_active {
        line.push_str(" [inactive]");
    }
    line
}

fn role_name(user: &User) -> &'static str {
    if user.is_admin() {
        "admin"
    } else {
        "user"
    }
}

fn bar(score: f64) -> String {
    let filled = ((score.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// One line per skill with a bar, then average and feedback
pub fn scores(scores: &SkillScores) -> String {
    let mut out = String::new();
    for (skill, value) in scores.iter() {
        out.push_str(&format!("  {:<22} {:>5.1} {}\n", skill.label(), value, bar(value)));
    }
    out.push_str(&format!("  {:<22} {:>5.1}\n", "Average", scores.average()));
    if let Some(feedback) = scores.feedback.as_deref().filter(|f| !f.trim().is_empty()) {
        out.push_str(&format!("\nFeedback:\n  {}\n", feedback.trim()));
    }
    out
}

fn skill_list(skills: &[Skill]) -> String {
    skills.iter().map(Skill::label).collect::<Vec<_>>().join(", ")
}

pub fn analysis_result(result: &AnalysisResult) -> String {
    let mut out = String::new();
    if let Some(created) = &result.created_at {
        out.push_str(&format!("Analysis from {}\n", created));
    }
    out.push_str(&scores(&result.scores));
    out.push_str(&format!("  Strongest: {}\n", skill_list(&result.scores.strengths(2))));
    out.push_str(&format!("  Weakest:   {}\n", skill_list(&result.scores.weaknesses(2))));
    out
}

pub fn outcome(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Completed(result) => analysis_result(result),
        TaskOutcome::Failed { task_id } => format!("Analysis {} failed on the server\n", task_id),
    }
}

pub fn test_summary(test: &Test) -> String {
    format!("[{}] {} ({}, {} questions)", test.id, test.title, test.kind, test.questions.len())
}

pub fn test_detail(test: &Test) -> String {
    let mut out = format!("{}\n", test_summary(test));
    if !test.description.trim().is_empty() {
        out.push_str(&format!("{}\n", test.description.trim()));
    }
    for (n, question) in test.questions.iter().enumerate() {
        out.push_str(&format!("\n{}. [{}] {}\n", n + 1, question.id, question.text));
        if let Some(options) = &question.options {
            for option in options {
                match &option.value {
                    Some(value) => out.push_str(&format!("   - {} ({})\n", option.text, value)),
                    None => out.push_str(&format!("   - {}\n", option.text)),
                }
            }
        }
    }
    out
}

pub fn test_result(result: &UserTestResult) -> String {
    let score = result
        .score
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| "-".to_string());
    let when = result
        .completed_at
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    format!("[{}] test {} score {} {}", result.id, result.test_id, score, when)
}

pub fn chat_entry(entry: &ChatHistoryEntry) -> String {
    let speaker = if entry.is_user { "You" } else { "Coach" };
    let mut line = format!("{}: {}", speaker, entry.message);
    if entry.audio_url.is_some() {
        line.push_str(&format!("  [audio #{}]", entry.id));
    }
    line
}

pub fn profile_history(profile: &ProfileWithHistory) -> String {
    let mut out = scores(&profile.current);
    if !profile.strengths.is_empty() {
        out.push_str(&format!("\nStrengths:  {}\n", profile.strengths.join(", ")));
    }
    if !profile.weaknesses.is_empty() {
        out.push_str(&format!("Weaknesses: {}\n", profile.weaknesses.join(", ")));
    }
    if !profile.history.is_empty() {
        out.push_str("\nHistory (average):\n");
        for entry in &profile.history {
            out.push_str(&format!("  {}  {:>5.1}\n", entry.created_at, entry.scores.average()));
        }
    }
    if let Some(trend) = profile.average_trend() {
        out.push_str(&format!("\nTrend: {:+.1}\n", trend));
    }
    out
}

pub fn plan(plan: &DevelopmentPlan) -> String {
    let mut out = format!(
        "Plan #{} generated {} (progress {}/{} tasks, {:.0}%)\n",
        plan.id, plan.generated_at, plan.progress.completed, plan.progress.total, plan.progress.percentage
    );
    if !plan.weaknesses.is_empty() {
        out.push_str(&format!("Focus: {}\n", plan.weaknesses.join(", ")));
    }

    if !plan.materials.is_empty() {
        out.push_str("\nMaterials:\n");
        for material in &plan.materials {
            let progress = plan
                .material_progress
                .iter()
                .find(|p| p.material_id == material.id)
                .map(|p| format!(" {:.0}%", p.percentage))
                .unwrap_or_default();
            out.push_str(&format!(
                "  [{}] {} ({}, {}){}\n      {}\n",
                material.id, material.title, material.skill, material.difficulty, progress, material.url
            ));
        }
    }

    if !plan.tasks.is_empty() {
        out.push_str("\nTasks:\n");
        for task in &plan.tasks {
            let mark = if task.is_completed() { "x" } else { " " };
            out.push_str(&format!("  [{}] {} {} ({})\n", mark, task.id, task.description, task.skill));
        }
    }

    if !plan.recommended_tests.is_empty() {
        out.push_str("\nRecommended tests:\n");
        for rec in &plan.recommended_tests {
            out.push_str(&format!("  [{}] {}: {}\n", rec.test_id, rec.title, rec.reason));
        }
    }

    let achieved: Vec<_> = plan.achievements().collect();
    if !achieved.is_empty() {
        out.push_str("\nAchievements:\n");
        for achievement in achieved {
            out.push_str(&format!("  * {}\n", achievement.title));
        }
    }

    if let Some(stage) = &plan.final_stage {
        let state = if stage.completed {
            "completed"
        } else if stage.unlocked {
            "unlocked"
        } else {
            "locked"
        };
        out.push_str(&format!("\nFinal stage: {}\n", state));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scores() -> SkillScores {
        SkillScores {
            communication: 80.0,
            emotional_intelligence: 60.0,
            critical_thinking: 70.0,
            time_management: 40.0,
            leadership: 50.0,
            feedback: Some("Good structure.".to_string()),
        }
    }

    #[test]
    fn test_bar_bounds() {
        assert_eq!(bar(0.0), ".".repeat(BAR_WIDTH));
        assert_eq!(bar(100.0), "#".repeat(BAR_WIDTH));
        assert_eq!(bar(150.0), "#".repeat(BAR_WIDTH));
        assert_eq!(bar(50.0).matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn test_scores_include_feedback_and_average() {
        let text = scores(&sample_scores());
        assert!(text.contains("Average"));
        assert!(text.contains("60.0"));
        assert!(text.contains("Good structure."));
    }

    #[test]
    fn test_failed_outcome() {
        let text = outcome(&TaskOutcome::Failed {
            task_id: "t-1".to_string(),
        });
        assert!(text.contains("t-1"));
    }
}
