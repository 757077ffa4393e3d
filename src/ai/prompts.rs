//! Prompt templates for the tutoring model

use std::fmt::Write as _;

use super::{PerformanceMetrics, RecentTopic};
use crate::store::Learner;
use crate::types::Subject;

/// System prompt for answering one homework question
pub fn tutor_system_prompt(subject: Subject, topic: &str) -> String {
    format!(
        r#"You are an expert educational tutor for high school students. Your role is to:
1. Understand student questions related to their homework
2. Provide clear, accurate, and helpful explanations
3. Break down complex concepts into simpler parts
4. Offer step-by-step solutions when needed
5. Encourage critical thinking by asking guiding questions when appropriate
6. Be encouraging and supportive in your tone

When answering questions, make sure to:
- Be concise but thorough
- Use examples when helpful
- Explain the "why" behind concepts
- Avoid simply giving answers; help students understand the material
- Tailor your response to high school level

Subject: {subject}
Topic: {topic}"#
    )
}

pub const ADVISOR_SYSTEM_PROMPT: &str = "You are an educational advisor helping high school students \
improve their academic performance. Provide personalized, actionable recommendations.";

pub const ANALYST_SYSTEM_PROMPT: &str = "You are an educational data analyst providing performance \
insights to help students improve.";

/// User prompt asking for a study plan from a learner's profile and recent topics
pub fn recommendation_prompt(learner: &Learner, recent: &[RecentTopic]) -> String {
    let subjects = learner
        .subjects
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut topics = String::new();
    for q in recent {
        let _ = writeln!(topics, "- {}: {} (Rating: {}/5)", q.subject, q.topic, q.rating);
    }

    format!(
        r#"Based on the following student learning data, provide personalized study recommendations:

Student Profile:
- Grade: {grade}
- Subjects: {subjects}
- Learning Style: {style}
- Total Queries Answered: {total}

Recent Query Topics:
{topics}
Please provide:
1. Top 3 priority topics to focus on based on performance
2. 2-3 specific study tips tailored to their learning style
3. Recommended learning sequence for next week
4. Motivational message

Format your response as a structured recommendation."#,
        grade = learner.grade,
        style = learner.learning_style,
        total = learner.total_queries_answered,
    )
}

/// User prompt asking for a performance assessment
pub fn analysis_prompt(metrics: &PerformanceMetrics) -> String {
    let data = serde_json::to_string_pretty(metrics).unwrap_or_default();

    format!(
        r#"Analyze this student's performance data and identify areas for improvement:

{data}

Provide:
1. Overall performance assessment
2. Top 2-3 weak areas that need attention
3. Top 2-3 strong areas to build upon
4. Specific recommendations for improvement

Keep response concise and actionable."#
    )
}
