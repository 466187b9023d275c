//! Prompt text for each AI capability.
//!
//! Every prompt asks for a single JSON object so the client can request
//! `response_format: json_object` and parse the answer directly.

use crate::ai::{JudgeRequest, MirrorRequest};
use crate::onboarding::OnboardingAnswers;

pub const MEANING_SYSTEM: &str = "\
You help people turn honest reflection into a personal commitment.
Given why they want to change, the pain of staying the same, and their ideal self,
write a Meaning Statement (2-3 sentences, first person, the deeper reason) and a Vow
(one sentence, first person, a concrete behavioral pledge).
Respond with JSON: {\"meaningStatement\": string, \"vow\": string}.";

pub const SCORING_SYSTEM: &str = "\
You evaluate evidence a person logged as proof of progress toward their vow.
For each numbered evidence item, score from 0.0 to 1.0 how clearly it demonstrates
action aligned with the vow and meaning statement, and give a one-sentence rationale.
Score every item exactly once, using its number as \"index\".
Respond with JSON: {\"scores\": [{\"index\": number, \"score\": number, \"rationale\": string}]}.";

pub const EXTRACTION_SYSTEM: &str = "\
You extract facts worth remembering about a person from their daily check-in.
Use \"milestone\" for lasting achievements, decisions, or turning points and
\"short_term\" for moods, plans, or circumstances that will fade within weeks.
Each memory is one sentence. Tags are short lowercase topics. Confidence is 0.0 to 1.0.
Return an empty list when nothing is worth keeping.
Respond with JSON: {\"memories\": [{\"content\": string, \"memoryType\": \"short_term\" | \"milestone\", \"tags\": [string], \"confidence\": number}]}.";

pub const MIRROR_SYSTEM: &str = "\
You are a calm, honest mirror for someone keeping a personal vow.
Reflect back what their check-in shows about their commitment in 2-4 sentences.
Do not lecture and do not invent facts that are not in the check-in.
Respond with JSON: {\"mirrorFeedback\": string}.";

pub fn meaning_user(answers: &OnboardingAnswers) -> String {
    format!(
        "Why I want to change:\n{}\n\nThe pain of staying the same:\n{}\n\nMy ideal self:\n{}",
        answers.why.trim(),
        answers.pain.trim(),
        answers.ideal.trim()
    )
}

fn context_block(vow: Option<&str>, meaning: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(vow) = vow.filter(|v| !v.trim().is_empty()) {
        lines.push(format!("Vow: {}", vow.trim()));
    }
    if let Some(meaning) = meaning.filter(|m| !m.trim().is_empty()) {
        lines.push(format!("Meaning statement: {}", meaning.trim()));
    }
    if lines.is_empty() {
        lines.push("Vow: (not provided)".to_string());
    }
    lines.join("\n")
}

pub fn scoring_user(request: &JudgeRequest<'_>) -> String {
    let items: Vec<String> = request
        .evidences
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "[{}] ({}) {}",
                i + 1,
                e.submitted_at.format("%Y-%m-%d"),
                e.content.trim()
            )
        })
        .collect();

    format!(
        "{}\n\nEvidence:\n{}",
        context_block(request.vow_content, request.meaning_content),
        items.join("\n")
    )
}

pub fn extraction_user(transcript: &str) -> String {
    format!("Check-in transcript:\n{}", transcript.trim())
}

pub fn mirror_user(request: &MirrorRequest<'_>) -> String {
    format!(
        "{}\n\nToday's check-in:\n{}",
        context_block(request.vow_content, request.meaning_content),
        request.checkin_text.trim()
    )
}
