//! Mirror feedback: a short reflection on one check-in, in light of the vow.

use crate::ai::{MirrorRequest, TextGenerator};
use crate::error::{AnalysisError, CoreError, Result};

/// Generate mirror feedback for a check-in.
///
/// # Errors
/// - `Validation` if `checkin_text` is blank
/// - `Analysis` if the call fails or returns blank text
pub async fn generate_mirror_feedback(
    generator: &dyn TextGenerator,
    checkin_text: &str,
    vow_content: Option<&str>,
    meaning_content: Option<&str>,
) -> Result<String> {
    if checkin_text.trim().is_empty() {
        return Err(CoreError::empty_field("checkinText"));
    }

    let feedback = generator
        .generate_mirror_feedback(&MirrorRequest {
            checkin_text,
            vow_content,
            meaning_content,
        })
        .await?;

    let feedback = feedback.trim();
    if feedback.is_empty() {
        return Err(AnalysisError::Malformed("empty mirror feedback".into()).into());
    }
    Ok(feedback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::ScriptedAi;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn returns_trimmed_feedback() {
        let ai = ScriptedAi::new().with_mirror("\nYou showed up even when tired.\n");
        let feedback = generate_mirror_feedback(&ai, "Walked despite rain", Some("I walk daily"), None)
            .await
            .unwrap();
        assert_eq!(feedback, "You showed up even when tired.");
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_ai() {
        let ai = ScriptedAi::new().with_mirror("anything");
        let err = generate_mirror_feedback(&ai, "  ", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn blank_feedback_is_analysis_failure() {
        let ai = ScriptedAi::new().with_mirror("   ");
        let err = generate_mirror_feedback(&ai, "Walked", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }
}
