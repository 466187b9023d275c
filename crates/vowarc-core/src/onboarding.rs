//! Onboarding: turn the three reflective answers into a Meaning Statement and
//! a Vow.
//!
//! The answers travel as one explicit [`OnboardingAnswers`] value rather than
//! living in shared state between onboarding steps. Generation is
//! all-or-nothing: a vow without a meaning statement (or the reverse) is never
//! returned.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::TextGenerator;
use crate::error::{AnalysisError, CoreError, Result};

/// Answers collected during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingAnswers {
    /// Why the user wants to change.
    pub why: String,
    /// What staying the same costs them.
    pub pain: String,
    /// Who they want to become.
    pub ideal: String,
}

impl OnboardingAnswers {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("why", &self.why), ("pain", &self.pain), ("ideal", &self.ideal)] {
            if value.trim().is_empty() {
                return Err(CoreError::empty_field(field));
            }
        }
        Ok(())
    }
}

/// The canonical commitment texts produced at onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeaningAndVow {
    pub meaning_statement: String,
    pub vow: String,
}

/// Generate the meaning statement and vow in a single AI call.
///
/// # Errors
/// - `Validation` if any answer is blank (no AI call is made)
/// - `Analysis` if the call fails or either text comes back blank
pub async fn generate_meaning_and_vow(
    generator: &dyn TextGenerator,
    answers: &OnboardingAnswers,
) -> Result<MeaningAndVow> {
    answers.validate()?;

    let generated = generator.generate_meaning(answers).await?;
    let meaning_statement = generated.meaning_statement.trim().to_string();
    let vow = generated.vow.trim().to_string();

    if meaning_statement.is_empty() || vow.is_empty() {
        return Err(AnalysisError::Malformed(
            "meaning statement and vow must both be present".into(),
        )
        .into());
    }

    debug!(
        meaning_len = meaning_statement.len(),
        vow_len = vow.len(),
        "generated meaning and vow"
    );

    Ok(MeaningAndVow {
        meaning_statement,
        vow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::ScriptedAi;
    use crate::error::ErrorKind;

    fn answers() -> OnboardingAnswers {
        OnboardingAnswers {
            why: "I want to be calmer with my family".into(),
            pain: "I snap at people when I am stressed".into(),
            ideal: "Someone who pauses before reacting".into(),
        }
    }

    #[tokio::test]
    async fn test_generates_trimmed_pair() {
        let ai = ScriptedAi::new().with_meaning("  I pause because I love them. ", " I breathe before I answer. ");
        let result = generate_meaning_and_vow(&ai, &answers()).await.unwrap();
        assert_eq!(result.meaning_statement, "I pause because I love them.");
        assert_eq!(result.vow, "I breathe before I answer.");
    }

    #[tokio::test]
    async fn test_blank_answer_skips_ai() {
        let ai = ScriptedAi::new().with_meaning("m", "v");
        let mut input = answers();
        input.pain = "   ".into();

        let err = generate_meaning_and_vow(&ai, &input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("pain"));
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_vow_fails_as_unit() {
        let ai = ScriptedAi::new().with_meaning("I pause because I love them.", "");
        let err = generate_meaning_and_vow(&ai, &answers()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }

    #[tokio::test]
    async fn test_missing_meaning_fails_as_unit() {
        let ai = ScriptedAi::new().with_meaning(" ", "I breathe before I answer.");
        let err = generate_meaning_and_vow(&ai, &answers()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }

    #[tokio::test]
    async fn test_outage_is_analysis_failure() {
        let ai = ScriptedAi::failing();
        let err = generate_meaning_and_vow(&ai, &answers()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }
}
