use serde::{Deserialize, Serialize};

/// A stated categorical preference from the user
///
/// Each variant resolves to a fixed representative description which is
/// embedded once and compared against movie embeddings; the similarity layer
/// stays agnostic to how many categories exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "category", content = "value", rename_all = "snake_case")]
pub enum StatedPreference {
    Filmmaking(FilmmakingStyle),
    Animation(AnimationStyle),
    Era(EraPreference),
    Tone(TonePreference),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilmmakingStyle {
    PracticalEffects,
    CharacterDriven,
    VisualSpectacle,
    SlowBurn,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStyle {
    HandDrawn,
    StopMotion,
    Computer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EraPreference {
    Classic,
    Nineties,
    Contemporary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TonePreference {
    Lighthearted,
    Dark,
    Suspenseful,
}

impl StatedPreference {
    /// Fixed representative description for this preference category.
    ///
    /// The description is what gets embedded; it is phrased the way a movie
    /// synopsis would read so that cosine similarity against movie embeddings
    /// is meaningful.
    pub fn description(&self) -> &'static str {
        match self {
            StatedPreference::Filmmaking(FilmmakingStyle::PracticalEffects) => {
                "Films built on practical effects, real stunts, miniatures and on-set craftsmanship"
            }
            StatedPreference::Filmmaking(FilmmakingStyle::CharacterDriven) => {
                "Intimate character studies driven by performances and personal relationships"
            }
            StatedPreference::Filmmaking(FilmmakingStyle::VisualSpectacle) => {
                "Large-scale visual spectacle with sweeping cinematography and grand set pieces"
            }
            StatedPreference::Filmmaking(FilmmakingStyle::SlowBurn) => {
                "Deliberately paced slow-burn storytelling that builds atmosphere and tension"
            }
            StatedPreference::Animation(AnimationStyle::HandDrawn) => {
                "Hand-drawn traditional animation with expressive painted backgrounds"
            }
            StatedPreference::Animation(AnimationStyle::StopMotion) => {
                "Stop-motion animation with tactile handcrafted puppets and sets"
            }
            StatedPreference::Animation(AnimationStyle::Computer) => {
                "Modern computer-generated animation with polished three-dimensional visuals"
            }
            StatedPreference::Era(EraPreference::Classic) => {
                "Classic golden-age cinema from the studio era"
            }
            StatedPreference::Era(EraPreference::Nineties) => {
                "Films from the nineteen nineties with the decade's distinctive style"
            }
            StatedPreference::Era(EraPreference::Contemporary) => {
                "Contemporary recent releases reflecting current filmmaking trends"
            }
            StatedPreference::Tone(TonePreference::Lighthearted) => {
                "Lighthearted feel-good stories with warmth and humor"
            }
            StatedPreference::Tone(TonePreference::Dark) => {
                "Dark brooding stories exploring morally complex themes"
            }
            StatedPreference::Tone(TonePreference::Suspenseful) => {
                "Suspenseful tension-filled thrillers that keep the audience guessing"
            }
        }
    }
}
