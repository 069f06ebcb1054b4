use anyhow::Result;

use crate::schema::Style;

/// Turns a user prompt into a richer one for the chosen style.
pub trait PromptEnhancer {
    fn enhance(&self, prompt: &str, style_id: &str) -> Result<String>;
}

/// Fixed-table enhancer: `"{prompt} {suffix}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEnhancer;

impl TemplateEnhancer {
    /// Descriptive clause appended for `style_id`; unknown ids use the
    /// cinematic clause.
    pub fn suffix_for(style_id: &str) -> &'static str {
        style_suffix(Style::from_id(style_id).unwrap_or(Style::Cinematic))
    }
}

impl PromptEnhancer for TemplateEnhancer {
    fn enhance(&self, prompt: &str, style_id: &str) -> Result<String> {
        Ok(format!("{} {}", prompt, Self::suffix_for(style_id)))
    }
}

pub fn style_suffix(style: Style) -> &'static str {
    match style {
        Style::Cinematic => {
            "with dramatic lighting, deep shadows, and cinematic composition. Golden hour ambiance with lens flares and atmospheric depth."
        }
        Style::Animation => {
            "in vibrant cartoon style with bold colors, exaggerated movements, and playful energy. Bright and cheerful aesthetic."
        }
        Style::Realistic => {
            "with photo-realistic details, natural lighting, and authentic textures. Subtle color grading and realistic physics."
        }
        Style::Abstract => {
            "with geometric patterns, bold shapes, and conceptual visuals. Dynamic composition with striking color contrasts."
        }
        Style::Retro => {
            "with vintage film grain, muted colors, and nostalgic VHS aesthetic. Scan lines and classic camera effects."
        }
    }
}
