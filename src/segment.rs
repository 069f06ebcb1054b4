use anyhow::Result;

use crate::schema::{SceneDescriptor, SceneSequence, Style};

/// Splits a generation request into an ordered scene sequence.
pub trait SceneSegmenter {
    fn segment(&self, style_id: &str) -> Result<SceneSequence>;
}

/// Fixed per-style scene tables; unknown style ids get the cinematic table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSegmenter;

impl SceneSegmenter for TemplateSegmenter {
    fn segment(&self, style_id: &str) -> Result<SceneSequence> {
        let style = Style::from_id(style_id).unwrap_or_else(|| {
            tracing::debug!(style_id, "unknown style id, using cinematic scene table");
            Style::Cinematic
        });
        Ok(scene_table(style).into())
    }
}

pub fn scene_table(style: Style) -> Vec<SceneDescriptor> {
    match style {
        Style::Cinematic => vec![
            SceneDescriptor::new(
                "Opening shot with dramatic reveal",
                &["Main subject", "Background", "Lighting"],
                &["#1a1a2e", "#e94560", "#f4a261"],
                "slow zoom",
            ),
            SceneDescriptor::new(
                "Mid-scene with dynamic action",
                &["Movement", "Atmosphere", "Details"],
                &["#16213e", "#e76f51", "#f4a261"],
                "pan left",
            ),
            SceneDescriptor::new(
                "Closing scene with emotional impact",
                &["Resolution", "Mood", "Final view"],
                &["#0f3460", "#e94560", "#2a9d8f"],
                "static hold",
            ),
        ],
        Style::Animation => vec![
            SceneDescriptor::new(
                "Vibrant opening with bouncy energy",
                &["Characters", "Background", "Props"],
                &["#ff006e", "#8338ec", "#3a86ff"],
                "bounce",
            ),
            SceneDescriptor::new(
                "Playful interaction scene",
                &["Action", "Effects", "Movement"],
                &["#fb5607", "#ffbe0b", "#8338ec"],
                "dynamic",
            ),
            SceneDescriptor::new(
                "Cheerful conclusion",
                &["Finale", "Celebration", "Joy"],
                &["#3a86ff", "#ff006e", "#ffbe0b"],
                "spin",
            ),
        ],
        Style::Realistic => vec![
            SceneDescriptor::new(
                "Natural opening establishing shot",
                &["Environment", "Subject", "Lighting"],
                &["#2d3748", "#4a5568", "#718096"],
                "slow pan",
            ),
            SceneDescriptor::new(
                "Detailed mid-scene focus",
                &["Details", "Texture", "Depth"],
                &["#1a202c", "#2d3748", "#4a5568"],
                "zoom in",
            ),
            SceneDescriptor::new(
                "Contemplative closing shot",
                &["Atmosphere", "Emotion", "Context"],
                &["#2d3748", "#4a5568", "#718096"],
                "static",
            ),
        ],
        Style::Abstract => vec![
            SceneDescriptor::new(
                "Bold geometric opening",
                &["Shapes", "Patterns", "Forms"],
                &["#7209b7", "#f72585", "#4361ee"],
                "rotation",
            ),
            SceneDescriptor::new(
                "Complex pattern evolution",
                &["Transformation", "Flow", "Energy"],
                &["#3a0ca3", "#f72585", "#4cc9f0"],
                "morph",
            ),
            SceneDescriptor::new(
                "Striking final composition",
                &["Balance", "Contrast", "Unity"],
                &["#560bad", "#b5179e", "#4361ee"],
                "pulse",
            ),
        ],
        Style::Retro => vec![
            SceneDescriptor::new(
                "Nostalgic VHS-style opening",
                &["Vintage look", "Grain", "Tracking"],
                &["#8b0000", "#2f4f4f", "#d4af37"],
                "tracking shift",
            ),
            SceneDescriptor::new(
                "Classic mid-scene with artifacts",
                &["Distortion", "Color bleed", "Scan lines"],
                &["#800020", "#1c1c1c", "#d4af37"],
                "static pan",
            ),
            SceneDescriptor::new(
                "Retro ending with fade",
                &["Vignette", "Fade out", "Credits feel"],
                &["#4b0082", "#2f4f4f", "#cd853f"],
                "slow fade",
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::is_hex_color;

    #[test]
    fn every_table_has_three_well_formed_scenes() {
        for style in Style::ALL {
            let scenes = scene_table(style);
            assert_eq!(scenes.len(), 3, "{style} table size");
            for scene in &scenes {
                assert!(!scene.description.is_empty());
                assert_eq!(scene.elements.len(), 3);
                assert!(scene.colors.len() >= 2);
                assert!(scene.colors.iter().all(|color| is_hex_color(color)));
            }
        }
    }

    #[test]
    fn segmenting_is_deterministic() {
        let first = TemplateSegmenter.segment("abstract").unwrap();
        let second = TemplateSegmenter.segment("abstract").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_style_falls_back_to_cinematic() {
        let fallback = TemplateSegmenter.segment("bogus-unknown").unwrap();
        let cinematic = TemplateSegmenter.segment("cinematic").unwrap();
        assert_eq!(fallback, cinematic);
        assert_eq!(fallback[0].description, "Opening shot with dramatic reveal");
    }
}
