//! Style presets: each named style maps to fixed prompt text.
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Anime,
    Cartoon,
}

/// Positive/negative prompt pair plus an instruction for edit-style models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePrompt {
    pub positive: &'static str,
    pub negative: &'static str,
    pub instruction: &'static str,
}

const ANIME: StylePrompt = StylePrompt {
    positive: "anime style portrait, studio ghibli inspired, vibrant colors, clean lineart, \
               cel shading, expressive eyes, masterpiece, best quality",
    negative: "photorealistic, realistic, photo, 3d render, blurry, lowres, bad anatomy, \
               deformed face, extra fingers, ugly, watermark, text, signature",
    instruction: "Turn this photo into an anime illustration with vibrant colors and clean line art",
};

const CARTOON: StylePrompt = StylePrompt {
    positive: "cartoon style, pixar disney 3d animation, bright cheerful colors, smooth shading, \
               big expressive eyes, family friendly, high quality",
    negative: "photorealistic, photo, realistic skin texture, blurry, lowres, deformed, \
               ugly, creepy, horror, watermark, text, signature",
    instruction: "Turn this photo into a colorful Pixar-style 3D cartoon",
};

impl Style {
    pub const ALL: [Style; 2] = [Style::Anime, Style::Cartoon];

    /// Lenient parse used for form input: anything unrecognized is `Anime`.
    pub fn from_field(raw: &str) -> Style {
        raw.parse().unwrap_or_else(|_| {
            tracing::debug!(style = raw, "unknown style, falling back to anime");
            Style::Anime
        })
    }

    pub fn prompt(&self) -> &'static StylePrompt {
        match self {
            Style::Anime => &ANIME,
            Style::Cartoon => &CARTOON,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Anime => "anime",
            Style::Cartoon => "cartoon",
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anime" => Ok(Style::Anime),
            "cartoon" => Ok(Style::Cartoon),
            other => Err(format!("unknown style '{}'", other)),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_style_falls_back_to_anime() {
        assert_eq!(Style::from_field("watercolor"), Style::Anime);
        assert_eq!(Style::from_field(""), Style::Anime);
        assert_eq!(Style::from_field("watercolor").prompt(), Style::Anime.prompt());
    }

    #[test]
    fn known_styles_parse_case_insensitively() {
        assert_eq!(Style::from_field("Cartoon"), Style::Cartoon);
        assert_eq!(Style::from_field(" anime "), Style::Anime);
    }

    #[test]
    fn every_style_has_distinct_prompts() {
        let a = Style::Anime.prompt();
        let c = Style::Cartoon.prompt();
        assert_ne!(a.positive, c.positive);
        assert_ne!(a.negative, c.negative);
        for style in Style::ALL {
            assert!(!style.prompt().instruction.is_empty());
        }
    }
}
