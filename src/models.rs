use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GenerationError;

// 入口页面的推荐主题
pub const TOPIC_PRESETS: [&str; 8] = [
    "Basic Greetings",
    "Numbers & Counting",
    "Ordering Food",
    "Asking Directions",
    "Family Members",
    "Emergency Phrases",
    "Shopping & Bargaining",
    "Time & Dates",
];

// 单张卡片
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FlashcardRecord {
    pub term: String,
    pub translation_primary: String,
    pub translation_primary_pronunciation: String,
    pub translation_secondary: String,
    pub translation_secondary_phonetic: String,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }

    /// Next level, wrapping from `Advanced` back to `Beginner`.
    pub fn cycle(self) -> Self {
        match self {
            Difficulty::Beginner => Difficulty::Intermediate,
            Difficulty::Intermediate => Difficulty::Advanced,
            Difficulty::Advanced => Difficulty::Beginner,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GenerationError::Validation(format!("unknown difficulty: {}", s.trim())))
    }
}

// 一次生成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
    difficulty: Difficulty,
}

impl GenerationRequest {
    pub fn new(topic: &str, difficulty: Difficulty) -> Result<Self, GenerationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::Validation("topic must not be empty".to_string()));
        }
        Ok(GenerationRequest {
            topic: topic.to_string(),
            difficulty,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

/// Picks the topic to send: non-blank free text wins over the preset.
pub fn resolve_topic(preset: Option<&str>, free_text: &str) -> Option<String> {
    let custom = free_text.trim();
    if !custom.is_empty() {
        return Some(custom.to_string());
    }
    preset
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}
