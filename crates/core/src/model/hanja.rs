use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::HanjaId;

//
// ─── LESSON / DIFFICULTY ───────────────────────────────────────────────────────
//

/// Lesson number grouping catalog entries. Always positive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Chapter(u32);

impl Chapter {
    /// # Errors
    ///
    /// Returns `HanjaError::InvalidChapter` for zero.
    pub fn new(n: u32) -> Result<Self, HanjaError> {
        if n == 0 {
            return Err(HanjaError::InvalidChapter(n));
        }
        Ok(Self(n))
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Chapter {
    type Error = HanjaError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Chapter> for u32 {
    fn from(chapter: Chapter) -> Self {
        chapter.0
    }
}

impl fmt::Debug for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chapter({})", self.0)
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordinal difficulty, 1 (easiest) through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns `HanjaError::InvalidDifficulty` outside `1..=5`.
    pub fn new(level: u8) -> Result<Self, HanjaError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(HanjaError::InvalidDifficulty(level))
        }
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = HanjaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

//
// ─── CATALOG ENTRY ─────────────────────────────────────────────────────────────
//

/// Example word or phrase using the character, with its meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub sentence: String,
    pub meaning: String,
}

impl Example {
    #[must_use]
    pub fn new(sentence: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            meaning: meaning.into(),
        }
    }
}

/// Immutable catalog entry shown on a flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hanja {
    pub id: HanjaId,
    pub character: String,
    pub sound: String,
    pub meaning: String,
    #[serde(default)]
    pub stroke_order: Vec<String>,
    #[serde(default)]
    pub examples: Vec<Example>,
    pub chapter: Chapter,
    pub difficulty: Difficulty,
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Create payload: everything but the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HanjaDraft {
    pub character: String,
    pub sound: String,
    pub meaning: String,
    #[serde(default)]
    pub stroke_order: Vec<String>,
    #[serde(default)]
    pub examples: Vec<Example>,
    pub chapter: u32,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
}

fn default_difficulty() -> u8 {
    Difficulty::default().value()
}

impl HanjaDraft {
    /// # Errors
    ///
    /// Returns `HanjaError` when a required text field is blank or a numeric
    /// field is out of range.
    pub fn validate(self) -> Result<ValidatedHanja, HanjaError> {
        let character = required("character", self.character)?;
        let sound = required("sound", self.sound)?;
        let meaning = required("meaning", self.meaning)?;
        let chapter = Chapter::new(self.chapter)?;
        let difficulty = Difficulty::new(self.difficulty)?;
        validate_examples(&self.examples)?;

        Ok(ValidatedHanja {
            character,
            sound,
            meaning,
            stroke_order: self.stroke_order,
            examples: self.examples,
            chapter,
            difficulty,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedHanja {
    pub character: String,
    pub sound: String,
    pub meaning: String,
    pub stroke_order: Vec<String>,
    pub examples: Vec<Example>,
    pub chapter: Chapter,
    pub difficulty: Difficulty,
}

impl ValidatedHanja {
    #[must_use]
    pub fn assign_id(self, id: HanjaId) -> Hanja {
        Hanja {
            id,
            character: self.character,
            sound: self.sound,
            meaning: self.meaning,
            stroke_order: self.stroke_order,
            examples: self.examples,
            chapter: self.chapter,
            difficulty: self.difficulty,
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HanjaPatch {
    pub character: Option<String>,
    pub sound: Option<String>,
    pub meaning: Option<String>,
    pub stroke_order: Option<Vec<String>>,
    pub examples: Option<Vec<Example>>,
    pub chapter: Option<u32>,
    pub difficulty: Option<u8>,
}

impl HanjaPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch on top of `current`, re-validating touched fields.
    ///
    /// # Errors
    ///
    /// Returns `HanjaError` if any provided field is invalid.
    pub fn apply(self, current: &Hanja) -> Result<Hanja, HanjaError> {
        let mut next = current.clone();
        if let Some(character) = self.character {
            next.character = required("character", character)?;
        }
        if let Some(sound) = self.sound {
            next.sound = required("sound", sound)?;
        }
        if let Some(meaning) = self.meaning {
            next.meaning = required("meaning", meaning)?;
        }
        if let Some(stroke_order) = self.stroke_order {
            next.stroke_order = stroke_order;
        }
        if let Some(examples) = self.examples {
            validate_examples(&examples)?;
            next.examples = examples;
        }
        if let Some(chapter) = self.chapter {
            next.chapter = Chapter::new(chapter)?;
        }
        if let Some(difficulty) = self.difficulty {
            next.difficulty = Difficulty::new(difficulty)?;
        }
        Ok(next)
    }
}

fn required(field: &'static str, value: String) -> Result<String, HanjaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HanjaError::EmptyField(field));
    }
    Ok(trimmed.to_owned())
}

fn validate_examples(examples: &[Example]) -> Result<(), HanjaError> {
    for (index, example) in examples.iter().enumerate() {
        if example.sentence.trim().is_empty() || example.meaning.trim().is_empty() {
            return Err(HanjaError::EmptyExample { index });
        }
    }
    Ok(())
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HanjaError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("chapter must be positive, got {0}")]
    InvalidChapter(u32),

    #[error("difficulty must be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),

    #[error("example #{index} needs both a sentence and a meaning")]
    EmptyExample { index: usize },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
