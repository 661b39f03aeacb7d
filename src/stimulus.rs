use serde::{Deserialize, Serialize};

/// Colour names printed on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Word {
    Red,
    Green,
    Blue,
    Yellow,
}

/// Ink colours a word can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InkColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Word {
    pub const ALL: [Word; 4] = [Word::Red, Word::Green, Word::Blue, Word::Yellow];

    /// The ink colour this word names
    pub fn meaning(self) -> InkColor {
        match self {
            Word::Red => InkColor::Red,
            Word::Green => InkColor::Green,
            Word::Blue => InkColor::Blue,
            Word::Yellow => InkColor::Yellow,
        }
    }
}

impl InkColor {
    pub const ALL: [InkColor; 4] = [
        InkColor::Red,
        InkColor::Green,
        InkColor::Blue,
        InkColor::Yellow,
    ];

    /// Response button index for this ink colour
    pub fn response_index(self) -> usize {
        match self {
            InkColor::Red => 0,
            InkColor::Green => 1,
            InkColor::Blue => 2,
            InkColor::Yellow => 3,
        }
    }

    pub fn from_response_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Label shown on the matching response button
    pub fn button_label(self) -> Word {
        match self {
            InkColor::Red => Word::Red,
            InkColor::Green => Word::Green,
            InkColor::Blue => Word::Blue,
            InkColor::Yellow => Word::Yellow,
        }
    }
}

/// One word/ink combination of the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stimulus {
    pub word: Word,
    pub color: InkColor,
    pub correct_response: usize,
    pub congruent: bool,
}

impl Stimulus {
    pub fn new(word: Word, color: InkColor) -> Self {
        Self {
            word,
            color,
            correct_response: color.response_index(),
            congruent: word.meaning() == color,
        }
    }
}

/// Full 4x4 cross product, words outer, ink colours inner.
pub fn generate_stimuli() -> Vec<Stimulus> {
    let mut stimuli = Vec::with_capacity(Word::ALL.len() * InkColor::ALL.len());
    for word in Word::ALL {
        for color in InkColor::ALL {
            stimuli.push(Stimulus::new(word, color));
        }
    }
    stimuli
}

/// Splits stimuli into (congruent, incongruent), preserving order
pub fn partition_by_congruence(stimuli: &[Stimulus]) -> (Vec<Stimulus>, Vec<Stimulus>) {
    stimuli.iter().partition(|s| s.congruent)
}
