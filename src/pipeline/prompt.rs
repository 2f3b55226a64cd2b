//! Story prompt construction.
//!
//! The generate mode of the story stage turns a genre, an audience and a
//! language (plus optional free text) into a single instruction for the
//! story generator.

use std::fmt;

/// Story genre offered in generate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Genre {
    #[default]
    FairyTale,
    Mystery,
    Adventure,
    ScienceFiction,
}

impl Genre {
    pub const ALL: [Genre; 4] = [
        Genre::FairyTale,
        Genre::Mystery,
        Genre::Adventure,
        Genre::ScienceFiction,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Genre::FairyTale => "Fairy Tale",
            Genre::Mystery => "Mystery",
            Genre::Adventure => "Adventure",
            Genre::ScienceFiction => "Science Fiction",
        }
    }
}

/// Target audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeGroup {
    #[default]
    Children,
    Teenagers,
    Adults,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Children, AgeGroup::Teenagers, AgeGroup::Adults];

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Children => "Children",
            AgeGroup::Teenagers => "Teenagers",
            AgeGroup::Adults => "Adults",
        }
    }
}

/// Language the story is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    German,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
        }
    }
}

macro_rules! display_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_label!(Genre, AgeGroup, Language);

/// Parameters of a generated story.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryPrompt {
    pub genre: Genre,
    pub age_group: AgeGroup,
    pub language: Language,
    /// Extra free text appended to the instruction; blank means none.
    pub addendum: Option<String>,
}

impl StoryPrompt {
    /// The instruction sent to the story generator.
    pub fn render(&self) -> String {
        let base = format!(
            "Generate a {} {} story in {} language.",
            self.age_group, self.genre, self.language
        );
        match self.addendum.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => {
                format!("{base} Additional Information about the story: {extra}")
            }
            _ => base,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
