use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend identifier of a stored movie. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MovieId(String);

impl MovieId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A movie as the GraphQL backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(rename = "poster_image", default, deserialize_with = "null_as_empty")]
    pub poster_image_url: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<i32>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Variables of the `addMovie` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    #[serde(rename = "poster_image")]
    pub poster_image_url: String,
    pub year: Option<i32>,
    pub rating: Option<i32>,
}

/// Variables of the `updateMovie` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieUpdate {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    #[serde(rename = "poster_image")]
    pub poster_image_url: String,
    pub year: Option<i32>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DraftMode {
    #[default]
    Creating,
    Editing(MovieId),
}

/// Locally held copy of the movie being created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovieDraft {
    pub mode: DraftMode,
    pub title: String,
    pub description: String,
    pub poster_image_url: String,
    pub year: Option<i32>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Title,
    Description,
    PosterImage,
    Year,
    Rating,
}

impl FieldId {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "title" => Ok(FieldId::Title),
            "description" => Ok(FieldId::Description),
            "poster_image" => Ok(FieldId::PosterImage),
            "year" => Ok(FieldId::Year),
            "rating" => Ok(FieldId::Rating),
            other => Err(anyhow!("Unknown form field '{}'", other)),
        }
    }
}

/// A single-field change to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Title(String),
    Description(String),
    PosterImage(String),
    Year(Option<i32>),
    Rating(Option<i32>),
}

impl FieldEdit {
    /// Builds an edit from an input element's id and its raw value. Text is
    /// kept verbatim; number input that is not exactly an `i32` (blank,
    /// padded, decimal, out of range) reads as empty.
    pub fn from_input(field: &str, raw: &str) -> Result<Self> {
        Ok(match FieldId::parse(field)? {
            FieldId::Title => FieldEdit::Title(raw.to_string()),
            FieldId::Description => FieldEdit::Description(raw.to_string()),
            FieldId::PosterImage => FieldEdit::PosterImage(raw.to_string()),
            FieldId::Year => FieldEdit::Year(parse_number(raw)),
            FieldId::Rating => FieldEdit::Rating(parse_number(raw)),
        })
    }
}

fn parse_number(raw: &str) -> Option<i32> {
    raw.parse().ok()
}

impl MovieDraft {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Copies an existing record. A record with a blank id starts a new movie.
    pub fn from_record(record: &MovieRecord) -> Self {
        let mode = match MovieId::parse(&record.id) {
            Some(id) => DraftMode::Editing(id),
            None => DraftMode::Creating,
        };
        Self {
            mode,
            title: record.title.clone(),
            description: record.description.clone(),
            poster_image_url: record.poster_image_url.clone(),
            year: record.year,
            rating: record.rating,
        }
    }

    /// Returns a copy of this draft with only the edited field replaced.
    pub fn with_edit(&self, edit: FieldEdit) -> Self {
        let mut next = self.clone();
        match edit {
            FieldEdit::Title(v) => next.title = v,
            FieldEdit::Description(v) => next.description = v,
            FieldEdit::PosterImage(v) => next.poster_image_url = v,
            FieldEdit::Year(v) => next.year = v,
            FieldEdit::Rating(v) => next.rating = v,
        }
        next
    }

    pub fn to_new_movie(&self) -> NewMovie {
        NewMovie {
            title: self.title.clone(),
            description: self.description.clone(),
            poster_image_url: self.poster_image_url.clone(),
            year: self.year,
            rating: self.rating,
        }
    }

    pub fn to_update(&self, id: MovieId) -> MovieUpdate {
        MovieUpdate {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            poster_image_url: self.poster_image_url.clone(),
            year: self.year,
            rating: self.rating,
        }
    }
}
