use serde::{Deserialize, Serialize};

use crate::entities::movie;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub year: i32,
    pub director: String,
    pub duration: i32,
    pub poster: String,
    pub rate: f64,
    pub genres: Vec<String>,
}

impl Movie {
    pub fn from_parts(row: movie::Model, mut genres: Vec<String>) -> Self {
        genres.sort();
        Self {
            id: row.id,
            title: row.title,
            year: row.year,
            director: row.director,
            duration: row.duration,
            poster: row.poster,
            rate: row.rate,
            genres,
        }
    }
}

/// Payload for both create and update. Every scalar is required; a missing
/// `genre` list clears the movie's genres on update.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MovieInput {
    pub title: String,
    pub year: i32,
    pub director: String,
    pub duration: i32,
    pub rate: f64,
    pub poster: String,
    #[serde(default)]
    pub genre: Option<Vec<String>>,
}

impl MovieInput {
    /// Lowercased genre names, first occurrence kept.
    pub fn normalized_genres(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for name in self.genre.iter().flatten() {
            let name = name.to_lowercase();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieFilter {
    pub genre: Option<String>,
}
