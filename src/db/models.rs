use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::movies;

#[derive(Debug, Clone, Queryable)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub date_added: NaiveDateTime,
    pub video_file: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = movies)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub date_added: NaiveDateTime,
    pub video_file: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = movies)]
pub struct MovieChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_file: Option<String>,
}

impl MovieChangeset {
    // diesel rejects an all-None changeset, callers must check
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.video_file.is_none()
    }
}

/// What clients see. `video_file` is the stored relative path, never a
/// structured object; `date_added` is rendered as an ISO-8601 string.
#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub date_added: String,
    pub video_file: Option<String>,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            date_added: movie.date_added.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            video_file: movie.video_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movie(video_file: Option<&str>) -> Movie {
        Movie {
            id: 1,
            title: "Solaris".to_string(),
            description: "A psychologist visits a remote space station".to_string(),
            date_added: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_micro_opt(18, 4, 5, 123456)
                .unwrap(),
            video_file: video_file.map(str::to_owned),
        }
    }

    #[test]
    fn video_file_renders_as_plain_string() {
        let json = serde_json::to_value(MovieResponse::from(movie(Some("videos/solaris.mp4")))).unwrap();
        assert_eq!(json["video_file"], serde_json::json!("videos/solaris.mp4"));
    }

    #[test]
    fn missing_video_file_renders_as_null() {
        let json = serde_json::to_value(MovieResponse::from(movie(None))).unwrap();
        assert!(json["video_file"].is_null());
    }

    #[test]
    fn date_added_renders_as_iso8601() {
        let response = MovieResponse::from(movie(None));
        assert_eq!(response.date_added, "2024-03-09T18:04:05.123456");
    }

    #[test]
    fn response_exposes_exactly_the_api_fields() {
        let json = serde_json::to_value(MovieResponse::from(movie(None))).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["date_added", "description", "id", "title", "video_file"]);
    }

    #[test]
    fn all_none_changeset_is_empty() {
        assert!(MovieChangeset::default().is_empty());
        let changeset = MovieChangeset {
            title: Some("Stalker".to_string()),
            ..Default::default()
        };
        assert!(!changeset.is_empty());
    }
}
