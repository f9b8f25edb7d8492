use crate::api::error::ApiError;
use crate::config::AppConfig;
use crate::db::models::{Movie, MovieChangeset, MovieResponse, NewMovie};
use crate::db::{schema::movies, DbPool};
use crate::services::storage;
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use diesel::QueryDsl;
use diesel_async::RunQueryDsl;
use futures::TryStreamExt;
use serde::Deserialize;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/movies")
            .route("/", web::get().to(list_movies))
            .route("/", web::post().to(create_movie))
            .route("/{id}/", web::get().to(get_movie))
            .route("/{id}/", web::put().to(update_movie))
            .route("/{id}/", web::patch().to(update_movie))
            .route("/{id}/", web::delete().to(delete_movie)),
    );
}

/// Client-supplied movie fields. `id` and `date_added` are server-assigned,
/// so anything a client sends for them is dropped on the floor.
#[derive(Debug, Default)]
struct MovieInput {
    title: Option<String>,
    description: Option<String>,
    video: Option<UploadedVideo>,
}

#[derive(Debug)]
struct UploadedVideo {
    filename: String,
    data: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonMovieInput {
    title: Option<String>,
    description: Option<String>,
}

/// GET /movies/
pub async fn list_movies(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    log::info!("Listing movies");
    let conn = &mut pool.get().await?;

    let rows = movies::table.load::<Movie>(conn).await?;
    let list: Vec<MovieResponse> = rows.into_iter().map(MovieResponse::from).collect();

    Ok(HttpResponse::Ok().json(list))
}

/// GET /movies/{id}/
pub async fn get_movie(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut pool.get().await?;

    let movie = movies::table
        .find(path.into_inner())
        .first::<Movie>(conn)
        .await?;

    Ok(HttpResponse::Ok().json(MovieResponse::from(movie)))
}

/// POST /movies/
///
/// Accepts JSON or multipart form data; the `video_file` part is optional
/// and a request without one is a normal create.
pub async fn create_movie(
    req: HttpRequest,
    payload: web::Payload,
    pool: web::Data<DbPool>,
    config: web::Data<Arc<AppConfig>>,
) -> Result<HttpResponse, ApiError> {
    let input = read_movie_input(&req, payload, &config).await?;

    log::info!(
        "Creating movie with data: title={:?}, description={:?}",
        input.title,
        input.description
    );
    match &input.video {
        Some(video) => log::info!(
            "Video file found: {} ({} bytes)",
            video.filename,
            video.data.len()
        ),
        None => log::info!("No video file provided, creating movie without video"),
    }

    let (title, description) = validate_required(&input)?;

    let video_file = match input.video {
        Some(video) => Some(
            storage::save_video(&config.storage, &video.filename, &video.data)
                .await
                .map_err(|e| {
                    log::error!("Failed to store video file: {e:#}");
                    ApiError::Storage(e.to_string())
                })?,
        ),
        None => None,
    };

    let new_movie = NewMovie {
        title,
        description,
        date_added: chrono::Utc::now().naive_utc(),
        video_file,
    };

    let conn = &mut pool.get().await?;
    let movie: Movie = diesel::insert_into(movies::table)
        .values(&new_movie)
        .get_result(conn)
        .await?;

    log::info!("Movie created successfully: id={}", movie.id);
    Ok(HttpResponse::Created().json(MovieResponse::from(movie)))
}

/// PUT/PATCH /movies/{id}/
///
/// Applies whatever subset of title/description/video_file the request
/// carries; an empty subset just echoes the current row.
pub async fn update_movie(
    req: HttpRequest,
    payload: web::Payload,
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
    config: web::Data<Arc<AppConfig>>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let input = read_movie_input(&req, payload, &config).await?;
    let (title, description) = validate_optional(&input)?;

    let video_file = match input.video {
        Some(video) => Some(
            storage::save_video(&config.storage, &video.filename, &video.data)
                .await
                .map_err(|e| {
                    log::error!("Failed to store video file: {e:#}");
                    ApiError::Storage(e.to_string())
                })?,
        ),
        None => None,
    };

    let changeset = MovieChangeset {
        title,
        description,
        video_file,
    };

    let conn = &mut pool.get().await?;
    let movie: Movie = if changeset.is_empty() {
        movies::table.find(id).first(conn).await?
    } else {
        diesel::update(movies::table.find(id))
            .set(&changeset)
            .get_result(conn)
            .await?
    };

    Ok(HttpResponse::Ok().json(MovieResponse::from(movie)))
}

/// DELETE /movies/{id}/
pub async fn delete_movie(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut pool.get().await?;

    let deleted = diesel::delete(movies::table.find(path.into_inner()))
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(HttpResponse::NoContent().finish())
}

async fn read_movie_input(
    req: &HttpRequest,
    mut payload: web::Payload,
    config: &AppConfig,
) -> Result<MovieInput, ApiError> {
    if req.content_type().starts_with("multipart/") {
        return read_multipart_input(Multipart::new(req.headers(), payload), config).await;
    }

    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::Payload(e.to_string()))?
    {
        body.extend_from_slice(&chunk);
    }

    let parsed: JsonMovieInput = if body.is_empty() {
        JsonMovieInput::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Payload(format!("invalid JSON body: {e}")))?
    };

    Ok(MovieInput {
        title: parsed.title,
        description: parsed.description,
        video: None,
    })
}

async fn read_multipart_input(
    mut payload: Multipart,
    config: &AppConfig,
) -> Result<MovieInput, ApiError> {
    let mut input = MovieInput::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::Payload(e.to_string()))?
    {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(str::to_owned)
            .ok_or_else(|| ApiError::Payload("multipart field without a name".to_string()))?;

        match name.as_str() {
            "video_file" => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        ApiError::Payload("video_file part has no filename".to_string())
                    })?;

                let mut data = Vec::new();
                while let Some(chunk) = field
                    .try_next()
                    .await
                    .map_err(|e| ApiError::Payload(e.to_string()))?
                {
                    data.extend_from_slice(&chunk);
                    if data.len() > config.storage.max_file_size {
                        return Err(ApiError::Validation(format!(
                            "video_file: larger than the {} byte limit",
                            config.storage.max_file_size
                        )));
                    }
                }
                input.video = Some(UploadedVideo { filename, data });
            }
            "title" => input.title = Some(read_text_field(&mut field).await?),
            "description" => input.description = Some(read_text_field(&mut field).await?),
            _ => {
                // Skip unknown fields (including client-sent id/date_added)
                while field
                    .try_next()
                    .await
                    .map_err(|e| ApiError::Payload(e.to_string()))?
                    .is_some()
                {}
            }
        }
    }

    Ok(input)
}

async fn read_text_field(field: &mut Field) -> Result<String, ApiError> {
    let mut value = String::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| ApiError::Payload(e.to_string()))?
    {
        value.push_str(
            std::str::from_utf8(&chunk)
                .map_err(|e| ApiError::Payload(format!("field is not valid UTF-8: {e}")))?,
        );
    }
    Ok(value)
}

fn validate_required(input: &MovieInput) -> Result<(String, String), ApiError> {
    let title = require_field(input.title.as_deref(), "title")?;
    check_title_length(&title)?;
    let description = require_field(input.description.as_deref(), "description")?;
    Ok((title, description))
}

fn validate_optional(input: &MovieInput) -> Result<(Option<String>, Option<String>), ApiError> {
    let title = match input.title.as_deref().map(str::trim) {
        None => None,
        Some("") => {
            return Err(ApiError::Validation(
                "title: this field may not be blank".to_string(),
            ))
        }
        Some(title) => {
            check_title_length(title)?;
            Some(title.to_owned())
        }
    };

    let description = match input.description.as_deref().map(str::trim) {
        None => None,
        Some("") => {
            return Err(ApiError::Validation(
                "description: this field may not be blank".to_string(),
            ))
        }
        Some(description) => Some(description.to_owned()),
    };

    Ok((title, description))
}

fn require_field(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(ApiError::Validation(format!(
            "{field}: this field is required"
        ))),
    }
}

fn check_title_length(title: &str) -> Result<(), ApiError> {
    if title.chars().count() > 255 {
        return Err(ApiError::Validation(
            "title: ensure this field has no more than 255 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: Option<&str>, description: Option<&str>) -> MovieInput {
        MovieInput {
            title: title.map(str::to_owned),
            description: description.map(str::to_owned),
            video: None,
        }
    }

    #[test]
    fn json_input_ignores_read_only_fields() {
        let parsed: JsonMovieInput = serde_json::from_str(
            r#"{"title": "Stalker", "description": "Zone", "id": 99, "date_added": "2020-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Stalker"));
        assert_eq!(parsed.description.as_deref(), Some("Zone"));
    }

    #[test]
    fn missing_title_is_a_validation_error() {
        let err = validate_required(&input(None, Some("Zone"))).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("title")));
    }

    #[test]
    fn blank_description_is_a_validation_error() {
        let err = validate_required(&input(Some("Stalker"), Some("   "))).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("description")));
    }

    #[test]
    fn overlong_title_is_a_validation_error() {
        let long = "x".repeat(256);
        let err = validate_required(&input(Some(&long), Some("Zone"))).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("255")));
    }

    #[test]
    fn title_of_exactly_255_characters_passes() {
        let edge = "x".repeat(255);
        let (title, _) = validate_required(&input(Some(&edge), Some("Zone"))).unwrap();
        assert_eq!(title.len(), 255);
    }

    #[test]
    fn valid_fields_come_back_trimmed() {
        let (title, description) =
            validate_required(&input(Some("  Stalker "), Some(" Zone "))).unwrap();
        assert_eq!(title, "Stalker");
        assert_eq!(description, "Zone");
    }

    #[test]
    fn optional_validation_accepts_an_empty_subset() {
        let (title, description) = validate_optional(&input(None, None)).unwrap();
        assert!(title.is_none());
        assert!(description.is_none());
    }

    #[test]
    fn optional_validation_rejects_blank_present_fields() {
        let err = validate_optional(&input(Some(""), None)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("blank")));
    }
}
