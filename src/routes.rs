use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Movie, MovieFilter, MovieInput},
};

pub async fn index() -> &'static str {
    "movies-api is running"
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovieFilter>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.catalog.list(&filter).await?;
    Ok(Json(movies))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Movie>> {
    state.catalog.get_by_id(id).await?.map(Json).ok_or(AppError::NotFound)
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(input): Json<MovieInput>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let movie = state.catalog.create(&input).await.map_err(AppError::CreateFailed)?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(input): Json<MovieInput>,
) -> AppResult<Json<Movie>> {
    state.catalog.update(id, &input).await?.map(Json).ok_or(AppError::NotFound)
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Movie>> {
    state.catalog.delete(Some(id)).await?.map(Json).ok_or(AppError::NotFound)
}
