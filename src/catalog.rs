use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, Func, Query, SelectStatement, SimpleExpr},
};
use tracing::{debug, info, instrument, warn};

use crate::{
    entities::{genre, movie, movie_genre},
    error::{StoreError, StoreResult},
    models::{Movie, MovieFilter, MovieInput},
};

/// Data access for movies and their genres. Holds nothing but the
/// connection; the database is the only source of truth.
#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Every movie with its genres, or only those tagged with
    /// `filter.genre` (case-insensitive). An unknown genre yields an empty
    /// list. A matched movie still reports all of its genres.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &MovieFilter) -> StoreResult<Vec<Movie>> {
        let mut query = movie::Entity::find();

        if let Some(genre) = filter.genre.as_deref().filter(|g| !g.is_empty()) {
            let needle = genre.to_lowercase();
            debug!(genre = %needle, "filtering movies by genre");
            query = query.filter(movie::Column::Id.in_subquery(movie_ids_in_genre(&needle)));
        }

        let rows = query
            .find_with_related(genre::Entity)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await
            .map_err(read_failed)?;

        debug!(count = rows.len(), "movies listed");
        Ok(rows.into_iter().map(|(row, genres)| Movie::from_parts(row, names(genres))).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i32) -> StoreResult<Option<Movie>> {
        fetch_movie(&self.db, id).await.map_err(read_failed)
    }

    /// Inserts the movie, resolves each genre (creating missing ones) and
    /// links them, all in one transaction.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: &MovieInput) -> StoreResult<Movie> {
        let genres = input.normalized_genres();
        debug!(?genres, "creating movie");

        let txn = self.db.begin().await.map_err(write_failed)?;

        let row = movie_values(input).insert(&txn).await.map_err(write_failed)?;
        link_genres(&txn, row.id, &genres).await.map_err(write_failed)?;

        txn.commit().await.map_err(write_failed)?;
        info!(movie_id = row.id, "movie created");

        self.get_by_id(row.id).await?.ok_or_else(|| {
            StoreError::Read(DbErr::RecordNotFound(format!("movie {} after create", row.id)))
        })
    }

    /// Overwrites every scalar column and rebuilds the genre links from
    /// `input`. Returns `None` when no movie has this id.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: &MovieInput) -> StoreResult<Option<Movie>> {
        let genres = input.normalized_genres();
        debug!(?genres, "updating movie");

        let txn = self.db.begin().await.map_err(write_failed)?;

        let updated = movie::Entity::update_many()
            .set(movie_values(input))
            .filter(movie::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(write_failed)?;

        if updated.rows_affected == 0 {
            debug!("no movie to update");
            return Ok(None);
        }

        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(id))
            .exec(&txn)
            .await
            .map_err(write_failed)?;

        link_genres(&txn, id, &genres).await.map_err(write_failed)?;

        txn.commit().await.map_err(write_failed)?;
        info!(movie_id = id, "movie updated");

        self.get_by_id(id).await
    }

    /// Removes the movie and its genre links, returning the movie as it was.
    /// A missing id short-circuits without touching the database.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Option<i32>) -> StoreResult<Option<Movie>> {
        let Some(id) = id else {
            return Ok(None);
        };

        let txn = self.db.begin().await.map_err(write_failed)?;

        let Some(existing) = fetch_movie(&txn, id).await.map_err(write_failed)? else {
            debug!("no movie to delete");
            return Ok(None);
        };

        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(id))
            .exec(&txn)
            .await
            .map_err(write_failed)?;

        movie::Entity::delete_by_id(id).exec(&txn).await.map_err(write_failed)?;

        txn.commit().await.map_err(write_failed)?;
        info!(movie_id = id, "movie deleted");

        Ok(Some(existing))
    }
}

async fn fetch_movie<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<Movie>, DbErr> {
    let rows = movie::Entity::find_by_id(id).find_with_related(genre::Entity).all(conn).await?;
    Ok(rows.into_iter().next().map(|(row, genres)| Movie::from_parts(row, names(genres))))
}

/// Looks up or creates each genre and inserts one link per genre.
/// `genres` must already be lowercased and free of duplicates.
async fn link_genres<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    genres: &[String],
) -> Result<(), DbErr> {
    for name in genres {
        let genre_id = resolve_genre(conn, name).await?;
        movie_genre::Entity::insert(movie_genre::ActiveModel {
            movie_id: Set(movie_id),
            genre_id: Set(genre_id),
        })
        .exec_without_returning(conn)
        .await?;
    }
    Ok(())
}

async fn resolve_genre<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i32, DbErr> {
    let existing = genre::Entity::find().filter(lower_genre_name().eq(name)).one(conn).await?;
    if let Some(found) = existing {
        return Ok(found.id);
    }

    let created = genre::ActiveModel { id: NotSet, name: Set(name.to_string()) }.insert(conn).await?;
    debug!(genre = %name, genre_id = created.id, "genre created");
    Ok(created.id)
}

fn movie_values(input: &MovieInput) -> movie::ActiveModel {
    movie::ActiveModel {
        id: NotSet,
        title: Set(input.title.clone()),
        year: Set(input.year),
        director: Set(input.director.clone()),
        duration: Set(input.duration),
        poster: Set(input.poster.clone()),
        rate: Set(input.rate),
    }
}

fn lower_genre_name() -> Expr {
    Expr::expr(Func::lower(Expr::col((genre::Entity, genre::Column::Name))))
}

fn movie_ids_in_genre(needle: &str) -> SelectStatement {
    let joined: SimpleExpr = Expr::col((genre::Entity, genre::Column::Id))
        .equals((movie_genre::Entity, movie_genre::Column::GenreId));

    Query::select()
        .column((movie_genre::Entity, movie_genre::Column::MovieId))
        .from(movie_genre::Entity)
        .inner_join(genre::Entity, joined)
        .and_where(lower_genre_name().eq(needle))
        .to_owned()
}

fn names(genres: Vec<genre::Model>) -> Vec<String> {
    genres.into_iter().map(|g| g.name).collect()
}

fn read_failed(err: DbErr) -> StoreError {
    warn!(error = %err, "catalog read failed");
    StoreError::Read(err)
}

/// Any open transaction is rolled back when the caller drops it on `?`.
fn write_failed(err: DbErr) -> StoreError {
    warn!(error = %err, "catalog write failed, rolling back");
    StoreError::Write(err)
}
