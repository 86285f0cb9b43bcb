use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set, Unchanged},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    SqlErr, TransactionTrait,
    sea_query::Expr,
};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{Movie, MoviePatch, NewMovie},
};

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All movies, lowest rating first. Equal ratings keep insertion order.
    pub async fn list_all(&self) -> AppResult<Vec<Movie>> {
        let movies = movie::Entity::find()
            .order_by_asc(movie::Column::Rating)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;
        Ok(movies)
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(movie::Entity::find().count(&self.db).await?)
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<Movie>> {
        Ok(movie::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn get(&self, id: i32) -> AppResult<Movie> {
        self.find(id).await?.ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub async fn find_by_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let movie = movie::Entity::find()
            .filter(movie::Column::Title.eq(title))
            .one(&self.db)
            .await?;
        Ok(movie)
    }

    /// Inserts a movie. A duplicate title is rejected by the unique index, so
    /// nothing is written on conflict.
    pub async fn create(&self, new: NewMovie) -> AppResult<Movie> {
        let title = new.title.clone();
        let model = movie::ActiveModel {
            id: NotSet,
            title: Set(new.title),
            year: Set(new.year),
            description: Set(new.description),
            rating: Set(new.rating),
            ranking: Set(new.ranking),
            review: Set(new.review),
            img_url: Set(new.img_url),
        };

        match model.insert(&self.db).await {
            Ok(movie) => {
                tracing::info!(movie_id = movie.id, title = %movie.title, "movie created");
                Ok(movie)
            },
            Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(title)),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes only the fields present in `patch`.
    pub async fn update(&self, id: i32, patch: MoviePatch) -> AppResult<Movie> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        let model = movie::ActiveModel {
            id: Unchanged(id),
            rating: patch.rating.map(Set).unwrap_or(NotSet),
            review: patch.review.map(Set).unwrap_or(NotSet),
            ranking: patch.ranking.map(Set).unwrap_or(NotSet),
            ..Default::default()
        };

        match model.update(&self.db).await {
            Ok(movie) => {
                tracing::debug!(movie_id = id, "movie updated");
                Ok(movie)
            },
            Err(DbErr::RecordNotUpdated) => Err(AppError::NotFound(id.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(id.to_string()));
        }
        tracing::info!(movie_id = id, "movie deleted");
        Ok(())
    }

    /// Persists `(id, ranking)` pairs in a single transaction.
    pub async fn apply_rankings(&self, rankings: &[(i32, i32)]) -> AppResult<()> {
        let txn = self.db.begin().await?;

        for &(id, ranking) in rankings {
            movie::Entity::update_many()
                .col_expr(movie::Column::Ranking, Expr::value(ranking))
                .filter(movie::Column::Id.eq(id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn close(self) -> AppResult<()> {
        self.db.close().await?;
        Ok(())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
