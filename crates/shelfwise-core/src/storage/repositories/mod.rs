mod book_repository;
mod challenge_repository;
mod review_repository;

pub use book_repository::{BookRepository, SqliteBookRepository};
pub use challenge_repository::{ChallengeRepository, SqliteChallengeRepository};
pub use review_repository::{ReviewRepository, SqliteReviewRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id: ?Sized;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn save(&self, entity: &Self::Entity) -> Result<()>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
