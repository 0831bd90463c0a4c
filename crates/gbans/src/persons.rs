//! The platform's record of players.
//!
//! Registering a steam admin makes sure the player is known to the rest of the platform first.

use crate::database::{self, Database};
use crate::time::Timestamp;
use crate::SteamId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub steam_id: SteamId,
    pub created_on: Timestamp,
}

#[derive(Debug, Display, Error)]
#[display("failed to get or create person record: {_0}")]
pub struct GetOrCreatePersonError(Box<dyn std::error::Error + Send + Sync>);

impl GetOrCreatePersonError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

impl From<database::Error> for GetOrCreatePersonError {
    fn from(error: database::Error) -> Self {
        Self::new(error)
    }
}

/// Resolves (or creates) the person record of a player.
#[async_trait::async_trait]
pub trait PersonProvider: Send + Sync {
    async fn get_or_create_person(
        &self,
        steam_id: SteamId,
    ) -> Result<Person, GetOrCreatePersonError>;
}

#[async_trait::async_trait]
impl PersonProvider for Database {
    #[tracing::instrument(skip(self), err(level = "debug"))]
    async fn get_or_create_person(
        &self,
        steam_id: SteamId,
    ) -> Result<Person, GetOrCreatePersonError> {
        let mut txn = self.begin().await?;

        sqlx::query("INSERT IGNORE INTO person (steam_id) VALUES (?)")
            .bind(steam_id)
            .execute(&mut *txn)
            .await
            .map_err(database::Error::from)?;

        let created_on = sqlx::query_scalar::<_, Timestamp>(
            "SELECT created_on FROM person WHERE steam_id = ?",
        )
        .bind(steam_id)
        .fetch_one(&mut *txn)
        .await
        .map_err(database::Error::from)?;

        txn.commit().await.map_err(database::Error::from)?;

        Ok(Person { steam_id, created_on })
    }
}
