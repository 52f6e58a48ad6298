use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use tracing::info;

use crate::{EngineError, ResultEngine, users, util::normalize_display_name};

use super::{Engine, with_tx};

impl Engine {
    /// Registers the owner key used by every other operation.
    ///
    /// `password` is stored as given; hashing belongs to the identity layer.
    pub async fn create_user(&self, username: &str, password: &str) -> ResultEngine<()> {
        let username = normalize_display_name(username, "user")?;
        if password.is_empty() {
            return Err(EngineError::InvalidName(
                "password must not be empty".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            let user = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(password.to_string()),
            };
            users::Entity::insert(user).exec(&db_tx).await?;
            info!(%username, "user created");
            Ok(())
        })
    }

    pub async fn user_exists(&self, username: &str) -> ResultEngine<bool> {
        Ok(users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?
            .is_some())
    }
}
