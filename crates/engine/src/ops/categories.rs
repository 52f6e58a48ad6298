use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine, categories, transactions,
    util::{normalize_color, normalize_display_name, normalize_name_key},
};

use super::{Engine, with_tx};

impl Engine {
    /// Add a category. `color` defaults to `#007bff`.
    pub async fn create_category(
        &self,
        user_id: &str,
        name: &str,
        color: Option<&str>,
    ) -> ResultEngine<Category> {
        let name = normalize_display_name(name, "category")?;
        let name_norm = normalize_name_key(&name, "category")?;
        let color = normalize_color(color)?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.ensure_category_name_free(&db_tx, user_id, &name_norm, None)
                .await?;

            let active = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name),
                name_norm: ActiveValue::Set(name_norm),
                color: ActiveValue::Set(color),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = active.insert(&db_tx).await?;
            Ok(Category::from(model))
        })
    }

    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    /// Rename and/or recolor a category. `None` keeps the current value.
    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        name: Option<&str>,
        color: Option<&str>,
    ) -> ResultEngine<Category> {
        let name = name
            .map(|name| -> ResultEngine<(String, String)> {
                let display = normalize_display_name(name, "category")?;
                let key = normalize_name_key(&display, "category")?;
                Ok((display, key))
            })
            .transpose()?;
        let color = color.map(|c| normalize_color(Some(c))).transpose()?;
        if name.is_none() && color.is_none() {
            let model = self
                .require_category(&self.database, user_id, category_id)
                .await?;
            return Ok(Category::from(model));
        }
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, user_id, category_id).await?;
            let mut active = categories::ActiveModel {
                id: ActiveValue::Set(category_id),
                ..Default::default()
            };
            if let Some((display, key)) = name {
                self.ensure_category_name_free(&db_tx, user_id, &key, Some(category_id))
                    .await?;
                active.name = ActiveValue::Set(display);
                active.name_norm = ActiveValue::Set(key);
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color);
            }
            let model = active.update(&db_tx).await?;
            Ok(Category::from(model))
        })
    }

    /// Delete a category; its transactions become uncategorized.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, user_id, category_id).await?;
            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::CategoryId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(transactions::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    async fn ensure_category_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::NameNorm.eq(name_norm));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if let Some(existing) = query.one(db_tx).await? {
            return Err(EngineError::ExistingKey(existing.name));
        }
        Ok(())
    }
}
