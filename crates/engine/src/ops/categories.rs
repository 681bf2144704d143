use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine, card_transactions, categories, transactions,
    util::{name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a category. Names are unique per user after normalization.
    pub async fn new_category(&self, user_id: &str, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "category")?;
        let name_norm = name_key(&name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.ensure_category_name_free(&db_tx, user_id, &name, &name_norm, None)
                .await?;

            let id = Uuid::new_v4();
            let active = categories::ActiveModel {
                id: ActiveValue::Set(id),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
            };
            active
                .insert(&db_tx)
                .await
                .map_err(|err| EngineError::from_insert(err, &name))?;
            Ok(id)
        })
    }

    pub async fn rename_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        name: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "category")?;
        let name_norm = name_key(&name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, user_id, category_id).await?;
            self.ensure_category_name_free(
                &db_tx,
                user_id,
                &name,
                &name_norm,
                Some(category_id),
            )
            .await?;

            let active = categories::ActiveModel {
                id: ActiveValue::Set(category_id),
                name: ActiveValue::Set(name.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
                ..Default::default()
            };
            active
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_insert(err, &name))?;
            Ok(())
        })
    }

    /// Deletes a category. Transactions and card transactions that used it
    /// become uncategorized.
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
            card_transactions::Entity::update_many()
                .col_expr(
                    card_transactions::Column::CategoryId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(card_transactions::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;

            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Categories of a user, by name.
    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let models = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .order_by_asc(categories::Column::NameNorm)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Category::from).collect())
        })
    }

    async fn ensure_category_name_free(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::NameNorm.eq(name_norm));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
