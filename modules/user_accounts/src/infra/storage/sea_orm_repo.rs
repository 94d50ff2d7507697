//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it can be built on a
//! `DatabaseConnection` or on a transaction.

use anyhow::Context;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};

use crate::contract::model::{Role, User};
use crate::domain::repo::{NewUserRecord, UniqueViolation, UserChanges, UserRecord, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};
use crate::infra::storage::mapper::{entity_to_contract, entity_to_record};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

/// Unique-index violations become [`UniqueViolation`] so the domain can report a conflict.
fn write_error(e: DbErr, op: &'static str) -> anyhow::Error {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
        anyhow::Error::new(UniqueViolation { field: "email" })
    } else {
        anyhow::Error::new(e).context(format!("{op} failed"))
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        found.map(entity_to_contract).transpose()
    }

    async fn find_record_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let found = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_record_by_email failed")?;
        found.map(entity_to_record).transpose()
    }

    async fn email_owner(&self, email: &str) -> anyhow::Result<Option<i32>> {
        let id: Option<i32> = UserEntity::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Email.eq(email))
            .into_tuple()
            .one(&self.conn)
            .await
            .context("email_owner failed")?;
        Ok(id)
    }

    async fn insert(&self, new: NewUserRecord) -> anyhow::Result<User> {
        let m = UserAM {
            name: Set(new.name),
            email: Set(new.email),
            password_hash: Set(Some(new.password_hash)),
            role: Set(new.role.as_str().to_string()),
            access_token: Set(None),
            created_at: Set(new.created_at),
            updated_at: Set(new.updated_at),
            ..Default::default()
        };
        let inserted = m
            .insert(&self.conn)
            .await
            .map_err(|e| write_error(e, "insert"))?;
        entity_to_contract(inserted)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let Some(current) = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("update lookup failed")?
        else {
            return Ok(None);
        };

        let mut m: UserAM = current.into();
        if let Some(name) = changes.name {
            m.name = Set(name);
        }
        if let Some(email) = changes.email {
            m.email = Set(email);
        }
        if let Some(hash) = changes.password_hash {
            m.password_hash = Set(Some(hash));
        }
        if let Some(role) = changes.role {
            m.role = Set(role.as_str().to_string());
        }
        m.updated_at = Set(changes.updated_at);

        let updated = m
            .update(&self.conn)
            .await
            .map_err(|e| write_error(e, "update"))?;
        entity_to_contract(updated).map(Some)
    }

    async fn delete(&self, id: i32) -> anyhow::Result<bool> {
        let res = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn list(&self, role: Option<Role>) -> anyhow::Result<Vec<User>> {
        let mut query = UserEntity::find();
        if let Some(role) = role {
            query = query.filter(Column::Role.eq(role.as_str()));
        }
        let rows = query
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list failed")?;
        rows.into_iter().map(entity_to_contract).collect()
    }

    async fn set_access_token(&self, id: i32, token: Option<String>) -> anyhow::Result<()> {
        UserEntity::update_many()
            .col_expr(Column::AccessToken, Expr::value(token))
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("set_access_token failed")?;
        Ok(())
    }
}
