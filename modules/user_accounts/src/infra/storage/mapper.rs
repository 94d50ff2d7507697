use anyhow::Context;

use crate::contract::model::{Role, User};
use crate::domain::repo::UserRecord;
use crate::infra::storage::entity::Model as UserEntity;

/// Convert a database entity to the sanitized contract model
pub fn entity_to_contract(entity: UserEntity) -> anyhow::Result<User> {
    let role: Role = entity
        .role
        .parse()
        .with_context(|| format!("user {} has unknown role in storage", entity.id))?;
    Ok(User {
        id: entity.id,
        name: entity.name,
        email: entity.email,
        role,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    })
}

/// Convert a database entity to the full internal record
pub fn entity_to_record(mut entity: UserEntity) -> anyhow::Result<UserRecord> {
    let password_hash = entity.password_hash.take();
    let access_token = entity.access_token.take();
    Ok(UserRecord {
        user: entity_to_contract(entity)?,
        password_hash,
        access_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model(role: &str) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: 3,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: Some("$argon2id$hash".to_string()),
            role: role.to_string(),
            access_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn record_keeps_credentials_projection_drops_them() {
        let record = entity_to_record(model("ADMIN")).unwrap();
        assert_eq!(record.user.role, Role::Admin);
        assert_eq!(record.password_hash.as_deref(), Some("$argon2id$hash"));

        let user = entity_to_contract(model("USER")).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn unknown_stored_role_is_an_error() {
        assert!(entity_to_contract(model("SUPERUSER")).is_err());
    }
}
