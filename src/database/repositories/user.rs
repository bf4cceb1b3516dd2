use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, UserStore};
use crate::database::models::user::{NewUser, UserEntity, UserPatch};

const USER_COLUMNS: &str = "id, name, gender, age, password, nickname, \
                            creator, create_time, modifier, modify_time";

/// 基于 Postgres 的用户存储库实现
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<UserEntity>, StoreError> {
        let user = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE name = $1",
            USER_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<UserEntity, StoreError> {
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (name, gender, age, password, nickname, creator, modifier)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(user.gender.as_str())
        .bind(user.age)
        .bind(&user.password)
        .bind(&user.nickname)
        .bind(&user.creator)
        .bind(&user.modifier)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => {
                tracing::info!("Inserted user {} with id {}", created.name, created.id);
                Ok(created)
            }
            // 检查和插入之间被并发注册抢先
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::AlreadyExists(user.name))
            }
            Err(e) => {
                tracing::error!("Failed to insert user {}: {:?}", user.name, e);
                Err(e.into())
            }
        }
    }

    async fn delete(&self, user: &UserEntity) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Deleted user {}", user.name);
        Ok(())
    }

    async fn update_fields(&self, name: &str, patch: &UserPatch) -> Result<u64, StoreError> {
        if patch.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE users
            SET nickname = COALESCE($1, nickname),
                modifier = COALESCE($2, modifier),
                modify_time = NOW()
            WHERE name = $3
            "#,
        )
        .bind(patch.nickname.as_deref())
        .bind(patch.modifier.as_deref())
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
