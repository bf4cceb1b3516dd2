use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 性别，只允许 male / female
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 用户数据库实体，同时也是缓存中 `user:{name}` 和 `session:{token}` 的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserEntity {
    pub id: i64,
    /// 唯一用户名，创建后不可修改
    pub name: String,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub age: i32,
    pub password: String,
    pub nickname: String,
    pub creator: String,
    pub create_time: chrono::DateTime<chrono::Utc>,
    pub modifier: String,
    pub modify_time: chrono::DateTime<chrono::Utc>,
}

/// 待插入的用户记录，id 和时间戳由存储层生成
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub gender: Gender,
    pub age: i32,
    pub password: String,
    pub nickname: String,
    pub creator: String,
    pub modifier: String,
}

/// 部分更新，None 的字段保持不变
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub nickname: Option<String>,
    pub modifier: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none() && self.modifier.is_none()
    }
}
