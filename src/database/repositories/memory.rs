use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{StoreError, UserStore};
use crate::database::models::user::{NewUser, UserEntity, UserPatch};

/// 进程内用户存储，用于测试和本地调试
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserEntity>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟数据库故障，开启后所有操作返回 `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 只让删除失败，查询和写入照常
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<UserEntity>, StoreError> {
        self.check_available()?;
        Ok(self.users.read().await.get(name).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserEntity, StoreError> {
        self.check_available()?;
        let mut users = self.users.write().await;
        if users.contains_key(&user.name) {
            return Err(StoreError::AlreadyExists(user.name));
        }

        let now = Utc::now();
        let entity = UserEntity {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: user.name,
            gender: user.gender,
            age: user.age,
            password: user.password,
            nickname: user.nickname,
            creator: user.creator,
            create_time: now,
            modifier: user.modifier,
            modify_time: now,
        };
        users.insert(entity.name.clone(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, user: &UserEntity) -> Result<(), StoreError> {
        self.check_available()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store delete switched off".into()));
        }
        let mut users = self.users.write().await;
        if users.get(&user.name).is_some_and(|u| u.id == user.id) {
            users.remove(&user.name);
        }
        Ok(())
    }

    async fn update_fields(&self, name: &str, patch: &UserPatch) -> Result<u64, StoreError> {
        self.check_available()?;
        if patch.is_empty() {
            return Ok(0);
        }

        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(name) else {
            return Ok(0);
        };
        if let Some(nickname) = &patch.nickname {
            user.nickname = nickname.clone();
        }
        if let Some(modifier) = &patch.modifier {
            user.modifier = modifier.clone();
        }
        user.modify_time = Utc::now();
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::user::Gender;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            gender: Gender::Female,
            age: 30,
            password: "x".to_string(),
            nickname: "al".to_string(),
            creator: name.to_string(),
            modifier: name.to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_names() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice")).await.unwrap();

        let err = store.create(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(name) if name == "alice"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_fields_reports_affected_rows() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice")).await.unwrap();

        let patch = UserPatch {
            nickname: Some("ally".into()),
            modifier: None,
        };
        assert_eq!(store.update_fields("alice", &patch).await.unwrap(), 1);
        assert_eq!(store.update_fields("bob", &patch).await.unwrap(), 0);
        assert_eq!(
            store.update_fields("alice", &UserPatch::default()).await.unwrap(),
            0
        );

        let alice = store.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(alice.nickname, "ally");
    }

    #[tokio::test]
    async fn delete_fault_leaves_reads_working() {
        let store = MemoryUserStore::new();
        let alice = store.create(new_user("alice")).await.unwrap();
        store.set_fail_deletes(true);

        assert!(matches!(store.delete(&alice).await, Err(StoreError::Unavailable(_))));
        assert_eq!(store.find_by_name("alice").await.unwrap(), Some(alice));
    }
}
