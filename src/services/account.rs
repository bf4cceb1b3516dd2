// 账户服务
// 组合身份存储和会话缓存，实现注册、登录、登出、注销、查询和修改昵称

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheBackend, SessionCacheOperations, UserCacheOperations};
use crate::config::{Config, PasswordCheck, TokenMode};
use crate::database::{Gender, NewUser, StoreError, UserEntity, UserPatch, UserStore};
use crate::error::AppError;
use crate::utils::generate_session_token;

/// 注册参数，性别和年龄在服务层校验
#[derive(Debug, Clone)]
pub struct RegisterParams {
    pub name: String,
    pub password: String,
    pub gender: String,
    pub age: i32,
    pub nickname: String,
}

/// 对外返回的用户信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub password: String,
    pub nickname: String,
}

impl From<UserEntity> for UserProfile {
    fn from(user: UserEntity) -> Self {
        Self {
            name: user.name,
            age: user.age,
            gender: user.gender,
            password: user.password,
            nickname: user.nickname,
        }
    }
}

/// 修改昵称的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicknameUpdate {
    /// 数据库已更新，缓存已同步
    Applied,
    /// 没有记录被更新
    Unchanged,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    users: UserCacheOperations,
    sessions: SessionCacheOperations,
    token_mode: TokenMode,
    token_salt: String,
    password_check: PasswordCheck,
}

impl AccountService {
    pub fn new(config: &Config, store: Arc<dyn UserStore>, cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            store,
            users: UserCacheOperations::new(cache.clone(), config.user_expiration()),
            sessions: SessionCacheOperations::new(cache, config.session_expiration()),
            token_mode: config.token_mode,
            token_salt: config.token_salt.clone(),
            password_check: config.password_check,
        }
    }

    /// 用户注册
    pub async fn register(&self, params: RegisterParams) -> Result<UserEntity, AppError> {
        let gender = validate_register(&params)?;

        match self.store.find_by_name(&params.name).await {
            Ok(Some(_)) => {
                tracing::error!("Register: user {} already registered", params.name);
                return Err(AppError::AlreadyRegistered(params.name));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Register: failed to look up user {}: {}", params.name, e);
                return Err(e.into());
            }
        }

        let new_user = NewUser {
            name: params.name.clone(),
            gender,
            age: params.age,
            password: params.password,
            nickname: params.nickname,
            creator: params.name.clone(),
            modifier: params.name,
        };

        let user = self.store.create(new_user).await.map_err(|e| match e {
            StoreError::AlreadyExists(name) => AppError::AlreadyRegistered(name),
            other => {
                tracing::error!("Register: insert failed: {}", other);
                AppError::Store(other)
            }
        })?;

        tracing::info!("Registered user {}", user.name);
        Ok(user)
    }

    /// 登录，成功后返回会话令牌
    pub async fn login(&self, name: &str, password: &str) -> Result<String, AppError> {
        if name.is_empty() {
            return Err(AppError::InvalidParams("username is empty".into()));
        }

        let user = self.resolve_user(name).await?;

        if self.password_check == PasswordCheck::Strict && user.password != password {
            tracing::error!("Login: password mismatch for user {}", name);
            return Err(AppError::PasswordMismatch);
        }

        let token = generate_session_token(&user.name, self.token_mode, &self.token_salt);
        if let Err(e) = self.sessions.put_session(&user, &token).await {
            tracing::error!("Login: failed to store session for user {}: {}", user.name, e);
            return Err(e.into());
        }

        tracing::info!("User {} logged in", user.name);
        Ok(token)
    }

    /// 登出，删除会话
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if token.is_empty() {
            return Err(AppError::NotLoggedIn);
        }

        match self.sessions.get_session(token).await {
            Ok(Some(user)) => tracing::info!("Logout requested by user {}", user.name),
            Ok(None) => return Err(AppError::NotLoggedIn),
            Err(e) => {
                tracing::error!("Logout: failed to read session {}: {}", token, e);
                return Err(AppError::NotLoggedIn);
            }
        }

        if let Err(e) = self.sessions.delete_session(token).await {
            tracing::error!("Logout: failed to delete session {}: {}", token, e);
            return Err(e.into());
        }

        tracing::info!("Deleted session {}", token);
        Ok(())
    }

    /// 注销账户
    ///
    /// 依次删除会话、用户快照和数据库记录。任一步失败立即返回，
    /// 已完成的步骤不回滚，账户可能处于存在但已登出的状态。
    pub async fn deregister(&self, name: &str, token: &str) -> Result<(), AppError> {
        if name.is_empty() {
            return Err(AppError::InvalidParams("username is empty".into()));
        }

        let user = match self.store.find_by_name(name).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::error!("Deregister: user {} not found", name);
                return Err(AppError::NotRegistered(name.to_string()));
            }
            Err(e) => {
                tracing::error!("Deregister: failed to look up user {}: {}", name, e);
                return Err(e.into());
            }
        };

        if let Err(e) = self.sessions.delete_session(token).await {
            tracing::error!("Deregister: failed to delete session {}: {}", token, e);
            return Err(e.into());
        }

        if let Err(e) = self.users.invalidate_user_snapshot(&user.name).await {
            tracing::error!("Deregister: failed to invalidate cached user {}: {}", user.name, e);
            return Err(e.into());
        }

        if let Err(e) = self.store.delete(&user).await {
            tracing::error!("Deregister: failed to delete user {}: {}", user.name, e);
            return Err(e.into());
        }

        tracing::info!("Deregistered user {}", user.name);
        Ok(())
    }

    /// 获取用户信息，只认会话中的快照
    pub async fn get_user_info(&self, name: &str, token: &str) -> Result<UserProfile, AppError> {
        if token.is_empty() || name.is_empty() {
            return Err(AppError::InvalidParams("username or session is empty".into()));
        }

        let user = self.session_user(token).await?;
        if user.name != name {
            tracing::warn!(
                "GetUserInfo: session {} belongs to {}, requested {}",
                token,
                user.name,
                name
            );
        }

        Ok(UserProfile::from(user))
    }

    /// 修改昵称
    pub async fn update_nickname(
        &self,
        name: &str,
        token: &str,
        new_nickname: &str,
    ) -> Result<NicknameUpdate, AppError> {
        if token.is_empty() || name.is_empty() {
            return Err(AppError::InvalidParams("username or session is empty".into()));
        }

        let session_user = self.session_user(token).await?;
        if session_user.name != name {
            tracing::warn!(
                "UpdateNickname: session {} belongs to {}, requested {}",
                token,
                session_user.name,
                name
            );
        }

        let patch = UserPatch {
            nickname: Some(new_nickname.to_string()),
            modifier: Some(name.to_string()),
        };
        let rows = self.store.update_fields(name, &patch).await.map_err(|e| {
            tracing::error!("UpdateNickname: update for user {} failed: {}", name, e);
            AppError::Store(e)
        })?;

        match rows {
            1 => {
                self.sync_after_update(name, token).await;
                tracing::info!("User {} changed nickname", name);
                Ok(NicknameUpdate::Applied)
            }
            0 => {
                tracing::warn!("UpdateNickname: no row updated for user {}", name);
                Ok(NicknameUpdate::Unchanged)
            }
            n => {
                tracing::error!("UpdateNickname: {} rows updated for user {}", n, name);
                if let Err(e) = self.users.invalidate_user_snapshot(name).await {
                    tracing::error!("Cached user {} may be stale: {}", name, e);
                }
                Ok(NicknameUpdate::Applied)
            }
        }
    }

    /// 旁路缓存读取：先查快照，未命中再查数据库并回填
    async fn resolve_user(&self, name: &str) -> Result<UserEntity, AppError> {
        match self.users.get_user_snapshot(name).await {
            Ok(Some(user)) if user.name == name => {
                tracing::debug!("Cache hit for user {}", name);
                return Ok(user);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to read cached user {}, using store: {}", name, e),
        }

        let user = match self.store.find_by_name(name).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AppError::NotRegistered(name.to_string())),
            Err(e) => {
                tracing::error!("Failed to load user {}: {}", name, e);
                return Err(e.into());
            }
        };

        if let Err(e) = self.users.put_user_snapshot(&user).await {
            tracing::warn!("Failed to cache user {}: {}", user.name, e);
        }
        Ok(user)
    }

    /// 通过会话解析当前用户
    async fn session_user(&self, token: &str) -> Result<UserEntity, AppError> {
        match self.sessions.get_session(token).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::NotLoggedIn),
            Err(e) => {
                tracing::error!("Failed to read session {}: {}", token, e);
                Err(e.into())
            }
        }
    }

    /// 数据库更新成功后重新读取记录，刷新用户快照和会话
    async fn sync_after_update(&self, name: &str, token: &str) {
        let user = match self.store.find_by_name(name).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("User {} disappeared after update", name);
                if let Err(e) = self.users.invalidate_user_snapshot(name).await {
                    tracing::error!("Cached user {} may be stale: {}", name, e);
                }
                return;
            }
            Err(e) => {
                tracing::error!("Failed to reload user {} for cache: {}", name, e);
                return;
            }
        };

        if let Err(e) = self.users.refresh_cached_user(&user).await {
            tracing::error!("Cached user {} left inconsistent: {}", name, e);
        }

        if token.is_empty() {
            return;
        }
        if let Err(e) = self.sessions.put_session(&user, token).await {
            tracing::warn!("Failed to refresh session {}: {}, deleting it", token, e);
            if let Err(e) = self.sessions.delete_session(token).await {
                tracing::error!("Session {} may be stale: {}", token, e);
            }
        }
    }
}

fn validate_register(params: &RegisterParams) -> Result<Gender, AppError> {
    if params.name.trim().is_empty() || params.password.is_empty() {
        tracing::error!("Register: username or password is empty");
        return Err(AppError::InvalidParams("username and password are required".into()));
    }
    if params.age <= 0 {
        tracing::error!("Register: invalid age {}", params.age);
        return Err(AppError::InvalidParams(format!("invalid age: {}", params.age)));
    }
    params.gender.parse::<Gender>().map_err(|e| {
        tracing::error!("Register: {}", e);
        AppError::InvalidParams(e)
    })
}
