/// 用户信息快照缓存键前缀
const USER_INFO_PREFIX: &str = "user:";

/// 会话缓存键前缀
const SESSION_PREFIX: &str = "session:";

/// 生成用户信息快照缓存键
pub fn user_info_key(name: &str) -> String {
    format!("{}{}", USER_INFO_PREFIX, name)
}

/// 生成会话缓存键
pub fn session_key(token: &str) -> String {
    format!("{}{}", SESSION_PREFIX, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_separate_namespaces() {
        assert_eq!(user_info_key("alice"), "user:alice");
        assert_eq!(session_key("abc"), "session:abc");
    }
}
