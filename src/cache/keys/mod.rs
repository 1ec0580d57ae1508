/// 缓存键模块
/// 提供各种缓存键生成函数
use axum::http::Uri;

/// 接口响应缓存键前缀
pub const API_PREFIX: &str = "api:";

/// 吊销令牌缓存键前缀
const REVOKED_TOKEN_PREFIX: &str = "token:revoked:";

/// 密码重置令牌缓存键前缀
const PASSWORD_RESET_PREFIX: &str = "password_reset:";

/// 生成接口响应缓存键，包含完整路径和查询串
pub fn api_cache_key(uri: &Uri) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{}{}", API_PREFIX, path_and_query)
}

/// 生成某个路径的精确缓存键
pub fn api_path_key(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

/// 生成某个路径前缀下所有响应的匹配模式
pub fn api_prefix_pattern(prefix: &str) -> String {
    format!("{}{}*", API_PREFIX, escape_glob(prefix))
}

pub fn revoked_token_key(fingerprint: &str) -> String {
    format!("{}{}", REVOKED_TOKEN_PREFIX, fingerprint)
}

pub fn password_reset_key(token: &str) -> String {
    format!("{}{}", PASSWORD_RESET_PREFIX, token)
}

/// 转义 Redis glob 特殊字符，路径本身按字面匹配
fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Redis 风格的 glob 匹配，支持 `*`、`?` 和反斜杠转义
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();
    glob_match_from(&pattern, &candidate)
}

fn glob_match_from(pattern: &[char], candidate: &[char]) -> bool {
    match pattern.first() {
        None => candidate.is_empty(),
        Some('*') => (0..=candidate.len()).any(|i| glob_match_from(&pattern[1..], &candidate[i..])),
        Some('?') => !candidate.is_empty() && glob_match_from(&pattern[1..], &candidate[1..]),
        Some('\\') if pattern.len() > 1 => {
            candidate.first() == Some(&pattern[1]) && glob_match_from(&pattern[2..], &candidate[1..])
        }
        Some(c) => candidate.first() == Some(c) && glob_match_from(&pattern[1..], &candidate[1..]),
    }
}
