//! # 会话 Cookie
//!
//! 主服务商的访问令牌直接作为会话凭据保存在 httpOnly Cookie 中，
//! 服务端不保存任何会话状态。

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::oauth::AccessToken;
use crate::config::SessionConfig;

/// 会话 Cookie 的读写
#[derive(Debug, Clone)]
pub struct SessionCarrier {
    cookie_name: String,
    secure: bool,
    max_age: cookie::time::Duration,
}

impl SessionCarrier {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            secure: config.cookie_secure,
            max_age: cookie::time::Duration::days(config.max_age_days),
        }
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// 写入会话 Cookie
    #[must_use]
    pub fn issue(&self, jar: CookieJar, token: &AccessToken) -> CookieJar {
        let mut cookie = Cookie::new(self.cookie_name.clone(), token.value().to_string());
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookie.set_max_age(self.max_age);
        jar.add(cookie)
    }

    /// 读取会话令牌，空值视为未登录
    #[must_use]
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// 清除会话 Cookie
    ///
    /// 即使请求中没有该 Cookie 也会下发过期指令。
    #[must_use]
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = Cookie::new(self.cookie_name.clone(), "");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookie.make_removal();
        jar.add(cookie)
    }
}
