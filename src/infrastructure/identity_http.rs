use crate::config::IdentityApiConfig;
use crate::domain::account::Account;
use crate::domain::ports::IdentityResolver;
use crate::error::{NotifyError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Reply of the user-info endpoint.
#[derive(Debug, Deserialize, PartialEq, Eq, Default)]
pub struct UserInfoReply {
    #[serde(default)]
    pub unionid: Option<String>,
    #[serde(default)]
    pub errcode: Option<i64>,
    #[serde(default)]
    pub errmsg: Option<String>,
}

impl UserInfoReply {
    pub fn into_union_id(self) -> Result<Option<String>> {
        match self.errcode {
            Some(code) if code != 0 => Err(NotifyError::Upstream(format!(
                "identity api error {code}: {}",
                self.errmsg.unwrap_or_default()
            ))),
            _ => Ok(self.unionid.filter(|u| !u.is_empty())),
        }
    }
}

/// Resolves union ids through each account's user-info endpoint.
pub struct HttpIdentityResolver {
    endpoints: HashMap<String, IdentityApiConfig>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpIdentityResolver {
    /// `endpoints` maps account ids to their identity API settings.
    pub fn new(endpoints: HashMap<String, IdentityApiConfig>, timeout: Duration) -> Self {
        Self {
            endpoints,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve_union_id(&self, account: &Account, open_id: &str) -> Result<Option<String>> {
        let endpoint = self.endpoints.get(&account.id).ok_or_else(|| {
            NotifyError::Configuration(format!(
                "account '{}' has no identity api configured",
                account.id
            ))
        })?;

        let url = format!("{}/cgi-bin/user/info", endpoint.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(url)
            .query(&[
                ("access_token", endpoint.access_token.as_str()),
                ("openid", open_id),
                ("lang", "zh_CN"),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout {
                        operation: "identity api",
                    }
                } else {
                    NotifyError::Upstream(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Upstream(format!(
                "identity api returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let reply: UserInfoReply = resp
            .json()
            .await
            .map_err(|e| NotifyError::Upstream(format!("unreadable identity reply: {e}")))?;
        reply.into_union_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_union_id() {
        let reply: UserInfoReply =
            serde_json::from_str(r#"{"openid": "o-1", "unionid": "u-1"}"#).unwrap();
        assert_eq!(reply.into_union_id().unwrap(), Some("u-1".to_string()));
    }

    #[test]
    fn test_reply_without_union_id() {
        let reply: UserInfoReply = serde_json::from_str(r#"{"openid": "o-1"}"#).unwrap();
        assert_eq!(reply.into_union_id().unwrap(), None);
    }

    #[test]
    fn test_reply_with_error_code() {
        let reply: UserInfoReply =
            serde_json::from_str(r#"{"errcode": 40003, "errmsg": "invalid openid"}"#).unwrap();
        assert!(matches!(
            reply.into_union_id(),
            Err(NotifyError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_account_is_configuration_error() {
        let resolver = HttpIdentityResolver::new(HashMap::new(), Duration::from_secs(1));
        let account = Account {
            id: "A1".to_string(),
            app_id: "app-1".to_string(),
            merchant_id: "m-1".to_string(),
        };
        assert!(matches!(
            resolver.resolve_union_id(&account, "o-1").await,
            Err(NotifyError::Configuration(_))
        ));
    }
}
