//! Login and token-validity calls.
//!
//! A successful login answers with a redirect and plants a percent-encoded
//! `USERINFO` cookie carrying the authorization token; the redirect itself is
//! never followed.

use std::sync::Arc;

use percent_encoding::percent_decode_str;

use crate::api::urls::ApiUrls;
use crate::client::RemoteClient;
use crate::core::errors::EngineError;
use crate::schemas::LoginUserInfo;

pub(crate) struct AuthApi {
    client: Arc<RemoteClient>,
    urls: ApiUrls,
}

impl AuthApi {
    pub(crate) fn new(client: Arc<RemoteClient>, urls: ApiUrls) -> Self {
        Self { client, urls }
    }

    pub(crate) async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginUserInfo, EngineError> {
        let url = format!("{}/users/login/v2", self.urls.course);
        let fields = vec![
            ("loginName".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        let response = self.client.post_form(&url, fields).await?;

        if response.status != 302 {
            return Err(EngineError::Auth(format!(
                "login answered with status {}",
                response.status
            )));
        }

        let raw = match response
            .set_cookies
            .iter()
            .find(|(name, _)| name == "USERINFO")
            .map(|(_, value)| value.clone())
        {
            Some(value) => value,
            // The jar already merged the response cookies; fall back to it in
            // case the redirect chain delivered USERINFO earlier.
            None => self
                .client
                .cookies()
                .await
                .get("USERINFO")
                .cloned()
                .ok_or_else(|| {
                    EngineError::Auth("login succeeded but USERINFO cookie is missing".to_string())
                })?,
        };

        let decoded = percent_decode_str(&raw)
            .decode_utf8()
            .map_err(|err| EngineError::Parse(format!("USERINFO cookie is not utf-8: {err}")))?;
        serde_json::from_str(&decoded)
            .map_err(|err| EngineError::Parse(format!("USERINFO cookie failed to parse: {err}")))
    }

    /// `true` only when the service confirms the token is still valid.
    pub(crate) async fn check_token(&self, token: &str) -> Result<bool, EngineError> {
        let url = format!("{}/users/isValidToken/{}", self.urls.course, token);
        let response = self.client.get(&url, &[]).await?;
        Ok(response.status == 200 && response.body.trim().eq_ignore_ascii_case("true"))
    }
}
