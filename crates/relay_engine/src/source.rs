use relay_logging::{relay_debug, relay_info};
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::config::{ListingQuery, SourceCredentials};
use crate::types::map_reqwest_error;
use crate::{FailureKind, Post, RelayError};

/// Fetches candidate posts for a listing query.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    async fn fetch(&self, query: &ListingQuery) -> Result<Vec<Post>, RelayError>;
}

/// Client-identity header value the upstream API requires on every request.
///
/// Names the operating account as `(by /u/<name>)` when one is configured.
pub fn user_agent(credentials: &SourceCredentials) -> String {
    let client_id = match credentials.client_id.as_str() {
        "" => "anonymous",
        id => id,
    };
    let agent = format!("rust:reddit-relay:{client_id}:v{}", env!("CARGO_PKG_VERSION"));
    if credentials.username.is_empty() {
        agent
    } else {
        format!("{agent} (by /u/{})", credentials.username)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: ChildData,
}

#[derive(Debug, Deserialize)]
struct ChildData {
    url: Option<String>,
    #[serde(default)]
    title: String,
    id: Option<String>,
    permalink: Option<String>,
}

/// Authenticated listing client for the content API.
pub struct RedditSource {
    client: reqwest::Client,
    api_base: String,
    token: String,
    user_agent: String,
}

impl RedditSource {
    /// Exchange credentials for a bearer token.
    ///
    /// Uses the password grant when a username is configured and falls back to
    /// client credentials otherwise.
    pub async fn login(
        client: reqwest::Client,
        auth_base: &str,
        api_base: &str,
        credentials: &SourceCredentials,
    ) -> Result<Self, RelayError> {
        let user_agent = user_agent(credentials);
        let form: Vec<(&str, &str)> = if credentials.username.is_empty() {
            vec![("grant_type", "client_credentials")]
        } else {
            vec![
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ]
        };

        let url = format!("{}/api/v1/access_token", auth_base.trim_end_matches('/'));
        let response = client
            .post(&url)
            .header(USER_AGENT, &user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.secret))
            .form(&form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::new(
                FailureKind::HttpStatus(status.as_u16()),
                "token exchange failed",
            ));
        }

        let body: TokenResponse = response.json().await.map_err(map_reqwest_error)?;
        let token = match (body.access_token, body.error) {
            (Some(token), _) => token,
            (None, error) => {
                return Err(RelayError::new(
                    FailureKind::Api,
                    format!(
                        "token exchange rejected: {}",
                        error.unwrap_or_else(|| "no access token".to_string())
                    ),
                ))
            }
        };
        relay_debug!("Obtained source access token");

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            user_agent,
        })
    }
}

#[async_trait::async_trait]
impl Source for RedditSource {
    async fn fetch(&self, query: &ListingQuery) -> Result<Vec<Post>, RelayError> {
        relay_info!("Getting posts");
        let url = format!("{}{}", self.api_base, query.route());
        relay_debug!("Url path: {}", query.route());

        let limit = query.limit.to_string();
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .bearer_auth(&self.token)
            .query(&[
                ("limit", limit.as_str()),
                ("t", query.period.as_str()),
                ("raw_json", "1"),
            ])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("listing {} failed", query.route()),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        parse_listing(&body)
    }
}

fn parse_listing(body: &[u8]) -> Result<Vec<Post>, RelayError> {
    let listing: Listing = serde_json::from_slice(body)
        .map_err(|err| RelayError::new(FailureKind::Parse, format!("listing: {err}")))?;

    Ok(listing
        .data
        .children
        .into_iter()
        .filter_map(|child| {
            let data = child.data;
            data.url.map(|url| Post {
                url,
                title: data.title,
                id: data.id,
                permalink: data.permalink,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_skips_children_without_url() {
        let body = br#"{"kind":"Listing","data":{"children":[
            {"kind":"t3","data":{"url":"https://i.redd.it/a.jpg","title":"A","id":"a1"}},
            {"kind":"t3","data":{"title":"self post"}},
            {"kind":"t3","data":{"url":"https://www.reddit.com/gallery/b2","title":"B"}}
        ]}}"#;
        let posts = parse_listing(body).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "https://i.redd.it/a.jpg");
        assert_eq!(posts[0].id.as_deref(), Some("a1"));
        assert_eq!(posts[1].title, "B");
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        let posts = parse_listing(br#"{"data":{"children":[]}}"#).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn malformed_listing_is_parse_error() {
        let err = parse_listing(b"<html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::Parse);
    }

    fn credentials(client_id: &str, username: &str) -> SourceCredentials {
        SourceCredentials {
            client_id: client_id.to_string(),
            secret: "secret".to_string(),
            username: username.to_string(),
            password: String::new(),
        }
    }

    #[test]
    fn user_agent_names_client() {
        let agent = user_agent(&credentials("abc123", ""));
        assert!(agent.starts_with("rust:reddit-relay:abc123:v"));
        assert!(!agent.contains("(by"));
        assert!(user_agent(&credentials("", "")).contains("anonymous"));
    }

    #[test]
    fn user_agent_credits_operating_account() {
        let agent = user_agent(&credentials("abc123", "relaybot"));
        assert!(agent.starts_with("rust:reddit-relay:abc123:v"));
        assert!(agent.ends_with(" (by /u/relaybot)"));
    }
}
