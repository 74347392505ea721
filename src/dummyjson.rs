use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

pub const DUMMYJSON_BASE: &str = "https://dummyjson.com";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub base_url: Option<String>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Posts,
    Users,
    Comments,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Posts => "/posts",
            Endpoint::Users => "/users",
            Endpoint::Comments => "/comments",
        }
    }

    /// Name of the top-level array in the response envelope.
    pub fn field(&self) -> &'static str {
        match self {
            Endpoint::Posts => "posts",
            Endpoint::Users => "users",
            Endpoint::Comments => "comments",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{endpoint}: server answered {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint}: malformed response: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("dummyjson client user agent required");
        }
        let base = config
            .base_url
            .unwrap_or_else(|| DUMMYJSON_BASE.to_string());
        let base_url = Url::parse(&base)?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, url::ParseError> {
        self.base_url.join(endpoint.path())
    }

    pub fn posts(&self) -> Result<Vec<Post>, FetchError> {
        self.fetch_collection(Endpoint::Posts)
    }

    pub fn users(&self) -> Result<Vec<User>, FetchError> {
        self.fetch_collection(Endpoint::Users)
    }

    pub fn comments(&self) -> Result<Vec<Comment>, FetchError> {
        self.fetch_collection(Endpoint::Comments)
    }

    /// Fetches one endpoint and extracts its named array. A response without
    /// that field yields an empty collection.
    pub fn fetch_collection<T>(&self, endpoint: Endpoint) -> Result<Vec<T>, FetchError>
    where
        T: DeserializeOwned,
    {
        let name = endpoint.field();
        let url = self.endpoint_url(endpoint).map_err(|err| FetchError::Parse {
            endpoint: name,
            source: serde::de::Error::custom(err),
        })?;

        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|source| FetchError::Transport {
                endpoint: name,
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: name,
                status,
            });
        }

        let body = resp.text().map_err(|source| FetchError::Transport {
            endpoint: name,
            source,
        })?;
        extract_collection(&body, name).map_err(|source| FetchError::Parse {
            endpoint: name,
            source,
        })
    }
}

pub fn extract_collection<T>(body: &str, field: &str) -> Result<Vec<T>, serde_json::Error>
where
    T: DeserializeOwned,
{
    let mut envelope: Value = serde_json::from_str(body)?;
    match envelope.get_mut(field).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => serde_json::from_value(items),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "reaction_count")]
    pub reactions: i64,
    pub user_id: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub body: String,
    pub post_id: i64,
    pub user: CommentUser,
}

/// The commenter reference embedded in a comment. It can lag behind or
/// omit fields of the matching [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUser {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reactions {
    Count(i64),
    Split {
        #[serde(default)]
        likes: i64,
    },
}

fn reaction_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Reactions>::deserialize(deserializer)? {
        Some(Reactions::Count(count)) => count,
        Some(Reactions::Split { likes }) => likes,
        None => 0,
    })
}
