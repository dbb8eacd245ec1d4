//! metadata::bgg
//!
//! BoardGameGeek XML API2 implementation of [`MetadataSource`].
//!
//! # Design
//!
//! A lookup is two requests:
//! 1. `search?query=<name>&exact=1&type=boardgame` to resolve the name to an id
//! 2. `thing?id=<id>&stats=1` to fetch the full record
//!
//! Both responses are XML and are decoded with `quick-xml`'s serde support
//! into private wire structs, then mapped onto [`GameMetadata`]. The mapping
//! functions are pure so they can be tested against captured responses.
//!
//! # Rate Limiting
//!
//! BGG answers 429 (and occasionally 202 or 503) when busy. Those responses
//! are retried with a linear backoff up to [`MAX_ATTEMPTS`] times before
//! surfacing as `MetadataError::RateLimited`.
//!
//! # Authentication
//!
//! BGG accepts an optional application token as a bearer header. When the
//! secret store holds `bgg.token` it is sent with every request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::traits::{GameMetadata, MetadataError, MetadataSource, Rank};

/// Attempts per request before giving up on a busy server.
pub const MAX_ATTEMPTS: u32 = 3;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// BoardGameGeek client.
pub struct BggClient {
    client: Client,
    api_base: String,
    user_agent: String,
    token: Option<String>,
    retry_delay: Duration,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for BggClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BggClient")
            .field("api_base", &self.api_base)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl BggClient {
    /// Create a client against `api_base` (e.g. `https://boardgamegeek.com/xmlapi2`).
    pub fn new(api_base: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            token: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Send `token` as a bearer header.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Base delay between retries; attempt `n` waits `n * delay`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn headers(&self) -> Result<HeaderMap, MetadataError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| MetadataError::Malformed("user agent is not a valid header".into()))?;
        headers.insert(USER_AGENT, agent);
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| MetadataError::AuthFailed("token is not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// GET `<api_base>/<path>` and return the body, retrying while busy.
    async fn get_xml(&self, path: &str, query: &[(&str, &str)]) -> Result<String, MetadataError> {
        let url = format!("{}/{}", self.api_base, path);
        let mut attempt = 1;
        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.headers()?)
                .query(query)
                .send()
                .await
                .map_err(|e| MetadataError::NetworkError(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::OK {
                return response
                    .text()
                    .await
                    .map_err(|e| MetadataError::NetworkError(e.to_string()));
            }

            let busy = matches!(
                status,
                StatusCode::ACCEPTED
                    | StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::SERVICE_UNAVAILABLE
            );
            if busy && attempt < MAX_ATTEMPTS {
                let delay = self.retry_delay * attempt;
                tracing::warn!(%status, attempt, ?delay, "boardgamegeek busy, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                _ if busy => MetadataError::RateLimited,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    MetadataError::AuthFailed(format!("boardgamegeek returned {}", status))
                }
                _ => MetadataError::ApiError {
                    status: status.as_u16(),
                    message: excerpt(&message),
                },
            });
        }
    }
}

#[async_trait]
impl MetadataSource for BggClient {
    fn name(&self) -> &'static str {
        "boardgamegeek"
    }

    async fn lookup(&self, name: &str) -> Result<Option<GameMetadata>, MetadataError> {
        tracing::info!(game = name, "looking up game on boardgamegeek");

        let search = self
            .get_xml(
                "search",
                &[("query", name), ("exact", "1"), ("type", "boardgame")],
            )
            .await?;
        let Some(id) = pick_search_hit(&search)? else {
            tracing::warn!(game = name, "not found on boardgamegeek");
            return Ok(None);
        };

        let id = id.to_string();
        let thing = self
            .get_xml("thing", &[("id", id.as_str()), ("stats", "1")])
            .await?;
        parse_thing(&thing)
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchItems {
    #[serde(rename = "item", default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(rename = "@id")]
    id: u64,
    #[serde(rename = "@type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ThingItems {
    #[serde(rename = "item", default)]
    items: Vec<ThingItem>,
}

#[derive(Debug, Deserialize)]
struct ThingItem {
    #[serde(rename = "@id")]
    id: u64,
    image: Option<String>,
    #[serde(rename = "name", default)]
    names: Vec<NameElement>,
    description: Option<String>,
    yearpublished: Option<ValueAttr>,
    minplayers: Option<ValueAttr>,
    maxplayers: Option<ValueAttr>,
    playingtime: Option<ValueAttr>,
    #[serde(rename = "link", default)]
    links: Vec<LinkElement>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct NameElement {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "@value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ValueAttr {
    #[serde(rename = "@value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct LinkElement {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "@value")]
    value: String,
    #[serde(rename = "@inbound")]
    inbound: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    ratings: Ratings,
}

#[derive(Debug, Deserialize)]
struct Ratings {
    usersrated: Option<ValueAttr>,
    average: Option<ValueAttr>,
    ranks: Option<RankList>,
}

#[derive(Debug, Deserialize)]
struct RankList {
    #[serde(rename = "rank", default)]
    ranks: Vec<RankElement>,
}

#[derive(Debug, Deserialize)]
struct RankElement {
    #[serde(rename = "@friendlyname")]
    friendlyname: String,
    #[serde(rename = "@value")]
    value: String,
}

fn malformed(e: quick_xml::DeError) -> MetadataError {
    MetadataError::Malformed(e.to_string())
}

/// Pick the id to fetch from a search response.
///
/// Base games win over expansions that share the name; otherwise the first
/// hit is used.
fn pick_search_hit(xml: &str) -> Result<Option<u64>, MetadataError> {
    let parsed: SearchItems = quick_xml::de::from_str(xml).map_err(malformed)?;
    let hit = parsed
        .items
        .iter()
        .find(|item| item.kind == "boardgame")
        .or_else(|| parsed.items.first());
    Ok(hit.map(|item| item.id))
}

/// Map a `thing` response onto [`GameMetadata`].
fn parse_thing(xml: &str) -> Result<Option<GameMetadata>, MetadataError> {
    let parsed: ThingItems = quick_xml::de::from_str(xml).map_err(malformed)?;
    let Some(item) = parsed.items.into_iter().next() else {
        return Ok(None);
    };

    let name = item
        .names
        .iter()
        .find(|n| n.kind == "primary")
        .or_else(|| item.names.first())
        .map(|n| n.value.clone())
        .ok_or_else(|| MetadataError::Malformed(format!("item {} has no name", item.id)))?;

    let links_of = |kind: &str| -> Vec<String> {
        item.links
            .iter()
            .filter(|l| l.kind == kind && l.inbound.as_deref() != Some("true"))
            .map(|l| l.value.clone())
            .collect()
    };

    let number = |attr: &Option<ValueAttr>| -> Option<f64> {
        attr.as_ref().and_then(|a| a.value.trim().parse::<f64>().ok())
    };

    let (rating_average, users_rated, ranks) = match &item.statistics {
        Some(stats) => (
            number(&stats.ratings.average).unwrap_or(0.0),
            number(&stats.ratings.usersrated).unwrap_or(0.0) as u64,
            stats
                .ratings
                .ranks
                .as_ref()
                .map(|r| {
                    r.ranks
                        .iter()
                        .map(|rank| Rank {
                            label: rank.friendlyname.clone(),
                            value: rank.value.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        ),
        None => (0.0, 0, Vec::new()),
    };

    Ok(Some(GameMetadata {
        id: item.id,
        name,
        image: item.image.as_deref().map(str::trim).map(String::from),
        year: number(&item.yearpublished)
            .map(|y| y as i32)
            .filter(|y| *y != 0),
        designers: links_of("boardgamedesigner"),
        publishers: links_of("boardgamepublisher"),
        mechanics: links_of("boardgamemechanic"),
        expansions: links_of("boardgameexpansion"),
        min_players: number(&item.minplayers).unwrap_or(0.0) as u32,
        max_players: number(&item.maxplayers).unwrap_or(0.0) as u32,
        playing_time: number(&item.playingtime).unwrap_or(0.0) as u32,
        rating_average,
        users_rated,
        ranks,
        description: decode_html_entities(item.description.as_deref().unwrap_or("").trim()),
    }))
}

/// Decode the HTML entities BGG leaves in descriptions after XML unescaping.
fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                "ndash" => Some('\u{2013}'),
                "mdash" => Some('\u{2014}'),
                "hellip" => Some('\u{2026}'),
                "lsquo" => Some('\u{2018}'),
                "rsquo" => Some('\u{2019}'),
                "ldquo" => Some('\u{201c}'),
                "rdquo" => Some('\u{201d}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
