//! HTTP client for the live card database API

use crate::carddb::{Card, CardDatabase, CardSet};
use crate::config::CardApiConfig;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Body of a field update command
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldUpdate<'a> {
    auth_token: &'a str,
    field: &'a str,
    value: Option<&'a str>,
}

/// Card database client over the public HTTP API.
///
/// `GET {base}/cards/{mvid}` and `GET {base}/sets/{id}` read records;
/// `POST` to the same paths applies a single field.
pub struct HttpCardDatabase {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpCardDatabase {
    pub fn new(config: &CardApiConfig) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("Invalid card API URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Card API URL {} cannot take a path",
                config.base_url
            )));
        }

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// `{base}/{collection}/{key}` with `key` encoded as a single path segment
    fn record_url(&self, collection: &str, key: &str) -> Result<Url, AppError> {
        if matches!(key, "" | "." | "..") {
            return Err(AppError::BadRequest(format!("Invalid record key '{}'", key)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Card API URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push(collection)
            .push(key);
        Ok(url)
    }

    fn card_url(&self, mvid: i32) -> Result<Url, AppError> {
        self.record_url("cards", &mvid.to_string())
    }

    fn set_url(&self, set_id: &str) -> Result<Url, AppError> {
        self.record_url("sets", set_id)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, AppError> {
        debug!("Fetching {} from {}", what, url);

        let response = self.http_client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("{} not found", what))),
            status if !status.is_success() => Err(AppError::Upstream(format!(
                "GET {} returned {}",
                url, status
            ))),
            _ => Ok(response.json::<T>().await?),
        }
    }

    async fn post_update(&self, url: Url, body: &FieldUpdate<'_>) -> Result<(), AppError> {
        let response = self.http_client.post(url.clone()).json(body).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("No record at {}", url))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Forbidden(
                "Card database rejected the update token".to_string(),
            )),
            status if !status.is_success() => Err(AppError::Upstream(format!(
                "POST {} returned {}",
                url, status
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CardDatabase for HttpCardDatabase {
    async fn get_card(&self, mvid: i32) -> Result<Card, AppError> {
        self.fetch(self.card_url(mvid)?, &format!("Card {}", mvid)).await
    }

    async fn get_set(&self, set_id: &str) -> Result<CardSet, AppError> {
        self.fetch(self.set_url(set_id)?, &format!("Card set {}", set_id)).await
    }

    async fn update_card_field(
        &self,
        token: &str,
        mvid: i32,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), AppError> {
        let body = FieldUpdate {
            auth_token: token,
            field,
            value,
        };
        self.post_update(self.card_url(mvid)?, &body).await?;
        info!("Updated field {} of card {}", field, mvid);
        Ok(())
    }

    async fn update_set_field(
        &self,
        token: &str,
        set_id: &str,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), AppError> {
        let body = FieldUpdate {
            auth_token: token,
            field,
            value,
        };
        self.post_update(self.set_url(set_id)?, &body).await?;
        info!("Updated field {} of set {}", field, set_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpCardDatabase {
        HttpCardDatabase::new(&CardApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let db = client("http://127.0.0.1:8082/");
        assert_eq!(db.card_url(2).unwrap().as_str(), "http://127.0.0.1:8082/cards/2");
        assert_eq!(db.set_url("THS").unwrap().as_str(), "http://127.0.0.1:8082/sets/THS");
    }

    #[test]
    fn test_urls_keep_base_path() {
        let db = client("http://cards.mtgdb.info/api/");
        assert_eq!(db.set_url("THS").unwrap().as_str(), "http://cards.mtgdb.info/api/sets/THS");
    }

    #[test]
    fn test_set_id_stays_inside_sets() {
        let db = client("http://127.0.0.1:8082");
        let url = db.set_url("../cards/2").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8082/sets/..%2Fcards%2F2");
        assert_eq!(url.path_segments().unwrap().count(), 2);

        assert!(matches!(db.set_url(".."), Err(AppError::BadRequest(_))));
        assert!(matches!(db.set_url(""), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_field_update_body() {
        let body = FieldUpdate {
            auth_token: "abc",
            field: "description",
            value: Some("lucky"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["authToken"], "abc");
        assert_eq!(json["field"], "description");
        assert_eq!(json["value"], "lucky");
    }
}
