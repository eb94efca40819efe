//! Implements the `Gateway` trait with `reqwest`, talking to the finance REST API.

use crate::api::{Gateway, ListFilter};
use crate::model::{
    Category, History, MonthlyItem, NewTransaction, Period, Transaction, TransactionSummary,
};
use crate::Result;
use anyhow::{bail, Context};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

const TRANSACTIONS: &str = "transactions";
const CATEGORIES: &str = "categories";
const SUMMARY: &str = "summary";
const HISTORICAL: &str = "historical";

/// Implements the `Gateway` trait over HTTP. Paths are resolved against `base`, e.g. with a base of
/// `http://localhost:3333/api` the list endpoint is `http://localhost:3333/api/transactions`.
pub struct HttpGateway {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let base = Url::parse(api_url)
            .with_context(|| format!("The API URL '{api_url}' is not a valid URL"))?;
        if base.cannot_be_a_base() {
            bail!("The API URL '{api_url}' cannot have paths appended to it");
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            token,
        })
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("The API URL '{}' cannot be a base", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        trace!("{method} {url}");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn list_transactions(&self, filter: &ListFilter) -> Result<Vec<Transaction>> {
        let url = self.endpoint(&[TRANSACTIONS])?;
        let response = send(self.request(Method::GET, url).query(filter), "list transactions")
            .await?;
        parse(response, "transactions").await
    }

    async fn summary(&self, period: Period) -> Result<TransactionSummary> {
        let url = self.endpoint(&[TRANSACTIONS, SUMMARY])?;
        let query = [
            ("month", period.padded_month()),
            ("year", period.year().to_string()),
        ];
        let response = send(self.request(Method::GET, url).query(&query), "fetch summary").await?;
        parse(response, "summary").await
    }

    async fn history(&self, period: Period, months: u32) -> Result<Vec<MonthlyItem>> {
        let url = self.endpoint(&[TRANSACTIONS, HISTORICAL])?;
        let query = [
            ("month", period.month().to_string()),
            ("year", period.year().to_string()),
            ("months", months.to_string()),
        ];
        let response = send(self.request(Method::GET, url).query(&query), "fetch history").await?;
        let history: History = parse(response, "history").await?;
        Ok(history.into_items())
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&[TRANSACTIONS, id])?;
        send(self.request(Method::DELETE, url), "delete transaction").await?;
        Ok(())
    }

    async fn create_transaction(&self, new: &NewTransaction) -> Result<Transaction> {
        let url = self.endpoint(&[TRANSACTIONS])?;
        let response = send(self.request(Method::POST, url).json(new), "create transaction")
            .await?;
        parse(response, "created transaction").await
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let url = self.endpoint(&[CATEGORIES])?;
        let response = send(self.request(Method::GET, url), "fetch categories").await?;
        parse(response, "categories").await
    }
}

/// Sends the request and turns non-success statuses into errors that include the response body.
async fn send(builder: RequestBuilder, what: &str) -> Result<Response> {
    let response = builder
        .send()
        .await
        .with_context(|| format!("Failed to send the request to {what}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("Request to {what} failed with status {status}: {body}");
    }
    Ok(response)
}

async fn parse<T>(response: Response, what: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse the {what} in the API response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let g = HttpGateway::new("http://localhost:3333/api", None).unwrap();
        let url = g.endpoint(&[TRANSACTIONS, SUMMARY]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/api/transactions/summary");
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let g = HttpGateway::new("http://localhost:3333/api/", None).unwrap();
        let url = g.endpoint(&[CATEGORIES]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/api/categories");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let g = HttpGateway::new("https://example.com", None).unwrap();
        let url = g.endpoint(&[TRANSACTIONS, "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/transactions/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(HttpGateway::new("not a url", None).is_err());
        assert!(HttpGateway::new("mailto:someone@example.com", None).is_err());
    }
}
