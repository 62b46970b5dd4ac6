use anyhow::{anyhow, bail, Context};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Thin HTTP client over the API's success/error envelopes
pub struct ApiClient {
    base_url: Url,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid API URL: {}", base_url))?;
        Ok(Self {
            base_url,
            http: Client::new(),
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.fetch(self.endpoint(path)?).await
    }

    /// GET one record by key; the key is percent-encoded as a single path segment
    pub async fn get_item(&self, collection: &str, key: &str) -> anyhow::Result<Value> {
        self.fetch(self.item_endpoint(collection, key)?).await
    }

    async fn fetch(&self, url: Url) -> anyhow::Result<Value> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url.path()))?;
        Self::unwrap_envelope(response).await
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> anyhow::Result<Value> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;
        Self::unwrap_envelope(response).await
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid API path: {}", path))
    }

    fn item_endpoint(&self, collection: &str, key: &str) -> anyhow::Result<Url> {
        let mut url = self.endpoint(collection)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    async fn unwrap_envelope(response: Response) -> anyhow::Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|_| anyhow!("HTTP {}: {}", status, text.trim()))?;
        extract_data(status.as_u16(), body)
    }
}

/// Pull `data` out of a success envelope, or turn an error body into an error
fn extract_data(status: u16, mut body: Value) -> anyhow::Result<Value> {
    if body["success"].as_bool() == Some(true) {
        return Ok(body["data"].take());
    }

    let message = body["message"]
        .as_str()
        .or_else(|| body["error"].as_str())
        .unwrap_or("request failed");
    match (body["code"].as_str(), body.get("field_errors")) {
        (Some(code), Some(fields)) => bail!("{} ({}, HTTP {}): {}", message, code, status, fields),
        (Some(code), None) => bail!("{} ({}, HTTP {})", message, code, status),
        _ => bail!("{} (HTTP {})", message, status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn returns_data_from_success_envelope() {
        let data = extract_data(200, json!({ "success": true, "data": [1, 2] })).unwrap();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn surfaces_api_error_message() {
        let err = extract_data(
            404,
            json!({ "error": true, "message": "bird species not found", "code": "NOT_FOUND" }),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "bird species not found (NOT_FOUND, HTTP 404)");
    }

    #[test]
    fn surfaces_degraded_health_error() {
        let err = extract_data(503, json!({ "success": false, "error": "storage unavailable" }))
            .unwrap_err();
        assert_eq!(err.to_string(), "storage unavailable (HTTP 503)");
    }

    #[test]
    fn joins_paths_onto_base_url() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.endpoint("/api/taxonomy/NORCAD").unwrap().as_str(),
            "http://localhost:3000/api/taxonomy/NORCAD"
        );
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn encodes_keys_as_one_segment() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.item_endpoint("/api/taxonomy", "RED/TAIL?x#y").unwrap().as_str(),
            "http://localhost:3000/api/taxonomy/RED%2FTAIL%3Fx%23y"
        );
        assert_eq!(
            client.item_endpoint("/api/locations", "7").unwrap().as_str(),
            "http://localhost:3000/api/locations/7"
        );
    }
}
