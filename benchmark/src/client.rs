//! @ai:module:intent HTTP client used by benchmark harnesses to report runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api TrackerClient
//! @ai:module:stateless true

use crate::model::{Benchmark, BenchmarkRun, Measurement, PageRequest, TimeRange};
use anyhow::{anyhow, Context, Result};
use chrono::SecondsFormat;
use reqwest::Url;
use serde::de::DeserializeOwned;

/// @ai:intent Typed client for the `/v1/benchmark` REST API
#[derive(Debug, Clone)]
pub struct TrackerClient {
    client: reqwest::Client,
    base_url: Url,
}

impl TrackerClient {
    /// @ai:intent Create a client for a service base URL (e.g. http://localhost:8080)
    /// @ai:effects pure
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// @ai:intent Build an endpoint URL, percent-encoding every path segment
    /// @ai:effects pure
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .push("v1")
            .push("benchmark")
            .extend(segments);
        Ok(url)
    }

    /// @ai:effects network
    async fn post(&self, url: Url, measurements: Option<&[Measurement]>) -> Result<()> {
        let request = self.client.post(url.clone());
        let request = match measurements {
            Some(measurements) => request.json(measurements),
            None => request,
        };

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        check_status(response).await?;
        Ok(())
    }

    /// @ai:effects network
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// @ai:intent Start a benchmark run
    /// @ai:effects network
    pub async fn start_run(&self, name: &str, sequence_id: &str) -> Result<()> {
        let url = self.endpoint(&[name, sequence_id, "start"])?;
        self.post(url, None).await
    }

    /// @ai:intent Finish a benchmark run with its measurements
    /// @ai:effects network
    pub async fn finish_run(
        &self,
        name: &str,
        sequence_id: &str,
        measurements: &[Measurement],
    ) -> Result<()> {
        let url = self.endpoint(&[name, sequence_id, "finish"])?;
        self.post(url, Some(measurements)).await
    }

    /// @ai:intent Start an execution within a run
    /// @ai:effects network
    pub async fn start_execution(
        &self,
        name: &str,
        sequence_id: &str,
        execution_sequence_id: &str,
    ) -> Result<()> {
        let url = self.endpoint(&[name, sequence_id, "execution", execution_sequence_id, "start"])?;
        self.post(url, None).await
    }

    /// @ai:intent Finish an execution with its measurements
    /// @ai:effects network
    pub async fn finish_execution(
        &self,
        name: &str,
        sequence_id: &str,
        execution_sequence_id: &str,
        measurements: &[Measurement],
    ) -> Result<()> {
        let url =
            self.endpoint(&[name, sequence_id, "execution", execution_sequence_id, "finish"])?;
        self.post(url, Some(measurements)).await
    }

    /// @ai:intent Fetch one run with its executions
    /// @ai:effects network
    pub async fn get_run(&self, name: &str, sequence_id: &str) -> Result<BenchmarkRun> {
        let url = self.endpoint(&[name, sequence_id])?;
        self.get(url).await
    }

    /// @ai:intent Fetch runs of a benchmark within a time range
    /// @ai:effects network
    pub async fn get_benchmark(
        &self,
        name: &str,
        range: &TimeRange,
        page: &PageRequest,
    ) -> Result<Benchmark> {
        let mut url = self.endpoint(&[name])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(from) = range.from {
                query.append_pair("from", &from.to_rfc3339_opts(SecondsFormat::Micros, true));
            }
            if let Some(to) = range.to {
                query.append_pair("to", &to.to_rfc3339_opts(SecondsFormat::Micros, true));
            }
            query
                .append_pair("page", &page.page.to_string())
                .append_pair("size", &page.size.to_string());
        }
        self.get(url).await
    }

    /// @ai:intent Fetch the latest run of every benchmark
    /// @ai:effects network
    pub async fn latest(&self, page: &PageRequest) -> Result<Vec<BenchmarkRun>> {
        let mut url = self.endpoint(&["latest"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.page.to_string())
            .append_pair("size", &page.size.to_string());
        self.get(url).await
    }
}

/// @ai:intent Turn a non-2xx response into an error carrying status and body
/// @ai:effects network
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("Benchmark service error ({}): {}", status, error_text);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = TrackerClient::new("http://localhost:8080/").unwrap();
        let url = client.endpoint(&["tpch q1", "run/7", "start"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v1/benchmark/tpch%20q1/run%2F7/start"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = TrackerClient::new("http://localhost:8080/tracker").unwrap();
        let url = client.endpoint(&["latest"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/tracker/v1/benchmark/latest");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(TrackerClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        let client = TrackerClient::new("http://127.0.0.1:1").unwrap();
        let err = client.start_run("bench", "1").await.unwrap_err();
        assert!(err.to_string().contains("Failed to send request"));
    }
}
