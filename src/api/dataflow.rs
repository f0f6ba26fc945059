use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::thread;
use std::time::{Duration, Instant};

use crate::batch::{BatchFormat, ordered_results};
use crate::config::DataflowConfig;
use crate::domain::BatchForwardResult;

const USER_AGENT: &str = "geobatch/0.1.0";

/// Envelope shared by every Bing Maps REST reply
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataflowResponse {
    #[serde(default)]
    resource_sets: Vec<ResourceSet>,
}

#[derive(Debug, Deserialize)]
struct ResourceSet {
    #[serde(default)]
    resources: Vec<DataflowJob>,
}

/// A geocode dataflow job as described by the service
#[derive(Debug, Deserialize)]
pub struct DataflowJob {
    pub id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    Pending,
    Completed,
    Aborted,
    Other(String),
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => JobStatus::Pending,
            "Completed" => JobStatus::Completed,
            "Aborted" => JobStatus::Aborted,
            _ => JobStatus::Other(s),
        }
    }
}

impl DataflowResponse {
    fn into_job(self) -> Result<DataflowJob> {
        self.resource_sets
            .into_iter()
            .next()
            .and_then(|set| set.resources.into_iter().next())
            .context("Dataflow response contained no job resource")
    }
}

/// Drive `status` until it reports `Completed`.
///
/// Fails on `Aborted` or once `timeout_secs` has passed since the first
/// check. Any other status is treated as still pending.
fn poll_until_complete<F>(job_id: &str, config: &DataflowConfig, mut status: F) -> Result<()>
where
    F: FnMut() -> Result<JobStatus>,
{
    let poll = Duration::from_secs(config.poll_interval_secs);
    let timeout = Duration::from_secs(config.timeout_secs);
    let start = Instant::now();

    loop {
        match status()? {
            JobStatus::Completed => return Ok(()),
            JobStatus::Aborted => bail!("Dataflow job {} was aborted", job_id),
            JobStatus::Pending | JobStatus::Other(_) => {}
        }
        if start.elapsed() >= timeout {
            bail!(
                "Dataflow job {} did not complete within {}s",
                job_id,
                config.timeout_secs
            );
        }
        thread::sleep(poll);
    }
}

/// Submits batches to the Bing geocode dataflow and collects the results.
///
/// One round trip per call and no retries; a failed request surfaces as an
/// error to the caller.
pub struct DataflowClient {
    client: reqwest::blocking::Client,
    config: DataflowConfig,
    key: String,
}

impl DataflowClient {
    pub fn new(key: impl Into<String>, config: DataflowConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            key: key.into(),
        })
    }

    fn job_url(&self, job_id: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), job_id)
    }

    /// Upload a batch document, returning the new job id
    pub fn submit(&self, payload: String) -> Result<String> {
        let response = self
            .client
            .post(&self.config.url)
            .query(&[("input", "csv"), ("key", self.key.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(payload)
            .send()
            .context("Failed to submit batch to Bing dataflow API")?;

        if !response.status().is_success() {
            bail!("Bing dataflow API returned error status: {}", response.status());
        }

        let reply: DataflowResponse = response
            .json()
            .context("Failed to parse dataflow job JSON response")?;
        Ok(reply.into_job()?.id)
    }

    pub fn job_status(&self, job_id: &str) -> Result<JobStatus> {
        let response = self
            .client
            .get(self.job_url(job_id))
            .query(&[("key", self.key.as_str())])
            .send()
            .context("Failed to query dataflow job status")?;

        if !response.status().is_success() {
            bail!("Bing dataflow API returned error status: {}", response.status());
        }

        let reply: DataflowResponse = response
            .json()
            .context("Failed to parse dataflow status JSON response")?;
        Ok(reply.into_job()?.status)
    }

    /// Poll until the job completes, is aborted, or the batch timeout passes
    pub fn wait_for_completion(&self, job_id: &str) -> Result<()> {
        poll_until_complete(job_id, &self.config, || self.job_status(job_id))
    }

    /// Fetch the result document for the rows the service could geocode
    pub fn download_succeeded(&self, job_id: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/output/succeeded", self.job_url(job_id)))
            .query(&[("key", self.key.as_str())])
            .send()
            .context("Failed to download dataflow results")?;

        if !response.status().is_success() {
            bail!("Bing dataflow API returned error status: {}", response.status());
        }

        response
            .text()
            .context("Failed to read dataflow result body")
    }

    /// Run a whole batch: encode, submit, wait, download, decode.
    ///
    /// Returns one result per address in input order.
    pub fn geocode<F: BatchFormat>(
        &self,
        format: &F,
        addresses: &[String],
    ) -> Result<Vec<BatchForwardResult>> {
        let payload = format
            .generate_batch(addresses)
            .context("Failed to encode batch request")?;

        let job_id = self.submit(payload)?;
        self.wait_for_completion(&job_id)?;
        let body = self.download_succeeded(&job_id)?;

        let rows = format
            .adapt_results(&body)
            .context("Failed to decode batch results")?;
        Ok(ordered_results(rows, addresses.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_response() {
        let json = r#"{
            "authenticationResultCode": "ValidCredentials",
            "resourceSets": [{
                "estimatedTotal": 1,
                "resources": [{
                    "__type": "DataflowJob:http://schemas.microsoft.com/search/local/ws/rest/v1",
                    "id": "5bf10c37df944083b1879fbfa2ed0d22",
                    "createdDate": "2026-10-18T10:00:00.000",
                    "status": "Pending"
                }]
            }],
            "statusCode": 201
        }"#;

        let reply: DataflowResponse = serde_json::from_str(json).unwrap();
        let job = reply.into_job().unwrap();
        assert_eq!(job.id, "5bf10c37df944083b1879fbfa2ed0d22");
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn test_job_status_values() {
        assert_eq!(JobStatus::from("Completed".to_string()), JobStatus::Completed);
        assert_eq!(JobStatus::from("Aborted".to_string()), JobStatus::Aborted);
        assert_eq!(
            JobStatus::from("Queued".to_string()),
            JobStatus::Other("Queued".to_string())
        );
    }

    #[test]
    fn test_empty_resource_sets() {
        let reply: DataflowResponse = serde_json::from_str(r#"{"resourceSets": []}"#).unwrap();
        assert!(reply.into_job().is_err());
    }

    fn fast_config(timeout_secs: u64) -> DataflowConfig {
        DataflowConfig {
            poll_interval_secs: 0,
            timeout_secs,
            ..DataflowConfig::default()
        }
    }

    #[test]
    fn test_poll_completes_after_pending() {
        let mut replies = vec![
            JobStatus::Pending,
            JobStatus::Other("Queued".to_string()),
            JobStatus::Completed,
        ]
        .into_iter();
        let mut calls = 0;

        poll_until_complete("job", &fast_config(60), || {
            calls += 1;
            Ok(replies.next().unwrap())
        })
        .unwrap();
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_poll_aborted() {
        let mut replies = vec![JobStatus::Pending, JobStatus::Aborted].into_iter();

        let err = poll_until_complete("job", &fast_config(60), || Ok(replies.next().unwrap()))
            .unwrap_err();
        assert!(err.to_string().contains("aborted"));
    }

    #[test]
    fn test_poll_timeout() {
        let mut calls = 0;

        let err = poll_until_complete("job", &fast_config(0), || {
            calls += 1;
            Ok(JobStatus::Pending)
        })
        .unwrap_err();
        assert!(err.to_string().contains("did not complete within 0s"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_poll_status_error_propagates() {
        let err = poll_until_complete("job", &fast_config(60), || {
            anyhow::bail!("connection refused")
        })
        .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_job_url() {
        let config = DataflowConfig {
            url: "https://spatial.virtualearth.net/REST/v1/Dataflows/Geocode/".to_string(),
            ..DataflowConfig::default()
        };
        let client = DataflowClient::new("secret", config).unwrap();

        assert_eq!(
            client.job_url("abc"),
            "https://spatial.virtualearth.net/REST/v1/Dataflows/Geocode/abc"
        );
    }
}
