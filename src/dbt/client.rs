//! dbt Cloud API client

use super::types::{Account, Job, Model, Project};
use crate::auth::AuthConfig;
use crate::config::DbtConfig;
use crate::decode::{graphql_request, GraphQlDecoder, JsonDecoder, RecordDecoder};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::types::{AccountId, EnvironmentId, JobId};
use reqwest::Method;
use std::time::Duration;
use tracing::{error, info};

/// Deadline for the Discovery query, which can be slow for large jobs
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3600);

/// Client for the dbt Cloud Admin and Discovery APIs
#[derive(Debug)]
pub struct DbtClient {
    http: HttpClient,
    metadata_api_url: String,
    discovery_timeout: Duration,
}

impl DbtClient {
    /// Create a client from configuration
    pub fn new(config: &DbtConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .base_url(config.api_base_url.clone())
            .header("Accept", "application/json")
            .build();

        Ok(Self {
            http: HttpClient::with_auth(http_config, AuthConfig::dbt_token(&config.api_token))?,
            metadata_api_url: config.metadata_api_url.clone(),
            discovery_timeout: DISCOVERY_TIMEOUT,
        })
    }

    /// Override the Discovery query deadline
    #[must_use]
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Identifier of the first account visible to the token
    pub async fn get_account_id(&self) -> Result<AccountId> {
        let accounts: Vec<Account> = self
            .list("/", "accounts")
            .await
            .map_err(|e| match e {
                Error::HttpStatus { status, body } => {
                    Error::auth(format!("dbt Cloud rejected the API token ({status}): {body}"))
                }
                e if e.is_parse() => Error::auth(format!("Malformed accounts response: {e}")),
                e => e,
            })
            .inspect_err(|e| error!("Error getting dbt Cloud account id: {e}"))?;

        let account = accounts
            .first()
            .ok_or_else(|| Error::auth("API token has no accessible dbt Cloud account"))
            .inspect_err(|e| error!("{e}"))?;

        info!("Using dbt Cloud account id: {}", account.id);
        Ok(account.id)
    }

    /// Projects of an account
    pub async fn get_projects(&self, account_id: AccountId) -> Result<Vec<Project>> {
        let projects: Vec<Project> = self
            .list(&format!("/{account_id}/projects/"), "projects")
            .await?;
        info!("Retrieved {} dbt Cloud projects", projects.len());
        Ok(projects)
    }

    /// Jobs of an account, optionally restricted to a set of environments
    pub async fn get_jobs(
        &self,
        account_id: AccountId,
        environment_ids: Option<&[EnvironmentId]>,
    ) -> Result<Vec<Job>> {
        let jobs: Vec<Job> = self.list(&format!("/{account_id}/jobs/"), "jobs").await?;
        let total = jobs.len();
        let jobs = filter_jobs_by_environment(jobs, environment_ids);

        info!("Retrieved {} dbt Cloud jobs ({total} before environment filter)", jobs.len());
        Ok(jobs)
    }

    /// Model metadata of the latest run of `job_id`
    pub async fn get_models_for_job(&self, job_id: JobId) -> Result<Vec<Model>> {
        info!("Getting dbt models for job id: {job_id}");

        let config = RequestConfig::new()
            .header("Content-Type", "application/json")
            .json(graphql_request(&models_query(job_id), None))
            .timeout(self.discovery_timeout);

        let body = self
            .http
            .send_text(Method::POST, &self.metadata_api_url, config)
            .await
            .inspect_err(|e| error!("Error querying the dbt Discovery API: {e}"))?;

        let models: Vec<Model> = GraphQlDecoder::with_path("data.models")
            .decode_as(&body)
            .inspect_err(|e| error!("Invalid response from the dbt Discovery API: {e}"))?;

        info!("Retrieved {} dbt models for job id: {job_id}", models.len());
        Ok(models)
    }

    /// GET a list endpoint and decode its `data` array
    async fn list<T: serde::de::DeserializeOwned>(&self, path: &str, what: &str) -> Result<Vec<T>> {
        let body = self
            .http
            .send_text(Method::GET, path, RequestConfig::new())
            .await
            .inspect_err(|e| error!("Error listing dbt Cloud {what}: {e}"))?;

        JsonDecoder::with_path("data")
            .decode_as(&body)
            .inspect_err(|e| error!("Invalid dbt Cloud {what} response: {e}"))
    }
}

/// Keep jobs whose environment is in `environment_ids` (all jobs when `None`)
fn filter_jobs_by_environment(jobs: Vec<Job>, environment_ids: Option<&[EnvironmentId]>) -> Vec<Job> {
    match environment_ids {
        Some(ids) => jobs
            .into_iter()
            .filter(|job| job.environment_id.is_some_and(|env| ids.contains(&env)))
            .collect(),
        None => jobs,
    }
}

/// Discovery API query returning every model of a job's latest run
pub fn models_query(job_id: JobId) -> String {
    format!(
        r"query {{
    models(jobId: {job_id}) {{
        uniqueId
        packageName
        runId
        accountId
        projectId
        environmentId
        jobId
        executionTime
        status
        executeCompletedAt
        database
        schema
        name
        alias
        description
        meta
        stats {{
            id
            value
        }}
        columns {{
            name
            description
        }}
    }}
}}"
    )
}

#[cfg(test)]
mod filter_tests {
    use super::*;

    fn job(id: JobId, env: Option<EnvironmentId>) -> Job {
        Job {
            id,
            name: None,
            environment_id: env,
            project_id: None,
        }
    }

    #[test]
    fn test_filter_jobs_by_environment() {
        let jobs = vec![job(1, Some(10)), job(2, Some(20)), job(3, None)];

        let kept = filter_jobs_by_environment(jobs.clone(), Some(&[20]));
        assert_eq!(kept, vec![job(2, Some(20))]);

        let all = filter_jobs_by_environment(jobs.clone(), None);
        assert_eq!(all.len(), 3);

        assert!(filter_jobs_by_environment(jobs, Some(&[])).is_empty());
    }
}
