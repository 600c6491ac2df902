//! OneView Client
//!
//! Main client for the appliance, combining the login session, the HTTP
//! transport and the task poller.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::auth::{self, Credentials, Session};
use super::http::{api_status, ApiResponse, ApplianceHttp, HttpSettings, RequestOptions};
use crate::activity::{self, PollPolicy, ProgressSink, Task, TaskSource};
use crate::WaitMode;

/// What a mutating call handed back before any waiting
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    /// The task the appliance created, if the call was asynchronous
    pub task: Option<Task>,
    /// Response body, `Value::Null` when empty
    pub body: Value,
}

/// What a facade returns for a mutating call
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Submitted task when not waiting, terminal task after waiting
    pub task: Option<Task>,
    /// Current body of the created or modified resource
    pub resource: Option<Value>,
}

/// Whether a finished task should be followed to the resource it touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Follow {
    /// Re-fetch `associatedResource.resourceUri`
    Resource,
    /// The resource is gone (deletions) or not interesting
    Nothing,
}

/// Main OneView client
#[derive(Clone)]
pub struct OneViewClient {
    pub http: ApplianceHttp,
    pub session: Session,
    pub poll_policy: PollPolicy,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl OneViewClient {
    /// Create a client that logs in with `credentials` on first use
    pub fn new(settings: &HttpSettings, credentials: Credentials) -> Result<Self> {
        Self::with_session(settings, Session::with_credentials(credentials))
    }

    pub fn with_session(settings: &HttpSettings, session: Session) -> Result<Self> {
        let http = ApplianceHttp::new(settings).context("Failed to initialize HTTP client")?;
        Ok(Self {
            http,
            session,
            poll_policy: PollPolicy::default(),
            progress: None,
        })
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Report every task poll to `sink`
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Log in now instead of on the first request
    pub async fn login(&self) -> Result<()> {
        self.session
            .get_session_id(&self.http)
            .await?
            .context("No credentials to log in with")?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.logout(&self.http).await
    }

    /// Whether the appliance is waiting for its EULA to be accepted
    pub async fn get_eula_status(&self) -> Result<bool> {
        auth::get_eula_status(&self.http).await
    }

    pub async fn accept_eula(&self, support_access: bool) -> Result<Value> {
        auth::accept_eula(&self.http, support_access).await
    }

    /// Check the EULA and accept it if the appliance asks for it
    pub async fn ensure_eula_accepted(&self) -> Result<()> {
        if self.get_eula_status().await? {
            tracing::info!("EULA display needed, accepting without support access");
            self.accept_eula(false).await?;
        }
        Ok(())
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        let session = self.session.get_session_id(&self.http).await?;
        let first = self
            .dispatch(method.clone(), path, session.as_deref(), body, options)
            .await;

        match first {
            Err(e) if api_status(&e) == Some(StatusCode::UNAUTHORIZED) && self.session.can_login() => {
                tracing::debug!("Session rejected, logging in again");
                let session = self.session.refresh(&self.http).await?;
                self.dispatch(method, path, session.as_deref(), body, options)
                    .await
            }
            other => other,
        }
    }

    async fn dispatch(
        &self,
        method: reqwest::Method,
        path: &str,
        session: Option<&str>,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        match method {
            reqwest::Method::GET => self.http.get(path, session, options).await,
            reqwest::Method::POST => self.http.post(path, session, body, options).await,
            reqwest::Method::PUT => self.http.put(path, session, body, options).await,
            reqwest::Method::DELETE => self.http.delete(path, session, options).await,
            other => Err(anyhow::anyhow!("Unsupported method: {}", other)),
        }
    }

    /// GET an appliance path
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.get_with(path, &RequestOptions::new()).await
    }

    pub async fn get_with(&self, path: &str, options: &RequestOptions) -> Result<Value> {
        let response = self.send(reqwest::Method::GET, path, None, options).await?;
        Ok(response.body)
    }

    /// POST a request record
    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Submitted> {
        let body = serde_json::to_value(body).context("Failed to serialize request body")?;
        let response = self
            .send(reqwest::Method::POST, path, Some(&body), options)
            .await?;
        self.submitted(response).await
    }

    /// PUT a resource body
    pub async fn put<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Submitted> {
        let body = serde_json::to_value(body).context("Failed to serialize request body")?;
        let response = self
            .send(reqwest::Method::PUT, path, Some(&body), options)
            .await?;
        self.submitted(response).await
    }

    /// DELETE an appliance path
    pub async fn delete(&self, path: &str, options: &RequestOptions) -> Result<Submitted> {
        let response = self
            .send(reqwest::Method::DELETE, path, None, options)
            .await?;
        self.submitted(response).await
    }

    /// Find the task behind a mutating response
    ///
    /// A `202 Accepted` points at its task through `Location`; some calls
    /// answer with the task body itself.
    async fn submitted(&self, response: ApiResponse) -> Result<Submitted> {
        if response.status == StatusCode::ACCEPTED {
            if let Some(location) = response.location.as_deref() {
                let task = self.fetch_task(location).await?;
                return Ok(Submitted {
                    task: Some(task),
                    body: response.body,
                });
            }
        }

        if Task::is_task_body(&response.body) {
            let task = Task::from_value(response.body.clone()).context("Failed to parse task")?;
            return Ok(Submitted {
                task: Some(task),
                body: response.body,
            });
        }

        Ok(Submitted {
            task: None,
            body: response.body,
        })
    }

    /// Wait for a task with the client's poll policy
    pub async fn wait_for_task(&self, task: &Task) -> Result<Task> {
        self.wait_for_task_with(task, &self.poll_policy).await
    }

    pub async fn wait_for_task_with(&self, task: &Task, policy: &PollPolicy) -> Result<Task> {
        let task = activity::await_task(self, task, policy, self.progress.as_deref()).await?;
        Ok(task)
    }

    /// Fetch the resource a task created or modified
    pub async fn get_task_associated_resource(&self, task: &Task) -> Result<Option<Value>> {
        match task.resource_uri() {
            Some(uri) => Ok(Some(self.get(uri).await?)),
            None => Ok(None),
        }
    }

    /// Finish a mutating call according to `wait`
    pub async fn complete(
        &self,
        submitted: Submitted,
        wait: WaitMode,
        follow: Follow,
    ) -> Result<Outcome> {
        let body = if submitted.body.is_null() || Task::is_task_body(&submitted.body) {
            None
        } else {
            Some(submitted.body)
        };

        let Some(task) = submitted.task else {
            return Ok(Outcome {
                task: None,
                resource: body,
            });
        };

        if wait == WaitMode::Background {
            return Ok(Outcome {
                task: Some(task),
                resource: body,
            });
        }

        let task = self.wait_for_task(&task).await?;
        let resource = match follow {
            Follow::Resource => match self.get_task_associated_resource(&task).await? {
                Some(resource) => Some(resource),
                None => body,
            },
            Follow::Nothing => None,
        };

        Ok(Outcome {
            task: Some(task),
            resource,
        })
    }
}

impl TaskSource for OneViewClient {
    async fn fetch_task(&self, uri: &str) -> Result<Task> {
        let body = self.get(uri).await?;
        Task::from_value(body).with_context(|| format!("Failed to parse task {}", uri))
    }
}
