use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A user record as served by the remote API. The server owns identity and
/// timestamps; the client never fabricates or rewrites them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One page of the user collection plus the server-side total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub total: u64,
}

/// Write payload for create and update. Only produced by
/// [`crate::validate::validate_user_input`]; constructing one means the
/// fields already passed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("user not found")]
    NotFound,
    /// The server rejected the operation and explained why.
    #[error("{0}")]
    Rejected(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Blocking HTTP client for the user resource endpoints under `/api/v1`.
/// Lives on the worker thread; the UI thread never performs IO itself.
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub fn list_users(&self) -> ApiResult<UserList> {
        let resp = self
            .http
            .get(self.url("/users"))
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(read_failure(resp));
        }
        resp.json::<UserList>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn get_user(&self, id: &str) -> ApiResult<User> {
        let resp = self
            .http
            .get(self.url(&format!("/users/{id}")))
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(read_failure(resp));
        }
        resp.json::<User>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn create_user(&self, input: &UserInput) -> ApiResult<User> {
        let resp = self
            .http
            .post(self.url("/users"))
            .json(input)
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(read_failure(resp));
        }
        resp.json::<User>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn update_user(&self, id: &str, input: &UserInput) -> ApiResult<User> {
        let resp = self
            .http
            .put(self.url(&format!("/users/{id}")))
            .json(input)
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(read_failure(resp));
        }
        resp.json::<User>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn delete_user(&self, id: &str) -> ApiResult<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/users/{id}")))
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(read_failure(resp));
        }
        Ok(())
    }
}

/// Error payloads come back as `{"error": ...}` (or `{"message": ...}` from
/// the validation middleware). Fall back to the HTTP status line.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn read_failure(resp: reqwest::blocking::Response) -> ApiError {
    let status = resp.status();
    let msg = resp
        .json::<ErrorBody>()
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.is_empty());
    match msg {
        Some(m) => ApiError::Rejected(m),
        None => ApiError::Rejected(format!("server returned {status}")),
    }
}

/// A request dispatched from the UI loop to the API worker. Every variant
/// carries the app generation it was issued under; mutations also carry the
/// tracker sequence number so stale settlements can be discarded.
#[derive(Clone, Debug)]
pub enum ApiRequest {
    FetchList { generation: u64 },
    FetchUser { generation: u64, id: String },
    CreateUser { generation: u64, seq: u64, input: UserInput },
    UpdateUser { generation: u64, seq: u64, id: String, input: UserInput },
    DeleteUser { generation: u64, seq: u64, id: String },
}

/// Settlement of an [`ApiRequest`], delivered back to the UI loop. The
/// generation/sequence stamps are echoed verbatim.
#[derive(Clone, Debug)]
pub enum ApiResponse {
    List { generation: u64, result: ApiResult<UserList> },
    Detail { generation: u64, id: String, result: ApiResult<User> },
    Created { generation: u64, seq: u64, result: ApiResult<User> },
    Updated { generation: u64, seq: u64, id: String, result: ApiResult<User> },
    Deleted { generation: u64, seq: u64, id: String, result: ApiResult<()> },
}

/// Run the API worker until the request channel closes. Requests are served
/// strictly in dispatch order; the worker never touches app state, it only
/// echoes settlements back over the response channel.
pub fn spawn_worker(
    client: ApiClient,
    requests: Receiver<ApiRequest>,
    responses: Sender<ApiResponse>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("api worker started for {}", client.base_url);
        for req in requests {
            debug!(?req, "serving api request");
            let resp = match req {
                ApiRequest::FetchList { generation } => ApiResponse::List {
                    generation,
                    result: client.list_users(),
                },
                ApiRequest::FetchUser { generation, id } => {
                    let result = client.get_user(&id);
                    ApiResponse::Detail { generation, id, result }
                }
                ApiRequest::CreateUser { generation, seq, input } => ApiResponse::Created {
                    generation,
                    seq,
                    result: client.create_user(&input),
                },
                ApiRequest::UpdateUser { generation, seq, id, input } => {
                    let result = client.update_user(&id, &input);
                    ApiResponse::Updated { generation, seq, id, result }
                }
                ApiRequest::DeleteUser { generation, seq, id } => {
                    let result = client.delete_user(&id);
                    ApiResponse::Deleted { generation, seq, id, result }
                }
            };
            if responses.send(resp).is_err() {
                // UI side is gone; nothing left to settle against.
                warn!("response channel closed, stopping api worker");
                break;
            }
        }
        info!("api worker stopped");
    })
}
