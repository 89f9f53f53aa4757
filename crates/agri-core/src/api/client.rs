// ============================================================================
// ApiClient - bearer auth, decoding, and 401 handling
// ============================================================================
// Every backend call goes through `send`. A 401 on a call that carried a
// token ends the session: both tokens are removed, the session store is
// cleared, and the navigator is sent to /login. Nothing is retried.
// ============================================================================

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::{ApiRequest, ApiResponse, HttpTransport, Method, MultipartForm, RequestBody};
use crate::access::{Navigator, LOGIN_PATH};
use crate::error::ApiError;
use crate::session::{SessionStore, TokenStore};

/// Typed client shared by every view
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            tokens,
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Send a request with the stored token attached
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.bearer = self
            .tokens
            .access_token()
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        let authenticated = request.bearer.is_some();
        let method = request.method;
        let path = request.path.clone();

        let response = self.transport.send(request).await?;

        if response.status == 401 && authenticated {
            warn!("{} {} returned 401, ending session", method.as_str(), path);
            self.expire_session().await;
            return Err(ApiError::Unauthorized);
        }

        if !response.is_success() {
            let err = ApiError::from_response(response.status, &response.body);
            debug!("{} {} failed: {}", method.as_str(), path, err);
            return Err(err);
        }

        Ok(response)
    }

    /// Drop tokens and session, then redirect to the login page
    async fn expire_session(&self) {
        if let Err(e) = self.tokens.clear_tokens() {
            warn!("Failed to clear stored tokens: {}", e);
        }
        self.session.clear().await;
        self.navigator.navigate(LOGIN_PATH);
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with_query(path, Vec::new()).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::new(Method::Get, path).with_query(query);
        decode(self.send(request).await?)
    }

    /// GET a collection; accepts a bare array or a paginated `results` page
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<T>, ApiError> {
        let page: ListPayload<T> = self.get_with_query(path, query).await?;
        Ok(page.into_vec())
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = ApiRequest::new(Method::Post, path).with_body(RequestBody::Json(to_json(body)?));
        decode(self.send(request).await?)
    }

    /// POST with no body (state-transition endpoints)
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode(self.send(ApiRequest::new(Method::Post, path)).await?)
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = ApiRequest::new(Method::Patch, path).with_body(RequestBody::Json(to_json(body)?));
        decode(self.send(request).await?)
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: MultipartForm) -> Result<T, ApiError> {
        let request = ApiRequest::new(Method::Post, path).with_body(RequestBody::Multipart(form));
        decode(self.send(request).await?)
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("Failed to encode request: {}", e)))
}

/// Decode a success body; an empty body reads as `{}`
fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<T, ApiError> {
    let text = if response.body.trim().is_empty() { "{}" } else { response.body.as_str() };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListPayload<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::Plain(items) => items,
            ListPayload::Paged { results } => results,
        }
    }
}
