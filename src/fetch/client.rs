use crate::config::{HttpConfig, MoodleConfig};
use crate::session::SessionCredential;
use crate::FetchError;
use reqwest::{header, redirect::Policy, Client, Response};
use serde::Serialize;
use url::Url;

/// Builds the HTTP client used for authenticated requests
///
/// Redirects are never followed: Moodle answers an expired session with a
/// redirect to its login page, and that redirect is the signal.
///
/// # Arguments
///
/// * `moodle` - Supplies the user agent
/// * `http` - Request and connect timeouts
pub fn build_http_client(moodle: &MoodleConfig, http: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(moodle.user_agent.as_str())
        .timeout(http.timeout())
        .connect_timeout(http.connect_timeout())
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Stateless client for one Moodle site
///
/// Holds no session of its own; every call takes the credential to act for,
/// so one instance serves any number of sessions concurrently.
#[derive(Debug, Clone)]
pub struct MoodleClient {
    http: Client,
    base: Url,
    cookie_name: String,
}

impl MoodleClient {
    pub fn new(moodle: &MoodleConfig, http: &HttpConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&moodle.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", moodle.base_url, e)))?;
        Ok(Self {
            http: build_http_client(moodle, http)?,
            base,
            cookie_name: moodle.session_cookie.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolves a site path such as `/user/profile.php`
    pub fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Site path with an `id` query parameter
    pub(crate) fn url_with_id(&self, path: &str, id: &str) -> Result<Url, FetchError> {
        let mut url = self.url(path)?;
        url.query_pairs_mut().append_pair("id", id);
        Ok(url)
    }

    /// GETs a page and returns its body
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The body, unread by this layer
    /// * `Err(FetchError::SessionExpired)` - The site answered with any 3xx
    /// * `Err(FetchError)` - Status, timeout or network failure
    pub async fn get(&self, credential: &SessionCredential, url: Url) -> Result<String, FetchError> {
        tracing::debug!("GET {} for session {}", url.path(), credential.namespace());
        let response = self
            .http
            .get(url.clone())
            .header(header::COOKIE, credential.cookie_header(&self.cookie_name))
            .send()
            .await
            .map_err(|e| log_transport(&url, e))?;
        read_body(&url, response).await
    }

    /// GETs a site path
    pub async fn get_page(
        &self,
        credential: &SessionCredential,
        path: &str,
    ) -> Result<String, FetchError> {
        let url = self.url(path)?;
        self.get(credential, url).await
    }

    /// POSTs a JSON body and returns the raw response body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        credential: &SessionCredential,
        url: Url,
        body: &T,
    ) -> Result<String, FetchError> {
        tracing::debug!("POST {} for session {}", url.path(), credential.namespace());
        let response = self
            .http
            .post(url.clone())
            .header(header::COOKIE, credential.cookie_header(&self.cookie_name))
            .json(body)
            .send()
            .await
            .map_err(|e| log_transport(&url, e))?;
        read_body(&url, response).await
    }
}

fn log_transport(url: &Url, e: reqwest::Error) -> FetchError {
    let error = FetchError::from(e);
    tracing::warn!("Request to {} failed: {}", url.path(), error);
    error
}

/// Classifies a response: 3xx is an expired session, 4xx and 5xx are
/// status errors, anything else passes its body through
async fn read_body(url: &Url, response: Response) -> Result<String, FetchError> {
    let status = response.status();

    if status.is_redirection() {
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        tracing::info!("Session expired: {} redirected ({})", url.path(), status);
        return Err(FetchError::SessionExpired { location });
    }

    if status.is_client_error() || status.is_server_error() {
        tracing::warn!("{} answered {}", url.path(), status);
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    tracing::trace!("{} returned {} bytes", url.path(), body.len());
    Ok(body)
}
