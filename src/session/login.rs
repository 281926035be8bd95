//! Credential login against the SAML identity provider
//!
//! The flow is strictly linear:
//!
//! 1. **Init**: GET the SAML initiation URL without following redirects; it
//!    must answer with a redirect to the identity provider.
//! 2. **IdpForm**: GET the identity provider page and locate its login form.
//! 3. **Submit**: POST the username and password to that form.
//! 4. **SamlRelay**: relay the SAML assertion from the response back to Moodle.
//! 5. **Finalize**: GET the Moodle home page and read the session cookie and
//!    action key.
//!
//! One [`LoginFlow`] owns one cookie jar and is consumed by [`LoginFlow::run`],
//! so jars are never shared between attempts. Nothing is retried.

use crate::config::{HttpConfig, MoodleConfig};
use crate::extract::extract_sesskey;
use crate::session::SessionCredential;
use crate::LoginError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect::Policy, Client};
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Redirect hops followed inside the identity provider
const MAX_REDIRECTS: usize = 10;

/// Steps of the credential login, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Init,
    IdpForm,
    Submit,
    SamlRelay,
    Finalize,
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::IdpForm => "idp-form",
            Self::Submit => "submit",
            Self::SamlRelay => "saml-relay",
            Self::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// The identity provider's login form
#[derive(Debug)]
struct IdpForm {
    /// Page the form was served from, sent as `Referer`
    page_url: Url,
    action: Url,
}

/// SAML assertion to hand back to Moodle
#[derive(Debug)]
struct SamlAssertion {
    action: Url,
    saml_response: String,
    relay_state: String,
    /// Origin of the identity provider page that produced the assertion
    idp_origin: String,
}

/// A single credential login attempt
pub struct LoginFlow {
    moodle: MoodleConfig,
    base: Url,
    jar: Arc<Jar>,
    /// Redirects disabled, for the init step
    direct: Client,
    /// Follows redirects within the identity provider
    following: Client,
}

impl LoginFlow {
    /// Creates a login attempt with a fresh cookie jar
    ///
    /// # Arguments
    ///
    /// * `moodle` - Site and identity provider settings
    /// * `http` - Timeouts applied to every step
    pub fn new(moodle: &MoodleConfig, http: &HttpConfig) -> Result<Self, LoginError> {
        let base = Url::parse(&moodle.base_url)
            .map_err(|e| LoginError::InvalidUrl(format!("{}: {}", moodle.base_url, e)))?;
        let jar = Arc::new(Jar::default());

        let build = |policy: Policy| {
            Client::builder()
                .user_agent(moodle.user_agent.as_str())
                .default_headers(browser_headers())
                .cookie_provider(Arc::clone(&jar))
                .timeout(http.timeout())
                .connect_timeout(http.connect_timeout())
                .redirect(policy)
                .gzip(true)
                .brotli(true)
                .build()
        };

        Ok(Self {
            direct: build(Policy::none())?,
            following: build(Policy::limited(MAX_REDIRECTS))?,
            moodle: moodle.clone(),
            base,
            jar,
        })
    }

    /// Runs every step in order and returns the established session
    pub async fn run(self, username: &str, password: &str) -> Result<SessionCredential, LoginError> {
        let idp_url = self.init().await?;
        let form = self.idp_form(idp_url).await?;
        let assertion = self.submit(&form, username, password).await?;
        self.relay(assertion).await?;
        self.finalize().await
    }

    fn site_url(&self, path: &str) -> Result<Url, LoginError> {
        self.base
            .join(path)
            .map_err(|e| LoginError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn init(&self) -> Result<Url, LoginError> {
        let url = self.site_url(&self.moodle.login_path)?;
        tracing::debug!("[{}] GET {}", LoginStep::Init, url.path());

        let response = self.direct.get(url.clone()).send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok());

        match location {
            Some(location) if status.is_redirection() => {
                let idp_url = url
                    .join(location)
                    .map_err(|e| LoginError::InvalidUrl(format!("{}: {}", location, e)))?;
                tracing::debug!(
                    "[{}] Redirected to {}",
                    LoginStep::Init,
                    idp_url.host_str().unwrap_or("")
                );
                Ok(idp_url)
            }
            _ => {
                tracing::warn!("[{}] Expected a redirect, got {}", LoginStep::Init, status);
                Err(LoginError::InitFailed {
                    status: status.as_u16(),
                })
            }
        }
    }

    async fn idp_form(&self, idp_url: Url) -> Result<IdpForm, LoginError> {
        tracing::debug!("[{}] GET identity provider page", LoginStep::IdpForm);
        let response = self.following.get(idp_url).send().await?;
        let page_url = response.url().clone();
        let body = response.text().await?;

        let action = find_login_form(&body, &page_url)?;
        Ok(IdpForm { page_url, action })
    }

    async fn submit(
        &self,
        form: &IdpForm,
        username: &str,
        password: &str,
    ) -> Result<SamlAssertion, LoginError> {
        let qualified = format!("{}{}", self.moodle.username_prefix, username);
        let fields = [
            ("_UserName", username),
            ("Password", password),
            ("AuthMethod", "FormsAuthentication"),
            ("UserName", qualified.as_str()),
        ];

        tracing::debug!("[{}] POST credentials", LoginStep::Submit);
        let response = self
            .following
            .post(form.action.clone())
            .header(header::REFERER, form.page_url.as_str())
            .form(&fields)
            .send()
            .await?;
        let response_url = response.url().clone();
        let body = response.text().await?;

        find_saml_assertion(&body, &response_url)
    }

    async fn relay(&self, assertion: SamlAssertion) -> Result<(), LoginError> {
        let fields = [
            ("SAMLResponse", assertion.saml_response.as_str()),
            ("RelayState", assertion.relay_state.as_str()),
        ];

        tracing::debug!("[{}] POST assertion to {}", LoginStep::SamlRelay, assertion.action.path());
        let response = self
            .following
            .post(assertion.action)
            .header(header::ORIGIN, assertion.idp_origin.as_str())
            .header(header::REFERER, format!("{}/", assertion.idp_origin))
            .form(&fields)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::debug!("[{}] Relay answered {}", LoginStep::SamlRelay, status);
            return Err(LoginError::RelayRejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn finalize(&self) -> Result<SessionCredential, LoginError> {
        let url = self.site_url(&self.moodle.home_path)?;
        tracing::debug!("[{}] GET {}", LoginStep::Finalize, url.path());
        let body = self.following.get(url).send().await?.text().await?;

        let session_token = self
            .session_cookie()
            .ok_or(LoginError::SessionCookieMissing)?;
        let action_key = extract_sesskey(&body);
        if action_key.is_none() {
            tracing::debug!("[{}] Home page has no action key", LoginStep::Finalize);
        }

        let credential = SessionCredential::new(session_token, action_key);
        tracing::info!("Login succeeded for session {}", credential.namespace());
        Ok(credential)
    }

    /// Reads the session cookie for the Moodle site from the jar
    fn session_cookie(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.moodle.session_cookie && !value.is_empty()).then(|| value.to_string())
        })
    }
}

/// Signs in with a username and password
///
/// # Returns
///
/// * `Ok(SessionCredential)` - The session cookie and, when the home page
///   carried one, the action key
/// * `Err(LoginError)` - The step that failed
pub async fn login_with_credentials(
    moodle: &MoodleConfig,
    http: &HttpConfig,
    username: &str,
    password: &str,
) -> Result<SessionCredential, LoginError> {
    let result = LoginFlow::new(moodle, http)?.run(username, password).await;
    if let Err(e) = &result {
        tracing::warn!("Credential login failed: {}", e);
    }
    result
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}

fn parse_selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn resolve_action(action: Option<&str>, page_url: &Url) -> Result<Url, LoginError> {
    match action.map(str::trim).filter(|a| !a.is_empty()) {
        Some(action) => page_url
            .join(action)
            .map_err(|e| LoginError::InvalidUrl(format!("{}: {}", action, e))),
        None => Ok(page_url.clone()),
    }
}

/// Absolute action URL of the first form on the identity provider page
fn find_login_form(html: &str, page_url: &Url) -> Result<Url, LoginError> {
    let document = Html::parse_document(html);
    let form = parse_selector("form")
        .and_then(|sel| document.select(&sel).next())
        .ok_or(LoginError::FormNotFound)?;
    resolve_action(form.value().attr("action"), page_url)
}

fn hidden_value(form: ElementRef<'_>, name: &'static str) -> Result<String, LoginError> {
    let css = format!(r#"input[name="{}"]"#, name);
    parse_selector(&css)
        .and_then(|sel| form.select(&sel).next())
        .and_then(|input| input.value().attr("value"))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(LoginError::MissingSamlData { field: name })
}

/// Reads the SAML relay form from the credential POST response.
///
/// A response without a form holding a `SAMLResponse` input means the
/// identity provider rejected the credentials.
fn find_saml_assertion(html: &str, response_url: &Url) -> Result<SamlAssertion, LoginError> {
    let document = Html::parse_document(html);
    let input = parse_selector(r#"input[name="SAMLResponse"]"#)
        .and_then(|sel| document.select(&sel).next())
        .ok_or(LoginError::InvalidCredentials)?;

    let form = input
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form")
        .ok_or(LoginError::InvalidCredentials)?;

    let saml_response = hidden_value(form, "SAMLResponse")?;
    let relay_state = hidden_value(form, "RelayState")?;
    let action = form
        .value()
        .attr("action")
        .filter(|a| !a.trim().is_empty())
        .ok_or(LoginError::MissingSamlData { field: "action" })?;

    Ok(SamlAssertion {
        action: resolve_action(Some(action), response_url)?,
        saml_response,
        relay_state,
        idp_origin: response_url.origin().ascii_serialization(),
    })
}
