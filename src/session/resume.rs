use crate::extract::extract_sesskey;
use crate::fetch::MoodleClient;
use crate::session::SessionCredential;
use crate::{FetchError, LoginError};

/// Validates a raw `MoodleSession` cookie value.
///
/// Loads the profile page with the cookie. A redirect means the cookie is
/// expired. Unlike credential login, the action key is required here.
///
/// # Returns
///
/// * `Ok(SessionCredential)` - Token plus the page's current action key
/// * `Err(LoginError::SessionExpired)` - The site redirected to its login page
/// * `Err(LoginError::ActionKeyMissing)` - The page carried no action key
pub async fn resume_session(
    client: &MoodleClient,
    session_token: &str,
) -> Result<SessionCredential, LoginError> {
    let probe = SessionCredential::new(session_token, None);

    let page = client.profile_page(&probe).await.map_err(|e| match e {
        FetchError::SessionExpired { .. } => LoginError::SessionExpired,
        other => LoginError::Fetch(other),
    })?;

    let action_key = extract_sesskey(&page).ok_or_else(|| {
        tracing::warn!("Session {} has no action key", probe.namespace());
        LoginError::ActionKeyMissing
    })?;

    tracing::info!("Resumed session {}", probe.namespace());
    Ok(SessionCredential::new(session_token, Some(action_key)))
}
