use eyre::bail;
use jiff::{SignedDuration, Timestamp};
use ncp_auth::client::Cognito;
use ncp_auth::flows::{self, Session, SignUpRequest};
use tracing::{info, warn};

use crate::config::{CognitoSettings, NcpConfig, StoredSession};

pub fn stored_session(email: &str, session: &Session, now: Timestamp) -> StoredSession {
    let lifetime = SignedDuration::from_secs(i64::from(session.expires_in.max(0)));
    StoredSession {
        email: email.to_string(),
        id_token: session.id_token.clone(),
        access_token: session.access_token.clone(),
        refresh_token: session.refresh_token.clone(),
        expires_at: now.checked_add(lifetime).unwrap_or(now),
    }
}

/// Cognito's default pool policy minimum.
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn check_password(password: &str) -> eyre::Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }
    Ok(())
}

/// Sign-up details, checked before they are sent. Blank names are dropped.
pub fn sign_up_request(
    email: &str,
    password: &str,
    first_name: Option<String>,
    last_name: Option<String>,
) -> eyre::Result<SignUpRequest> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => {}
        _ => bail!("\"{email}\" is not a valid email address"),
    }
    check_password(password)?;

    let clean = |name: Option<String>| {
        name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
    };
    Ok(SignUpRequest {
        email: email.to_string(),
        password: password.to_string(),
        first_name: clean(first_name),
        last_name: clean(last_name),
    })
}

pub async fn connect(settings: &CognitoSettings) -> Cognito {
    Cognito::connect(Some(settings.region.as_str()), &settings.user_pool_id, &settings.client_id).await
}

/// Bearer token for the next request, refreshing an expired session when
/// Cognito is configured. Returns `(token, changed)`; `changed` means the
/// config must be saved.
pub async fn current_token(config: &mut NcpConfig) -> (Option<String>, bool) {
    let now = Timestamp::now();
    let Some(stored) = config.session.clone() else {
        return (None, false);
    };
    if !stored.is_expired(now) {
        return (Some(stored.id_token), false);
    }

    let Some(settings) = config.cognito.clone() else {
        warn!("session expired and no Cognito settings to refresh it; run `ncp login`");
        config.session = None;
        return (None, true);
    };

    let cognito = connect(&settings).await;
    match flows::refresh(&cognito, &stored.refresh_token).await {
        Ok(session) => {
            info!(email = %stored.email, "session refreshed");
            let refreshed = stored_session(&stored.email, &session, now);
            let token = refreshed.id_token.clone();
            config.session = Some(refreshed);
            (Some(token), true)
        }
        Err(e) => {
            warn!(error = %e, "session refresh failed; run `ncp login`");
            config.session = None;
            (None, true)
        }
    }
}
