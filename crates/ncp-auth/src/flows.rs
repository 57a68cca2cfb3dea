use std::collections::HashMap;

use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::Cognito;
use crate::error::AuthError;
use crate::users::attribute_map;

/// Tokens issued by a successful sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i32,
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

fn cognito_err<E: std::fmt::Display>(e: E) -> AuthError {
    AuthError::Cognito(e.to_string())
}

fn attribute(name: &str, value: &str) -> Result<AttributeType, AuthError> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(cognito_err)
}

/// Email/password sign-in.
pub async fn sign_in(cognito: &Cognito, email: &str, password: &str) -> Result<Session, AuthError> {
    info!(email, "signing in");

    let mut params = HashMap::new();
    params.insert("USERNAME".to_string(), email.to_string());
    params.insert("PASSWORD".to_string(), password.to_string());

    let resp = cognito
        .client
        .initiate_auth()
        .auth_flow(AuthFlowType::UserPasswordAuth)
        .client_id(&cognito.client_id)
        .set_auth_parameters(Some(params))
        .send()
        .await
        .map_err(|e| AuthError::AuthFailed(e.into_service_error().to_string()))?;

    if let Some(result) = resp.authentication_result() {
        return Ok(Session {
            access_token: result.access_token().unwrap_or_default().to_string(),
            id_token: result.id_token().unwrap_or_default().to_string(),
            refresh_token: result.refresh_token().unwrap_or_default().to_string(),
            expires_in: result.expires_in(),
        });
    }

    match resp.challenge_name() {
        Some(challenge) => Err(AuthError::ChallengeRequired {
            challenge: challenge.as_str().to_string(),
            session: resp.session().unwrap_or_default().to_string(),
        }),
        None => Err(AuthError::AuthFailed("unexpected response".to_string())),
    }
}

/// Exchange a refresh token for fresh access and id tokens. Cognito does
/// not rotate the refresh token, so the one passed in is kept.
pub async fn refresh(cognito: &Cognito, refresh_token: &str) -> Result<Session, AuthError> {
    let mut params = HashMap::new();
    params.insert("REFRESH_TOKEN".to_string(), refresh_token.to_string());

    let resp = cognito
        .client
        .initiate_auth()
        .auth_flow(AuthFlowType::RefreshTokenAuth)
        .client_id(&cognito.client_id)
        .set_auth_parameters(Some(params))
        .send()
        .await
        .map_err(|e| AuthError::AuthFailed(e.into_service_error().to_string()))?;

    let result = resp
        .authentication_result()
        .ok_or_else(|| AuthError::AuthFailed("refresh failed".to_string()))?;

    Ok(Session {
        access_token: result.access_token().unwrap_or_default().to_string(),
        id_token: result.id_token().unwrap_or_default().to_string(),
        refresh_token: result.refresh_token().unwrap_or(refresh_token).to_string(),
        expires_in: result.expires_in(),
    })
}

/// Register a new account. The user must confirm with the emailed code.
pub async fn sign_up(cognito: &Cognito, request: &SignUpRequest) -> Result<(), AuthError> {
    info!(email = %request.email, "signing up");

    let mut builder = cognito
        .client
        .sign_up()
        .client_id(&cognito.client_id)
        .username(&request.email)
        .password(&request.password)
        .user_attributes(attribute("email", &request.email)?);
    if let Some(first) = request.first_name.as_deref().filter(|s| !s.trim().is_empty()) {
        builder = builder.user_attributes(attribute("given_name", first.trim())?);
    }
    if let Some(last) = request.last_name.as_deref().filter(|s| !s.trim().is_empty()) {
        builder = builder.user_attributes(attribute("family_name", last.trim())?);
    }

    builder
        .send()
        .await
        .map_err(|e| cognito_err(e.into_service_error()))?;
    Ok(())
}

pub async fn confirm_sign_up(cognito: &Cognito, email: &str, code: &str) -> Result<(), AuthError> {
    cognito
        .client
        .confirm_sign_up()
        .client_id(&cognito.client_id)
        .username(email)
        .confirmation_code(code)
        .send()
        .await
        .map_err(|e| cognito_err(e.into_service_error()))?;
    Ok(())
}

/// Start a password reset; Cognito emails a code.
pub async fn forgot_password(cognito: &Cognito, email: &str) -> Result<(), AuthError> {
    info!(email, "password reset requested");
    cognito
        .client
        .forgot_password()
        .client_id(&cognito.client_id)
        .username(email)
        .send()
        .await
        .map_err(|e| cognito_err(e.into_service_error()))?;
    Ok(())
}

pub async fn confirm_forgot_password(
    cognito: &Cognito,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    cognito
        .client
        .confirm_forgot_password()
        .client_id(&cognito.client_id)
        .username(email)
        .confirmation_code(code)
        .password(new_password)
        .send()
        .await
        .map_err(|e| cognito_err(e.into_service_error()))?;
    Ok(())
}

/// The profile behind an access token.
pub async fn get_user(cognito: &Cognito, access_token: &str) -> Result<Profile, AuthError> {
    let resp = cognito
        .client
        .get_user()
        .access_token(access_token)
        .send()
        .await
        .map_err(|e| AuthError::InvalidToken(e.into_service_error().to_string()))?;

    let attributes = attribute_map(resp.user_attributes());
    Ok(Profile {
        username: resp.username().to_string(),
        email: attributes.get("email").cloned(),
        first_name: attributes.get("given_name").cloned(),
        last_name: attributes.get("family_name").cloned(),
        attributes,
    })
}

/// Revoke every token issued to the user.
pub async fn sign_out(cognito: &Cognito, access_token: &str) -> Result<(), AuthError> {
    cognito
        .client
        .global_sign_out()
        .access_token(access_token)
        .send()
        .await
        .map_err(|e| cognito_err(e.into_service_error()))?;
    Ok(())
}
