use axum::Json;
use tracing::instrument;

use crate::{api::models::pages::IdentityResponse, auth::current_user::CurrentIdentity};

/// The logged-in identity, or `401` for anonymous visitors
#[instrument(skip_all)]
pub async fn current_identity(CurrentIdentity(identity): CurrentIdentity) -> Json<IdentityResponse> {
    Json(identity.into())
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{auth::CredentialsForm, pages::IdentityResponse},
        test_utils::test_server,
    };
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_anonymous_visitor_is_unauthorized() {
        let server = test_server();

        let response = server.get("/api/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_text("Authentication required");
    }

    #[tokio::test]
    async fn test_logged_in_identity_is_returned() {
        let server = test_server();
        let response = server
            .post("/signup")
            .form(&CredentialsForm {
                email: "a@x.com".to_string(),
                password: "hunter2".to_string(),
            })
            .await;
        let cookie = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("passgate_session="))
            .and_then(|value| value.split(';').next())
            .expect("signup should set the session cookie")
            .to_string();

        let response = server.get("/api/me").add_header("cookie", &cookie).await;
        response.assert_status_ok();
        let identity: IdentityResponse = response.json();
        assert_eq!(identity.email, "a@x.com");
    }
}
