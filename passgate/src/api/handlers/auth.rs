use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::auth::CredentialsForm,
    auth::{
        context::RequestContext,
        flash,
        strategies::{LOGIN, SIGNUP},
        strategy::Outcome,
    },
    errors::Error,
};

/// Run the named strategy and redirect according to its outcome.
///
/// Accepted identities are logged in. Rejections are flashed under `error`; failures propagate
/// to the top-level error response.
async fn authenticate(
    state: &AppState,
    context: &RequestContext,
    strategy: &str,
    form: CredentialsForm,
    success: (&str, &str),
    failure: &str,
) -> Result<Redirect, Error> {
    let (success_path, success_message) = success;
    match state.strategies.invoke(strategy, form.into()).await {
        Outcome::Accepted(identity) => {
            context.log_in(identity).await?;
            context.flash().set(flash::SUCCESS, success_message).await?;
            Ok(Redirect::to(success_path))
        }
        Outcome::Rejected(rejection) => {
            context.flash().set(flash::ERROR, rejection.to_string()).await?;
            Ok(Redirect::to(failure))
        }
        Outcome::Failed(error) => Err(error),
    }
}

#[instrument(skip_all, fields(email = %form.email))]
pub async fn signup(
    State(state): State<AppState>,
    context: RequestContext,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, Error> {
    let redirects = &state.config.auth.redirects;
    authenticate(
        &state,
        &context,
        SIGNUP,
        form,
        (&redirects.signup_success, "account created"),
        &redirects.signup_failure,
    )
    .await
}

#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    context: RequestContext,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, Error> {
    let redirects = &state.config.auth.redirects;
    authenticate(
        &state,
        &context,
        LOGIN,
        form,
        (&redirects.login_success, "logged in"),
        &redirects.login_failure,
    )
    .await
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, context: RequestContext) -> Result<Redirect, Error> {
    if context.log_out().await? {
        info!("Visitor logged out");
        context.flash().set(flash::INFO, "logged out").await?;
    }
    Ok(Redirect::to(&state.config.auth.redirects.logout))
}

#[cfg(test)]
mod tests {
    use crate::{
        AppState, build_router,
        api::models::{auth::CredentialsForm, pages::PageView},
        auth::strategy::{Credentials, Outcome, Rejection},
        test_utils::{test_server, test_state},
    };
    use axum::http::StatusCode;
    use axum_test::{TestResponse, TestServer};
    use std::sync::Arc;

    fn form(email: &str, password: &str) -> CredentialsForm {
        CredentialsForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Session cookie set by a response, as a `Cookie` request header value
    fn session_cookie(response: &TestResponse) -> String {
        let set_cookie = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("passgate_session="))
            .expect("response should set the session cookie");
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn location(response: &TestResponse) -> String {
        response.headers()["location"].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_signup_login_profile_logout_flow() {
        let server = test_server();

        // Anonymous visitors are sent to the login page
        let response = server.get("/profile").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        // Signup logs the new identity in
        let response = server.post("/signup").form(&form("a@x.com", "hunter2")).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/profile");
        let cookie = session_cookie(&response);

        let response = server.get("/profile").add_header("cookie", &cookie).await;
        response.assert_status_ok();
        let view: PageView = response.json();
        assert_eq!(view.page, "profile");
        assert_eq!(view.identity.as_ref().unwrap().email, "a@x.com");
        assert_eq!(view.flash.success, vec!["account created"]);

        // Flash is shown once
        let view: PageView = server.get("/profile").add_header("cookie", &cookie).await.json();
        assert!(view.flash.is_empty());
        assert!(view.identity.is_some());

        // Logout ends the session; the flash rides on a fresh anonymous one
        let response = server.post("/logout").add_header("cookie", &cookie).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        let anonymous_cookie = session_cookie(&response);
        assert_ne!(anonymous_cookie, cookie);

        let view: PageView = server.get("/").add_header("cookie", &anonymous_cookie).await.json();
        assert!(view.identity.is_none());
        assert_eq!(view.flash.info, vec!["logged out"]);

        // The old cookie no longer authenticates
        let response = server.get("/profile").add_header("cookie", &cookie).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        // Logging back in with the same credentials works
        let response = server.post("/login").form(&form("A@X.com", "hunter2")).await;
        assert_eq!(location(&response), "/profile");
        let cookie = session_cookie(&response);
        let view: PageView = server.get("/profile").add_header("cookie", &cookie).await.json();
        assert_eq!(view.identity.unwrap().email, "a@x.com");
        assert_eq!(view.flash.success, vec!["logged in"]);
    }

    #[tokio::test]
    async fn test_rejections_are_flashed_on_failure_page() {
        let server = test_server();
        server.post("/signup").form(&form("a@x.com", "hunter2")).await;

        let cases = vec![
            ("/signup", form("a@x.com", "hunter2"), "/signup", "email in use"),
            ("/login", form("a@x.com", "hunter3"), "/login", "wrong password"),
            ("/login", form("b@x.com", "hunter2"), "/login", "no such user"),
            ("/signup", form("not-an-email", "hunter2"), "/signup", "invalid email"),
        ];

        for (path, body, failure_path, message) in cases {
            let response = server.post(path).form(&body).await;
            response.assert_status(StatusCode::SEE_OTHER);
            assert_eq!(location(&response), failure_path, "for {path} with {body:?}");
            let cookie = session_cookie(&response);

            let view: PageView = server.get(failure_path).add_header("cookie", &cookie).await.json();
            assert!(view.identity.is_none());
            assert_eq!(view.flash.error, vec![message.to_string()], "for {path} with {body:?}");

            // Gone after one render
            let view: PageView = server.get(failure_path).add_header("cookie", &cookie).await.json();
            assert!(view.flash.error.is_empty());
        }
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_anonymous_and_cleared() {
        let server = test_server();
        let response = server.post("/signup").form(&form("a@x.com", "hunter2")).await;
        let tampered = format!("{}x", session_cookie(&response));

        let response = server.get("/").add_header("cookie", &tampered).await;
        response.assert_status_ok();
        let view: PageView = response.json();
        assert!(view.identity.is_none());

        let cleared = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.starts_with("passgate_session=;") && value.contains("Max-Age=0"));
        assert!(cleared, "tampered cookie should be cleared");
    }

    #[tokio::test]
    async fn test_logout_when_anonymous_redirects() {
        let server = test_server();
        let response = server.get("/logout").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_registered_strategy_drives_login_route() {
        let state = test_state();

        // Replace the login strategy with one that refuses everyone
        let mut strategies = (*state.strategies).clone();
        strategies.register("login", |_: Credentials| async { Outcome::Rejected(Rejection::NoSuchUser) });
        let state = AppState {
            strategies: Arc::new(strategies),
            ..state
        };
        let server = TestServer::new(build_router(state)).unwrap();

        server.post("/signup").form(&form("a@x.com", "hunter2")).await;
        let response = server.post("/login").form(&form("a@x.com", "hunter2")).await;
        assert_eq!(location(&response), "/login");
        let cookie = session_cookie(&response);
        let view: PageView = server.get("/login").add_header("cookie", &cookie).await.json();
        assert_eq!(view.flash.error, vec!["no such user"]);
    }

    #[tokio::test]
    async fn test_healthz() {
        test_server().get("/healthz").await.assert_status_ok();
    }
}
