//! Page views.
//!
//! Each render consumes the pending flash messages, so a reload shows none of them again.

use axum::Json;
use tracing::instrument;

use crate::{
    api::models::pages::{FlashView, PageView},
    auth::{context::RequestContext, flash},
    errors::Error,
};

async fn render(page: &str, context: &RequestContext) -> Result<Json<PageView>, Error> {
    let channel = context.flash();
    let view = PageView {
        page: page.to_string(),
        identity: context.identity().map(Into::into),
        flash: FlashView {
            error: channel.consume(flash::ERROR).await?,
            info: channel.consume(flash::INFO).await?,
            success: channel.consume(flash::SUCCESS).await?,
        },
    };
    Ok(Json(view))
}

#[instrument(skip_all)]
pub async fn home(context: RequestContext) -> Result<Json<PageView>, Error> {
    render("home", &context).await
}

#[instrument(skip_all)]
pub async fn signup_page(context: RequestContext) -> Result<Json<PageView>, Error> {
    render("signup", &context).await
}

#[instrument(skip_all)]
pub async fn login_page(context: RequestContext) -> Result<Json<PageView>, Error> {
    render("login", &context).await
}

/// Protected by `require_authenticated`
#[instrument(skip_all)]
pub async fn profile(context: RequestContext) -> Result<Json<PageView>, Error> {
    render("profile", &context).await
}
