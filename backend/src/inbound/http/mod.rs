//! HTTP inbound adapter exposing the admin REST endpoints.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod transactions;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on a scope.
///
/// The caller wraps the scope with the session middleware and provides
/// `web::Data<HttpState>`.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use broker_admin::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(auth::current_session)
        .service(dashboard::dashboard_overview)
        .service(dashboard::dashboard_stats)
        .service(users::list_users)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(transactions::list_transactions);
}
