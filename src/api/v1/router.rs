use super::cookies::REFRESH_TOKEN_COOKIE;
use super::guard::with_principal;
use super::handler;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let callback = warp::get()
        .and(warp::path("auth"))
        .and(warp::path("callback"))
        .and(warp::path::end())
        .and(warp::query::<handler::CallbackQuery>())
        .and(with(server.identity.clone()))
        .and(with(server.gateway.clone()))
        .and(with_value(server.secure_cookies))
        .and_then(handler::complete_login);

    let refresh = warp::get()
        .and(warp::path("auth"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::cookie::optional::<String>(REFRESH_TOKEN_COOKIE))
        .and(with(server.gateway.clone()))
        .and(with_value(server.secure_cookies))
        .and_then(handler::refresh);

    let session = warp::get()
        .and(warp::path("auth"))
        .and(warp::path("session"))
        .and(warp::path::end())
        .and(with_principal(server.gateway.clone()))
        .and_then(handler::session);

    callback.or(refresh).or(session)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_value<V>(value: V) -> impl Filter<Extract = (V,), Error = Infallible> + Clone
where
    V: Copy + Send + Sync + 'static,
{
    warp::any().map(move || value)
}
