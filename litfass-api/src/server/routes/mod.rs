use crate::server::ServerRouter;
use axum::Router;

mod engagement;
mod feed;
mod follows;
mod posts;
mod stories;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(engagement::routes())
        .merge(feed::routes())
        .merge(follows::routes())
        .merge(posts::routes())
        .merge(stories::routes())
        .merge(users::routes())
}
