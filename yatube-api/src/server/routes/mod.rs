use crate::server::ServerRouter;

mod comments;
mod follows;
mod groups;
mod posts;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(groups::routes())
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(follows::routes())
}
