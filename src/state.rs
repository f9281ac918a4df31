use crate::config::Config;
use crate::db::DbPool;
use crate::service::SharedService;
use std::sync::Arc;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub service: SharedService,
    pub templates: Arc<Tera>,
}
