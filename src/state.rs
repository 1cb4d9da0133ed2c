use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::media::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub media: Arc<dyn MediaStore>,
    pub config: Arc<Config>,
}
