use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::banner::BannerService;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub banners: BannerService,
    pub config: Arc<AppConfig>,
}
