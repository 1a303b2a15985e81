use crate::config::Settings;
use crate::db::Database;
use crate::feed::FeedComposer;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub settings: Settings,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let session_manager = SessionManager::with_ttl_days(db.clone(), settings.session.ttl_days);
        Self {
            db,
            session_manager,
            settings,
        }
    }

    pub fn feeds(&self) -> FeedComposer {
        FeedComposer::new(self.db.clone())
    }
}
