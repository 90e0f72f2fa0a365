//! App Core for MarkVault.
//!
//! Holds the one `Database` and the settings engine. Managers borrow the
//! connection with a lifetime, so they are built on demand through the
//! accessors below rather than stored.

use crate::database::connection::Database;
use crate::managers::bookmark_store::SqliteBookmarkStore;
use crate::managers::collection_manager::CollectionManager;
use crate::managers::favorite_manager::FavoriteManager;
use crate::managers::schedule_manager::ScheduleManager;
use crate::managers::tag_manager::TagManager;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::settings::QuerySettings;

/// Central application struct wiring storage to configuration.
pub struct App {
    pub db: Database,
    pub settings_engine: SettingsEngine,
}

impl App {
    /// Loads settings and opens the configured database.
    pub fn new(mut settings_engine: SettingsEngine) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let settings = settings_engine.load()?;
        let db = Database::open_configured(&settings.database_path)?;
        Ok(Self { db, settings_engine })
    }

    /// Wraps an already opened database. Settings stay at their in-memory defaults
    /// until `settings_engine.load()` is called.
    pub fn with_database(db: Database, settings_engine: SettingsEngine) -> Self {
        Self { db, settings_engine }
    }

    pub fn query_settings(&self) -> QuerySettings {
        self.settings_engine.get_settings().query.clone()
    }

    pub fn bookmarks(&self) -> SqliteBookmarkStore<'_> {
        SqliteBookmarkStore::new(self.db.connection())
    }

    pub fn tags(&self) -> TagManager<'_> {
        TagManager::new(self.db.connection())
    }

    pub fn collections(&self) -> CollectionManager<'_> {
        CollectionManager::new(self.db.connection())
    }

    pub fn favorites(&self) -> FavoriteManager<'_> {
        FavoriteManager::new(self.db.connection())
    }

    pub fn schedules(&self) -> ScheduleManager<'_> {
        ScheduleManager::new(self.db.connection())
    }
}
