// MarkVault services
// Services read across stores: query/analytics views and engine configuration.

pub mod analytics_engine;
pub mod settings_engine;
