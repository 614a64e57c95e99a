pub mod api;
pub mod scrape;
pub mod settings;

pub use api::{Category, KhinsiderClient};
pub use scrape::{Album, ScrapeError, Track};
pub use settings::{AppSettings, AppState};
