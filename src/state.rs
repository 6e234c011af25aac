use std::sync::Arc;

use crate::config::Config;
use crate::logbook::Logbook;
use crate::store::FileUserStore;
use crate::token::ResetTokenStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: FileUserStore,
    pub tokens: ResetTokenStore,
    pub logbook: Logbook,
    pub config: Config,
}
