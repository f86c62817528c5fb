use std::sync::Arc;

use crate::console::Console;

#[derive(Clone)]
pub struct AppState {
    pub console: Arc<Console>,
}
