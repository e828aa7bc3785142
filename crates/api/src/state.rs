use std::sync::Arc;

use tradepulse_core::llm::ChatClient;
use tradepulse_core::news::NewsProvider;
use tradepulse_core::storage::users::UserRepository;

/// Clients are built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    // None when the API runs without a database.
    pub users: Option<Arc<dyn UserRepository>>,
    pub news: Arc<dyn NewsProvider>,
    pub llm: Arc<dyn ChatClient>,
    pub expose_error_details: bool,
}

#[cfg(test)]
impl AppState {
    pub(crate) fn with_fakes(
        users: Option<tradepulse_core::testing::FakeUsers>,
        news: tradepulse_core::testing::FakeNews,
        llm: tradepulse_core::testing::FakeChat,
    ) -> Self {
        Self {
            users: users.map(|u| Arc::new(u) as Arc<dyn UserRepository>),
            news: Arc::new(news),
            llm: Arc::new(llm),
            expose_error_details: false,
        }
    }
}
