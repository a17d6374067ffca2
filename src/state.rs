use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Repositories;
use crate::services::{CredentialService, ImageStore, ListingService};

/// Shared, immutable per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repositories: Repositories,
    pub tokens: TokenService,
    pub credentials: CredentialService,
    pub listings: ListingService,
    pub images: ImageStore,
}

impl AppState {
    /// Wire the services over an already opened set of repositories
    pub fn new(config: AppConfig, repositories: Repositories) -> Self {
        let images = ImageStore::new(&config.uploads);
        let tokens = TokenService::new(&config.security, repositories.users.clone());
        let credentials = CredentialService::new(repositories.users.clone());
        let listings = ListingService::new(repositories.cars.clone(), images.clone(), &config.api);

        Self {
            config: Arc::new(config),
            repositories,
            tokens,
            credentials,
            listings,
            images,
        }
    }
}
