use std::sync::Arc;

use crate::application::accounts::AccountService;
use crate::application::auth::AccessControl;
use crate::application::catalog::CatalogService;
use crate::application::repos::StoreHealth;

#[derive(Clone)]
pub struct ApiState {
    pub access: Arc<AccessControl>,
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub health: Arc<dyn StoreHealth>,
}
