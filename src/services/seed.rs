use tracing::{error, info, warn};

use super::account_service::{AccountService, SignUpRequest};
use crate::config::AdminSeed;
use crate::database::User;

/// Create the first account from ADMIN_* settings when the store is empty.
/// Never fails startup; problems are logged.
pub async fn seed_admin_if_none_exists(
    accounts: &AccountService,
    seed: Option<&AdminSeed>,
) -> Option<User> {
    match accounts.has_users().await {
        Ok(true) => return None,
        Ok(false) => {}
        Err(e) => {
            error!("Failed to seed admin user: {}", e);
            return None;
        }
    }

    let Some(seed) = seed else {
        warn!("ADMIN_EMAIL and ADMIN_PASSWORD must be set in env to auto-create admin user.");
        return None;
    };

    let request = SignUpRequest {
        name: seed.name.clone(),
        email: seed.email.clone(),
        password: seed.password.clone(),
    };
    match accounts.register(request).await {
        Ok(user) => {
            info!(email = %user.email, "Admin user seeded from environment variables.");
            Some(user)
        }
        Err(e) => {
            error!("Failed to seed admin user: {}", e);
            None
        }
    }
}
