//! Account administration commands.

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_create_superuser(
    config: Config,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let security = config.security.clone();
    let state = SharedState::new(config).await?;

    if state.store.get_user_by_username(username).await?.is_some() {
        state
            .store
            .update_user_password(username, password, &security)
            .await?;
        state.store.set_user_staff(username, true).await?;
        println!("✓ User '{username}' already existed; password reset and staff granted.");
        return Ok(());
    }

    match state.auth_service.create_superuser(username, password).await {
        Ok(user) => println!("✓ Superuser '{}' created.", user.username),
        Err(e) => println!("✗ Could not create superuser: {e}"),
    }

    Ok(())
}

pub async fn cmd_vip(config: Config, username: &str, revoke: bool) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    match state.profile_service.set_vip(username, !revoke).await {
        Ok(_) if revoke => println!("✓ '{username}' is no longer VIP; custom images cleared."),
        Ok(_) => println!("✓ '{username}' is now VIP."),
        Err(e) => println!("✗ {e}"),
    }

    Ok(())
}
