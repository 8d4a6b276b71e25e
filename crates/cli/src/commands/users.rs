//! User management commands.

use dental_com_storefront::db::{RepositoryError, UserRepository};

use super::{CliError, connect};

/// Grant or revoke staff rights for `username`.
///
/// # Errors
///
/// Returns `CliError::UnknownUser` when no account has that username.
pub async fn set_staff(username: &str, is_staff: bool) -> Result<(), CliError> {
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_staff(username, is_staff)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::UnknownUser(username.to_owned()),
            other => CliError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, is_staff, "User updated");
    Ok(())
}
