//! Configuration collaborator.

use slashlaunch_protocol::GameInstall;

use crate::error::ServiceError;

/// Source of the configured installs and sink for user settings.
///
/// The binary implements this on top of its config file. Implementations
/// report their own failures as [`ServiceError::Config`].
pub trait ConfigStore: Send + Sync {
    /// Returns the configured game installs.
    fn games(&self) -> Result<Vec<GameInstall>, ServiceError>;

    /// Persists the selected realm gateway.
    fn update_gateway(&self, gateway: &str) -> Result<(), ServiceError>;
}
