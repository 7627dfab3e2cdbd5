use crate::config::AppConfig;
use crate::database::{init_database, SqliteTokenStorage};
use crate::error::AppError;
use crate::models::PetMarker;
use crate::services::{MarkerBoard, MarkerError, MarkerService};
use petmap_auth::{AuthService, Session, TokenStorage, Transport};

/// Wired-up client: one session shared by the transport and both gateways
pub struct PetMapApp {
    pub config: AppConfig,
    pub session: Session,
    pub auth: AuthService,
    pub markers: MarkerService,
}

impl PetMapApp {
    /// Open the token database named in the config and build the client
    pub fn boot(config: AppConfig) -> Result<Self, AppError> {
        let conn = init_database(&config.database_path)?;
        Self::with_storage(config, SqliteTokenStorage::new(conn))
    }

    /// Build the client on top of an arbitrary token store.
    ///
    /// The stored token is read here, before any request can be issued.
    pub fn with_storage(
        config: AppConfig,
        storage: impl TokenStorage + 'static,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let session = Session::init(storage);
        let transport = Transport::new(
            config.api_base_url.clone(),
            session.clone(),
            config.request_timeout,
        )?;

        Ok(Self {
            auth: AuthService::new(transport.clone()),
            markers: MarkerService::new(transport),
            session,
            config,
        })
    }

    /// Reload the board; a rejected token ends the session
    pub async fn refresh_markers(&self, board: &mut MarkerBoard) -> Result<bool, AppError> {
        board
            .reload(&self.markers)
            .await
            .map_err(|e| self.on_marker_error(e))
    }

    /// Submit the board's open draft; a rejected token ends the session
    pub async fn save_draft(
        &self,
        board: &mut MarkerBoard,
    ) -> Result<Option<PetMarker>, AppError> {
        board
            .submit_draft(&self.markers)
            .await
            .map_err(|e| self.on_marker_error(e))
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.session.logout()?;
        Ok(())
    }

    fn on_marker_error(&self, err: MarkerError) -> AppError {
        if err == MarkerError::Unauthorized {
            log::warn!("Service rejected the session token, logging out");
            if let Err(e) = self.session.logout() {
                log::error!("Failed to clear session: {}", e);
            }
        }
        AppError::Marker(err)
    }
}
