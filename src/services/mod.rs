//! Business logic services

pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod inventory;
pub mod notifications;
pub mod reservations;
pub mod stats;
pub mod students;
pub mod uploads;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub students: students::StudentService,
    pub inventory: inventory::InventoryService,
    pub circulation: circulation::CirculationService,
    pub reservations: reservations::ReservationService,
    pub notifications: notifications::NotificationService,
    pub uploads: uploads::UploadService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let inventory = inventory::InventoryService::new(repository.clone());
        let reservations = reservations::ReservationService::new(repository.clone());
        let notifications = notifications::NotificationService::new(repository.clone());

        Ok(Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone())?,
            catalog: catalog::CatalogService::new(repository.clone()),
            students: students::StudentService::new(repository.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                inventory.clone(),
                reservations.clone(),
                notifications.clone(),
            ),
            inventory,
            reservations,
            notifications,
            uploads: uploads::UploadService::new(&config.uploads),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        })
    }

    /// Check that the store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.count().await.map(|_| ())
    }
}
