//! Business logic services

pub mod equipment;
pub mod reservations;
pub mod resources;
pub mod stats;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub equipment: equipment::EquipmentService,
    pub reservations: reservations::ReservationsService,
    pub resources: resources::ResourcesService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            equipment: equipment::EquipmentService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository.clone()),
            resources: resources::ResourcesService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
