use std::sync::Arc;

use adapter::database::ConnectionPool;
use adapter::repository::health::HealthCheckRepositoryImpl;
use adapter::repository::in_memory::{InMemoryHealthCheckRepository, InMemoryReservationRepository};
use adapter::repository::reservation::ReservationRepositoryImpl;
use kernel::repository::health::HealthCheckRepository;
use kernel::repository::reservation::ReservationRepository;

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    reservation_repository: Arc<dyn ReservationRepository>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let reservation_repository = Arc::new(ReservationRepositoryImpl::new(pool.clone()));
        Self {
            health_check_repository,
            reservation_repository,
        }
    }

    // DB なしで動かす場合（開発・テスト用）
    pub fn in_memory() -> Self {
        Self {
            health_check_repository: Arc::new(InMemoryHealthCheckRepository),
            reservation_repository: Arc::new(InMemoryReservationRepository::new()),
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn reservation_repository(&self) -> Arc<dyn ReservationRepository> {
        self.reservation_repository.clone()
    }
}
