use axum::Router;
use registry::AppRegistry;

pub mod health;
pub mod reservation;

use health::build_health_check_routers;
use reservation::build_reservation_routers;

pub fn routes() -> Router<AppRegistry> {
    Router::new()
        .merge(build_health_check_routers())
        .nest("/api", build_reservation_routers())
}
