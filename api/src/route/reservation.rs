use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{
    check_conflict, delete_reservation, register_reservation, show_location_list,
    show_reservation, show_reservation_list, show_room_list, update_reservation,
};

pub fn build_reservation_routers() -> Router<AppRegistry> {
    let reservations_routers = Router::new()
        .route("/", post(register_reservation))
        .route("/", get(show_reservation_list))
        .route("/conflitos", post(check_conflict))
        .route("/:reservation_id", get(show_reservation))
        .route("/:reservation_id", put(update_reservation))
        .route("/:reservation_id", delete(delete_reservation));

    Router::new()
        .nest("/reservas", reservations_routers)
        .route("/locais", get(show_location_list))
        .route("/salas", get(show_room_list))
}
