use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{
    id::ReservationId,
    reservation::{
        event::{CheckConflict, CreateReservation, DeleteReservation, UpdateReservation},
        Reservation, ReservationOutcome,
    },
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::model::reservation::{
    CheckConflictRequest, ConflictCheckResponse, CreateReservationRequest, MessageResponse,
    ReservationResponse, ReservationSavedResponse, RoomListQuery, UpdateReservationRequest,
    UpdateReservationRequestWithId,
};

pub async fn show_reservation_list(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<ReservationResponse>>> {
    registry
        .reservation_repository()
        .find_all()
        .await
        .map(|v| v.into_iter().map(ReservationResponse::from).collect())
        .map(Json)
}

pub async fn register_reservation(
    State(registry): State<AppRegistry>,
    payload: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ReservationSavedResponse>)> {
    let Json(req) = payload?;
    req.validate(&())?;

    let event = CreateReservation::try_from(req)?;
    match registry.reservation_repository().create(event).await? {
        ReservationOutcome::Saved(reservation) => {
            tracing::info!(reservation = %reservation.reservation_id, "reservation created");
            Ok((
                StatusCode::CREATED,
                Json(ReservationSavedResponse::new(
                    "Reserva criada com sucesso",
                    reservation,
                )),
            ))
        }
        ReservationOutcome::Conflicted(existing) => Err(conflict_error(existing)),
    }
}

pub async fn show_reservation(
    Path(reservation_id): Path<String>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation_id = parse_reservation_id(&reservation_id)?;
    registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await
        .and_then(|r| match r {
            Some(r) => Ok(Json(r.into())),
            None => Err(reservation_not_found()),
        })
}

pub async fn update_reservation(
    Path(reservation_id): Path<String>,
    State(registry): State<AppRegistry>,
    payload: Result<Json<UpdateReservationRequest>, JsonRejection>,
) -> AppResult<Json<ReservationSavedResponse>> {
    let reservation_id = parse_reservation_id(&reservation_id)?;
    let Json(req) = payload?;
    req.validate(&())?;

    let event =
        UpdateReservation::try_from(UpdateReservationRequestWithId::new(reservation_id, req))?;
    match registry.reservation_repository().update(event).await? {
        ReservationOutcome::Saved(reservation) => {
            tracing::info!(reservation = %reservation.reservation_id, "reservation updated");
            Ok(Json(ReservationSavedResponse::new(
                "Reserva atualizada com sucesso",
                reservation,
            )))
        }
        ReservationOutcome::Conflicted(existing) => Err(conflict_error(existing)),
    }
}

pub async fn delete_reservation(
    Path(reservation_id): Path<String>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MessageResponse>> {
    let reservation_id = parse_reservation_id(&reservation_id)?;
    registry
        .reservation_repository()
        .delete(DeleteReservation::new(reservation_id))
        .await?;

    tracing::info!(reservation = %reservation_id, "reservation deleted");
    Ok(Json(MessageResponse::new(
        "Reserva excluída com sucesso".into(),
    )))
}

// 予約は作成せず、衝突の有無だけを返す
pub async fn check_conflict(
    State(registry): State<AppRegistry>,
    payload: Result<Json<CheckConflictRequest>, JsonRejection>,
) -> AppResult<Json<ConflictCheckResponse>> {
    let Json(req) = payload?;
    req.validate(&())?;

    registry
        .reservation_repository()
        .find_conflict(CheckConflict::try_from(req)?)
        .await
        .map(ConflictCheckResponse::from)
        .map(Json)
}

pub async fn show_location_list(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<String>>> {
    registry
        .reservation_repository()
        .find_locations()
        .await
        .map(Json)
}

pub async fn show_room_list(
    Query(query): Query<RoomListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<String>>> {
    // 空文字の local は絞り込みなしとして扱う
    let location = query.local.filter(|l| !l.is_empty());
    registry
        .reservation_repository()
        .find_rooms(location)
        .await
        .map(Json)
}

fn reservation_not_found() -> AppError {
    AppError::EntityNotFound("Reserva não encontrada".into())
}

// 形式が不正な ID の予約は存在し得ないので 404 とする
fn parse_reservation_id(raw: &str) -> AppResult<ReservationId> {
    raw.parse().map_err(|_| reservation_not_found())
}

fn conflict_error(existing: Option<Reservation>) -> AppError {
    match existing
        .map(ReservationResponse::from)
        .map(serde_json::to_value)
        .transpose()
    {
        Ok(conflict) => AppError::ReservationConflict(conflict),
        Err(e) => e.into(),
    }
}
