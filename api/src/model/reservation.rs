use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::ReservationId,
    reservation::{
        event::{CheckConflict, CreateReservation, UpdateReservation},
        Reservation, ReservationWindow, Resource,
    },
};
use serde::{Deserialize, Deserializer, Serialize};
use shared::error::{AppError, AppResult};

use super::datetime::parse_timestamp;

// フィールド名は API の JSON キーそのまま

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservationRequest {
    #[garde(required, length(chars, min = 1, max = 100))]
    pub local: Option<String>,
    #[garde(required, length(chars, min = 1, max = 100))]
    pub sala: Option<String>,
    #[garde(required, length(chars, min = 1))]
    pub data_inicio: Option<String>,
    #[garde(required, length(chars, min = 1))]
    pub data_fim: Option<String>,
    #[garde(required, length(chars, min = 1, max = 100))]
    pub responsavel: Option<String>,
    #[garde(skip)]
    pub cafe: Option<bool>,
    #[garde(skip)]
    pub quantidade_pessoas: Option<i32>,
    #[garde(skip)]
    pub descricao: Option<String>,
}

impl TryFrom<CreateReservationRequest> for CreateReservation {
    type Error = AppError;

    fn try_from(value: CreateReservationRequest) -> AppResult<Self> {
        let CreateReservationRequest {
            local,
            sala,
            data_inicio,
            data_fim,
            responsavel,
            cafe,
            quantidade_pessoas,
            descricao,
        } = value;
        Ok(CreateReservation {
            location: local.unwrap_or_default(),
            room: sala.unwrap_or_default(),
            start_at: parse_timestamp("data_inicio", data_inicio.as_deref().unwrap_or_default())?,
            end_at: parse_timestamp("data_fim", data_fim.as_deref().unwrap_or_default())?,
            responsible: responsavel.unwrap_or_default(),
            coffee: cafe.unwrap_or(false),
            headcount: quantidade_pessoas,
            description: descricao,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReservationRequest {
    #[garde(length(chars, min = 1, max = 100))]
    pub local: Option<String>,
    #[garde(length(chars, min = 1, max = 100))]
    pub sala: Option<String>,
    #[garde(length(chars, min = 1))]
    pub data_inicio: Option<String>,
    #[garde(length(chars, min = 1))]
    pub data_fim: Option<String>,
    #[garde(length(chars, min = 1, max = 100))]
    pub responsavel: Option<String>,
    #[garde(skip)]
    pub cafe: Option<bool>,
    // キーの有無と null を区別する
    #[serde(default, deserialize_with = "deserialize_present")]
    #[garde(skip)]
    pub quantidade_pessoas: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[garde(skip)]
    pub descricao: Option<Option<String>>,
}

#[derive(new)]
pub struct UpdateReservationRequestWithId(ReservationId, UpdateReservationRequest);

impl TryFrom<UpdateReservationRequestWithId> for UpdateReservation {
    type Error = AppError;

    fn try_from(value: UpdateReservationRequestWithId) -> AppResult<Self> {
        let UpdateReservationRequestWithId(
            reservation_id,
            UpdateReservationRequest {
                local,
                sala,
                data_inicio,
                data_fim,
                responsavel,
                cafe,
                quantidade_pessoas,
                descricao,
            },
        ) = value;
        Ok(UpdateReservation {
            reservation_id,
            location: local,
            room: sala,
            start_at: data_inicio
                .map(|v| parse_timestamp("data_inicio", &v))
                .transpose()?,
            end_at: data_fim
                .map(|v| parse_timestamp("data_fim", &v))
                .transpose()?,
            responsible: responsavel,
            coffee: cafe,
            headcount: quantidade_pessoas,
            description: descricao,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckConflictRequest {
    #[garde(required, length(chars, min = 1, max = 100))]
    pub local: Option<String>,
    #[garde(required, length(chars, min = 1, max = 100))]
    pub sala: Option<String>,
    #[garde(required, length(chars, min = 1))]
    pub data_inicio: Option<String>,
    #[garde(required, length(chars, min = 1))]
    pub data_fim: Option<String>,
    // 編集中の予約 ID
    #[garde(skip)]
    pub reserva_id: Option<ReservationId>,
}

impl TryFrom<CheckConflictRequest> for CheckConflict {
    type Error = AppError;

    fn try_from(value: CheckConflictRequest) -> AppResult<Self> {
        let CheckConflictRequest {
            local,
            sala,
            data_inicio,
            data_fim,
            reserva_id,
        } = value;
        let window = ReservationWindow::new(
            parse_timestamp("data_inicio", data_inicio.as_deref().unwrap_or_default())?,
            parse_timestamp("data_fim", data_fim.as_deref().unwrap_or_default())?,
        )?;
        Ok(CheckConflict::new(
            Resource::new(local.unwrap_or_default(), sala.unwrap_or_default()),
            window,
            reserva_id,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct RoomListQuery {
    pub local: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub local: String,
    pub sala: String,
    pub data_inicio: DateTime<Utc>,
    pub data_fim: DateTime<Utc>,
    pub responsavel: String,
    pub cafe: bool,
    pub quantidade_pessoas: Option<i32>,
    pub descricao: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        let Reservation {
            reservation_id,
            location,
            room,
            start_at,
            end_at,
            responsible,
            coffee,
            headcount,
            description,
            created_at,
            updated_at,
        } = value;
        Self {
            id: reservation_id,
            local: location,
            sala: room,
            data_inicio: start_at,
            data_fim: end_at,
            responsavel: responsible,
            cafe: coffee,
            quantidade_pessoas: headcount,
            descricao: description,
            created_at,
            updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReservationSavedResponse {
    pub mensagem: String,
    pub reserva: ReservationResponse,
}

impl ReservationSavedResponse {
    pub fn new(mensagem: &str, reservation: Reservation) -> Self {
        Self {
            mensagem: mensagem.into(),
            reserva: reservation.into(),
        }
    }
}

#[derive(Debug, Serialize, new)]
pub struct MessageResponse {
    pub mensagem: String,
}

#[derive(Debug, Serialize)]
pub struct ConflictCheckResponse {
    pub tem_conflito: bool,
    pub conflito: Option<ReservationResponse>,
}

impl From<Option<Reservation>> for ConflictCheckResponse {
    fn from(value: Option<Reservation>) -> Self {
        Self {
            tem_conflito: value.is_some(),
            conflito: value.map(ReservationResponse::from),
        }
    }
}

fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_field_fails_validation() {
        let req: CreateReservationRequest = serde_json::from_value(json!({
            "local": "Matriz",
            "data_inicio": "2025-03-10T10:00:00",
            "data_fim": "2025-03-10T11:00:00",
            "responsavel": "Ana"
        }))
        .unwrap();
        let report = req.validate(&()).unwrap_err();
        assert!(report.to_string().contains("sala"));
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let req: CreateReservationRequest = serde_json::from_value(json!({
            "local": "Matriz",
            "sala": "",
            "data_inicio": "2025-03-10T10:00:00",
            "data_fim": "2025-03-10T11:00:00",
            "responsavel": "Ana"
        }))
        .unwrap();
        assert!(req.validate(&()).is_err());
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let req: UpdateReservationRequest = serde_json::from_value(json!({
            "descricao": null
        }))
        .unwrap();
        assert_eq!(req.descricao, Some(None));
        assert_eq!(req.quantidade_pessoas, None);

        let req: UpdateReservationRequest = serde_json::from_value(json!({
            "quantidade_pessoas": 7
        }))
        .unwrap();
        assert_eq!(req.quantidade_pessoas, Some(Some(7)));
        assert_eq!(req.descricao, None);
    }

    #[test]
    fn probe_rejects_inverted_window() {
        let req: CheckConflictRequest = serde_json::from_value(json!({
            "local": "Matriz",
            "sala": "Sala 1",
            "data_inicio": "2025-03-10T11:00:00Z",
            "data_fim": "2025-03-10T10:00:00Z"
        }))
        .unwrap();
        assert!(matches!(
            CheckConflict::try_from(req),
            Err(AppError::InvalidTimeRange)
        ));
    }

    #[test]
    fn probe_accepts_exclusion_id() {
        let id = ReservationId::new();
        let req: CheckConflictRequest = serde_json::from_value(json!({
            "local": "Matriz",
            "sala": "Sala 1",
            "data_inicio": "2025-03-10T10:00:00Z",
            "data_fim": "2025-03-10T11:00:00Z",
            "reserva_id": id.to_string()
        }))
        .unwrap();
        let query = CheckConflict::try_from(req).unwrap();
        assert_eq!(query.exclude, Some(id));
    }
}
