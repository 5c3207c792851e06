use kernel::model::{id::ReservationId, reservation::Reservation};
use sqlx::types::chrono::{DateTime, Utc};

// reservations テーブルの 1 行
#[derive(sqlx::FromRow)]
pub struct ReservationRow {
    pub reservation_id: ReservationId,
    pub location: String,
    pub room: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub responsible: String,
    pub coffee: bool,
    pub headcount: Option<i32>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(value: ReservationRow) -> Self {
        let ReservationRow {
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
        Reservation {
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
        }
    }
}
