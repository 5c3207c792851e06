use crate::model::{
    id::ReservationId,
    reservation::{
        event::{CheckConflict, CreateReservation, DeleteReservation, UpdateReservation},
        Reservation, ReservationOutcome,
    },
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    // 検証（時間帯の順序 → 衝突 → コーヒー）を通過した場合のみ保存する
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationOutcome>;
    // 指定されたフィールドだけ上書きし、作成時と同じ検証をやり直す
    async fn update(&self, event: UpdateReservation) -> AppResult<ReservationOutcome>;
    async fn delete(&self, event: DeleteReservation) -> AppResult<()>;
    // 開始時刻の昇順
    async fn find_all(&self) -> AppResult<Vec<Reservation>>;
    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>>;
    // 状態を変更しない事前チェック
    async fn find_conflict(&self, event: CheckConflict) -> AppResult<Option<Reservation>>;
    async fn find_locations(&self) -> AppResult<Vec<String>>;
    async fn find_rooms(&self, location: Option<String>) -> AppResult<Vec<String>>;
}
