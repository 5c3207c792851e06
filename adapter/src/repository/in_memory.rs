//! プロセス内メモリに予約を保持するリポジトリ。
//!
//! 開発時やテストで PostgreSQL なしにサーバーを動かすために使う。
//! 書き込みは 1 つの書き込みロックの中で検査と保存を行うので、
//! 衝突チェックと保存の間に他のリクエストが割り込むことはない。

use async_trait::async_trait;
use chrono::Utc;
use kernel::model::{
    id::ReservationId,
    reservation::{
        conflict::find_conflict,
        event::{CheckConflict, CreateReservation, DeleteReservation, UpdateReservation},
        Reservation, ReservationDraft, ReservationOutcome,
    },
};
use kernel::repository::{health::HealthCheckRepository, reservation::ReservationRepository};
use shared::error::{AppError, AppResult};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryReservationRepository {
    reservations: RwLock<HashMap<ReservationId, Reservation>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationOutcome> {
        let draft = ReservationDraft::from(event);
        let window = draft.window()?;
        let query = CheckConflict::new(draft.resource(), window, None);

        let mut reservations = self.reservations.write().await;
        if let Some(existing) = find_conflict(reservations.values(), &query) {
            return Ok(ReservationOutcome::Conflicted(Some(existing.clone())));
        }
        let catering = draft.catering()?;

        let now = Utc::now();
        let reservation = Reservation {
            reservation_id: ReservationId::new(),
            location: draft.location,
            room: draft.room,
            start_at: window.start(),
            end_at: window.end(),
            responsible: draft.responsible,
            coffee: catering.coffee(),
            headcount: catering.headcount(),
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        reservations.insert(reservation.reservation_id, reservation.clone());

        Ok(ReservationOutcome::Saved(reservation))
    }

    async fn update(&self, event: UpdateReservation) -> AppResult<ReservationOutcome> {
        let reservation_id = event.reservation_id;

        let mut reservations = self.reservations.write().await;
        let current = reservations
            .get(&reservation_id)
            .ok_or_else(|| AppError::EntityNotFound("Reserva não encontrada".into()))?;

        let draft = event.merge(current);
        let window = draft.window()?;
        let query = CheckConflict::new(draft.resource(), window, Some(reservation_id));
        if let Some(existing) = find_conflict(reservations.values(), &query) {
            return Ok(ReservationOutcome::Conflicted(Some(existing.clone())));
        }
        let catering = draft.catering()?;

        let Some(stored) = reservations.get_mut(&reservation_id) else {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been updated".into(),
            ));
        };
        stored.location = draft.location;
        stored.room = draft.room;
        stored.start_at = window.start();
        stored.end_at = window.end();
        stored.responsible = draft.responsible;
        stored.coffee = catering.coffee();
        stored.headcount = catering.headcount();
        stored.description = draft.description;
        stored.updated_at = Utc::now();

        Ok(ReservationOutcome::Saved(stored.clone()))
    }

    async fn delete(&self, event: DeleteReservation) -> AppResult<()> {
        self.reservations
            .write()
            .await
            .remove(&event.reservation_id)
            .map(|_| ())
            .ok_or_else(|| AppError::EntityNotFound("Reserva não encontrada".into()))
    }

    async fn find_all(&self) -> AppResult<Vec<Reservation>> {
        let mut all: Vec<Reservation> = self.reservations.read().await.values().cloned().collect();
        all.sort_by_key(|r| r.start_at);
        Ok(all)
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>> {
        Ok(self.reservations.read().await.get(&reservation_id).cloned())
    }

    async fn find_conflict(&self, event: CheckConflict) -> AppResult<Option<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(find_conflict(reservations.values(), &event).cloned())
    }

    async fn find_locations(&self) -> AppResult<Vec<String>> {
        let reservations = self.reservations.read().await;
        let locations: BTreeSet<&String> = reservations
            .values()
            .map(|r| &r.location)
            .filter(|l| !l.is_empty())
            .collect();
        Ok(locations.into_iter().cloned().collect())
    }

    async fn find_rooms(&self, location: Option<String>) -> AppResult<Vec<String>> {
        let reservations = self.reservations.read().await;
        let rooms: BTreeSet<&String> = reservations
            .values()
            .filter(|r| location.as_ref().map_or(true, |l| &r.location == l))
            .map(|r| &r.room)
            .filter(|room| !room.is_empty())
            .collect();
        Ok(rooms.into_iter().cloned().collect())
    }
}

// メモリ上で動かすときは DB の死活監視は常に成功とする
pub struct InMemoryHealthCheckRepository;

#[async_trait]
impl HealthCheckRepository for InMemoryHealthCheckRepository {
    async fn check_db(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use kernel::model::reservation::{ReservationWindow, Resource};

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, 0).unwrap()
    }

    fn booking(location: &str, room: &str, from: (u32, u32), to: (u32, u32)) -> CreateReservation {
        CreateReservation::new(
            location.into(),
            room.into(),
            at(from.0, from.1),
            at(to.0, to.1),
            "Ana".into(),
            false,
            None,
            None,
        )
    }

    async fn saved(repo: &InMemoryReservationRepository, event: CreateReservation) -> Reservation {
        match repo.create(event).await.unwrap() {
            ReservationOutcome::Saved(r) => r,
            other => panic!("expected a saved reservation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sequential_bookings_never_overlap() {
        let repo = InMemoryReservationRepository::new();
        let a = saved(&repo, booking("Matriz", "Sala 1", (10, 0), (11, 0))).await;

        match repo
            .create(booking("Matriz", "Sala 1", (10, 30), (11, 30)))
            .await
            .unwrap()
        {
            ReservationOutcome::Conflicted(Some(c)) => assert_eq!(c, a),
            other => panic!("expected a conflict, got {other:?}"),
        }

        saved(&repo, booking("Matriz", "Sala 1", (11, 0), (12, 0))).await;
        saved(&repo, booking("Matriz", "Sala 2", (10, 30), (11, 30))).await;

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].start_at <= w[1].start_at));
    }

    #[tokio::test]
    async fn conflict_is_reported_before_catering_rule() {
        let repo = InMemoryReservationRepository::new();
        saved(&repo, booking("Matriz", "Sala 1", (10, 0), (11, 0))).await;

        let mut event = booking("Matriz", "Sala 1", (10, 0), (11, 0));
        event.coffee = true;
        assert!(matches!(
            repo.create(event).await.unwrap(),
            ReservationOutcome::Conflicted(Some(_))
        ));

        let mut event = booking("Matriz", "Sala 1", (12, 0), (13, 0));
        event.coffee = true;
        assert!(matches!(
            repo.create(event).await,
            Err(AppError::BusinessRuleViolation(_))
        ));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let repo = InMemoryReservationRepository::new();
        assert!(matches!(
            repo.create(booking("Matriz", "Sala 1", (11, 0), (10, 0))).await,
            Err(AppError::InvalidTimeRange)
        ));
    }

    #[tokio::test]
    async fn update_to_same_slot_does_not_conflict_with_itself() {
        let repo = InMemoryReservationRepository::new();
        let a = saved(&repo, booking("Matriz", "Sala 1", (10, 0), (11, 0))).await;

        let mut update = UpdateReservation::new(a.reservation_id);
        update.start_at = Some(a.start_at);
        update.end_at = Some(a.end_at);
        update.responsible = Some("Bruno".into());

        match repo.update(update).await.unwrap() {
            ReservationOutcome::Saved(r) => {
                assert_eq!(r.responsible, "Bruno");
                assert_eq!(r.created_at, a.created_at);
                assert!(r.updated_at >= a.updated_at);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn moving_into_an_occupied_room_conflicts() {
        let repo = InMemoryReservationRepository::new();
        let a = saved(&repo, booking("Matriz", "Sala 1", (10, 0), (11, 0))).await;
        let b = saved(&repo, booking("Matriz", "Sala 2", (10, 0), (11, 0))).await;

        let mut update = UpdateReservation::new(b.reservation_id);
        update.room = Some("Sala 1".into());

        match repo.update(update).await.unwrap() {
            ReservationOutcome::Conflicted(Some(c)) => assert_eq!(c.reservation_id, a.reservation_id),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let b_now = repo.find_by_id(b.reservation_id).await.unwrap().unwrap();
        assert_eq!(b_now.room, "Sala 2");
    }

    #[tokio::test]
    async fn update_of_missing_reservation_is_not_found() {
        let repo = InMemoryReservationRepository::new();
        assert!(matches!(
            repo.update(UpdateReservation::new(ReservationId::new())).await,
            Err(AppError::EntityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn probe_does_not_persist() {
        let repo = InMemoryReservationRepository::new();
        let query = CheckConflict::new(
            Resource::new("Matriz", "Sala 1"),
            ReservationWindow::new(at(10, 0), at(11, 0)).unwrap(),
            None,
        );
        assert!(repo.find_conflict(query).await.unwrap().is_none());
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_hard_and_reports_missing() {
        let repo = InMemoryReservationRepository::new();
        let a = saved(&repo, booking("Matriz", "Sala 1", (10, 0), (11, 0))).await;

        repo.delete(DeleteReservation::new(a.reservation_id)).await.unwrap();
        assert!(repo.find_by_id(a.reservation_id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(DeleteReservation::new(a.reservation_id)).await,
            Err(AppError::EntityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn lookups_are_distinct_and_filterable() {
        let repo = InMemoryReservationRepository::new();
        saved(&repo, booking("Matriz", "Sala 2", (8, 0), (9, 0))).await;
        saved(&repo, booking("Matriz", "Sala 1", (10, 0), (11, 0))).await;
        saved(&repo, booking("Matriz", "Sala 1", (11, 0), (12, 0))).await;
        saved(&repo, booking("Filial", "Auditório", (10, 0), (11, 0))).await;

        assert_eq!(repo.find_locations().await.unwrap(), vec!["Filial", "Matriz"]);
        assert_eq!(
            repo.find_rooms(None).await.unwrap(),
            vec!["Auditório", "Sala 1", "Sala 2"]
        );
        assert_eq!(
            repo.find_rooms(Some("Matriz".into())).await.unwrap(),
            vec!["Sala 1", "Sala 2"]
        );
    }
}
