use crate::database::{model::reservation::ReservationRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::ReservationId,
    reservation::{
        event::{CheckConflict, CreateReservation, DeleteReservation, UpdateReservation},
        Reservation, ReservationDraft, ReservationOutcome,
    },
};
use kernel::repository::reservation::ReservationRepository;
use shared::error::{AppError, AppResult};

// reservations_no_overlap の排他制約違反。並行書き込みに先を越されたことを意味する
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(new)]
pub struct ReservationRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ReservationRepository for ReservationRepositoryImpl {
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationOutcome> {
        let draft = ReservationDraft::from(event);
        let window = draft.window()?;
        let query = CheckConflict::new(draft.resource(), window, None);

        let mut tx = self.db.begin().await?;

        // 同時に挿入された重複は排他制約が弾くので、ここでの確認は先行分のみ
        if let Some(existing) = select_conflict(&mut *tx, &query).await? {
            tracing::debug!(
                conflicting = %existing.reservation_id,
                "reservation overlaps an existing one"
            );
            return Ok(ReservationOutcome::Conflicted(Some(existing)));
        }

        let catering = draft.catering()?;

        let inserted = sqlx::query_as::<_, ReservationRow>(
            r#"
                INSERT INTO reservations
                (reservation_id, location, room, start_at, end_at,
                responsible, coffee, headcount, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING
                    reservation_id, location, room, start_at, end_at,
                    responsible, coffee, headcount, description,
                    created_at, updated_at
            "#,
        )
        .bind(ReservationId::new())
        .bind(&draft.location)
        .bind(&draft.room)
        .bind(window.start())
        .bind(window.end())
        .bind(&draft.responsible)
        .bind(catering.coffee())
        .bind(catering.headcount())
        .bind(&draft.description)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) if is_exclusion_violation(&e) => {
                drop(tx);
                return self.conflict_after_race(&query).await;
            }
            Err(e) => return Err(AppError::SpecificOperationError(e)),
        };

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(ReservationOutcome::Saved(row.into()))
    }

    async fn update(&self, event: UpdateReservation) -> AppResult<ReservationOutcome> {
        let reservation_id = event.reservation_id;
        let mut tx = self.db.begin().await?;

        let current: Reservation = sqlx::query_as::<_, ReservationRow>(
            r#"
                SELECT
                    reservation_id, location, room, start_at, end_at,
                    responsible, coffee, headcount, description,
                    created_at, updated_at
                FROM reservations
                WHERE reservation_id = $1
                FOR UPDATE
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?
        .map(Reservation::from)
        .ok_or_else(|| AppError::EntityNotFound("Reserva não encontrada".into()))?;

        let draft = event.merge(&current);
        let window = draft.window()?;
        // 自分自身とは衝突させない
        let query = CheckConflict::new(draft.resource(), window, Some(reservation_id));

        if let Some(existing) = select_conflict(&mut *tx, &query).await? {
            tracing::debug!(
                reservation = %reservation_id,
                conflicting = %existing.reservation_id,
                "updated reservation overlaps an existing one"
            );
            return Ok(ReservationOutcome::Conflicted(Some(existing)));
        }

        let catering = draft.catering()?;

        let updated = sqlx::query_as::<_, ReservationRow>(
            r#"
                UPDATE reservations
                SET
                    location = $2,
                    room = $3,
                    start_at = $4,
                    end_at = $5,
                    responsible = $6,
                    coffee = $7,
                    headcount = $8,
                    description = $9,
                    updated_at = CURRENT_TIMESTAMP(3)
                WHERE reservation_id = $1
                RETURNING
                    reservation_id, location, room, start_at, end_at,
                    responsible, coffee, headcount, description,
                    created_at, updated_at
            "#,
        )
        .bind(reservation_id)
        .bind(&draft.location)
        .bind(&draft.room)
        .bind(window.start())
        .bind(window.end())
        .bind(&draft.responsible)
        .bind(catering.coffee())
        .bind(catering.headcount())
        .bind(&draft.description)
        .fetch_optional(&mut *tx)
        .await;

        let row = match updated {
            Ok(Some(row)) => row,
            Ok(None) => {
                return Err(AppError::NoRowsAffectedError(
                    "No reservation record has been updated".into(),
                ))
            }
            Err(e) if is_exclusion_violation(&e) => {
                drop(tx);
                return self.conflict_after_race(&query).await;
            }
            Err(e) => return Err(AppError::SpecificOperationError(e)),
        };

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(ReservationOutcome::Saved(row.into()))
    }

    async fn delete(&self, event: DeleteReservation) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                DELETE FROM reservations WHERE reservation_id = $1
            "#,
        )
        .bind(event.reservation_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound("Reserva não encontrada".into()));
        }

        Ok(())
    }

    async fn find_all(&self) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, ReservationRow>(
            r#"
                SELECT
                    reservation_id, location, room, start_at, end_at,
                    responsible, coffee, headcount, description,
                    created_at, updated_at
                FROM reservations
                ORDER BY start_at ASC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Reservation::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, ReservationRow>(
            r#"
                SELECT
                    reservation_id, location, room, start_at, end_at,
                    responsible, coffee, headcount, description,
                    created_at, updated_at
                FROM reservations
                WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(Reservation::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_conflict(&self, event: CheckConflict) -> AppResult<Option<Reservation>> {
        select_conflict(self.db.inner_ref(), &event).await
    }

    async fn find_locations(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
                SELECT DISTINCT location
                FROM reservations
                WHERE location <> ''
                ORDER BY location
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_rooms(&self, location: Option<String>) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
                SELECT DISTINCT room
                FROM reservations
                WHERE room <> ''
                  AND ($1::TEXT IS NULL OR location = $1)
                ORDER BY room
            "#,
        )
        .bind(location)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)
    }
}

impl ReservationRepositoryImpl {
    // 並行する書き込みに先を越された場合、ロールバック後に相手の予約を探し直す
    async fn conflict_after_race(&self, query: &CheckConflict) -> AppResult<ReservationOutcome> {
        let existing = select_conflict(self.db.inner_ref(), query).await?;
        tracing::warn!(
            location = %query.resource.location,
            room = %query.resource.room,
            found = existing.is_some(),
            "concurrent write rejected by the datastore"
        );
        Ok(ReservationOutcome::Conflicted(existing))
    }
}

// 重複条件：existing.end > new.start AND existing.start < new.end
async fn select_conflict<'e, E>(executor: E, query: &CheckConflict) -> AppResult<Option<Reservation>>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, ReservationRow>(
        r#"
            SELECT
                reservation_id, location, room, start_at, end_at,
                responsible, coffee, headcount, description,
                created_at, updated_at
            FROM reservations
            WHERE location = $1
              AND room = $2
              AND end_at > $3
              AND start_at < $4
              AND ($5::UUID IS NULL OR reservation_id <> $5)
            ORDER BY start_at ASC
            LIMIT 1
        "#,
    )
    .bind(&query.resource.location)
    .bind(&query.resource.room)
    .bind(query.window.start())
    .bind(query.window.end())
    .bind(query.exclude)
    .fetch_optional(executor)
    .await
    .map(|row| row.map(Reservation::from))
    .map_err(AppError::SpecificOperationError)
}

fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == EXCLUSION_VIOLATION)
}
