use super::{Reservation, ReservationDraft, ReservationWindow, Resource};
use crate::model::id::ReservationId;
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(Debug, Clone, new)]
pub struct CreateReservation {
    pub location: String,
    pub room: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub responsible: String,
    pub coffee: bool,
    pub headcount: Option<i32>,
    pub description: Option<String>,
}

impl From<CreateReservation> for ReservationDraft {
    fn from(value: CreateReservation) -> Self {
        let CreateReservation {
            location,
            room,
            start_at,
            end_at,
            responsible,
            coffee,
            headcount,
            description,
        } = value;
        ReservationDraft {
            location,
            room,
            start_at,
            end_at,
            responsible,
            coffee,
            // コーヒーなしなら人数は保存しない
            headcount: if coffee { headcount } else { None },
            description,
        }
    }
}

/// 部分更新。`None` のフィールドは現在値を維持する
#[derive(Debug, Clone, Default)]
pub struct UpdateReservation {
    pub reservation_id: ReservationId,
    pub location: Option<String>,
    pub room: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub responsible: Option<String>,
    pub coffee: Option<bool>,
    // Some(None) は人数の明示的な削除
    pub headcount: Option<Option<i32>>,
    // Some(None) は説明の削除
    pub description: Option<Option<String>>,
}

impl UpdateReservation {
    pub fn new(reservation_id: ReservationId) -> Self {
        Self {
            reservation_id,
            ..Default::default()
        }
    }

    pub fn merge(self, current: &Reservation) -> ReservationDraft {
        let coffee = self.coffee.unwrap_or(current.coffee);
        let headcount = match (coffee, self.headcount) {
            (false, _) => None,
            (true, Some(requested)) => requested,
            (true, None) => current.headcount,
        };
        ReservationDraft {
            location: self.location.unwrap_or_else(|| current.location.clone()),
            room: self.room.unwrap_or_else(|| current.room.clone()),
            start_at: self.start_at.unwrap_or(current.start_at),
            end_at: self.end_at.unwrap_or(current.end_at),
            responsible: self
                .responsible
                .unwrap_or_else(|| current.responsible.clone()),
            coffee,
            headcount,
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
        }
    }
}

#[derive(Debug, new)]
pub struct DeleteReservation {
    pub reservation_id: ReservationId,
}

/// 衝突チェックの問い合わせ。`exclude` は編集中の予約
#[derive(Debug, Clone, new)]
pub struct CheckConflict {
    pub resource: Resource,
    pub window: ReservationWindow,
    pub exclude: Option<ReservationId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored() -> Reservation {
        let t = |h| Utc.with_ymd_and_hms(2025, 3, 10, h, 0, 0).unwrap();
        Reservation {
            reservation_id: ReservationId::new(),
            location: "Matriz".into(),
            room: "Sala 1".into(),
            start_at: t(10),
            end_at: t(11),
            responsible: "Ana".into(),
            coffee: true,
            headcount: Some(6),
            description: Some("Planejamento".into()),
            created_at: t(8),
            updated_at: t(8),
        }
    }

    #[test]
    fn empty_update_keeps_everything() {
        let current = stored();
        let draft = UpdateReservation::new(current.reservation_id).merge(&current);

        assert_eq!(draft.location, current.location);
        assert_eq!(draft.room, current.room);
        assert_eq!(draft.start_at, current.start_at);
        assert_eq!(draft.end_at, current.end_at);
        assert!(draft.coffee);
        assert_eq!(draft.headcount, Some(6));
        assert_eq!(draft.description.as_deref(), Some("Planejamento"));
    }

    #[test]
    fn turning_coffee_off_clears_headcount() {
        let current = stored();
        let mut update = UpdateReservation::new(current.reservation_id);
        update.coffee = Some(false);

        let draft = update.merge(&current);
        assert!(!draft.coffee);
        assert_eq!(draft.headcount, None);
    }

    #[test]
    fn headcount_is_ignored_without_coffee() {
        let mut current = stored();
        current.coffee = false;
        current.headcount = None;
        let mut update = UpdateReservation::new(current.reservation_id);
        update.headcount = Some(Some(10));

        assert_eq!(update.merge(&current).headcount, None);
    }

    #[test]
    fn turning_coffee_on_takes_new_headcount() {
        let mut current = stored();
        current.coffee = false;
        current.headcount = None;
        let mut update = UpdateReservation::new(current.reservation_id);
        update.coffee = Some(true);
        update.headcount = Some(Some(4));

        let draft = update.merge(&current);
        assert!(draft.coffee);
        assert_eq!(draft.headcount, Some(4));
    }

    #[test]
    fn explicit_null_headcount_is_kept_for_the_catering_check() {
        let current = stored();
        let mut update = UpdateReservation::new(current.reservation_id);
        update.headcount = Some(None);

        let draft = update.merge(&current);
        assert!(draft.coffee);
        assert_eq!(draft.headcount, None);
        assert!(draft.catering().is_err());
    }

    #[test]
    fn explicit_null_description_clears_it() {
        let current = stored();
        let mut update = UpdateReservation::new(current.reservation_id);
        update.description = Some(None);

        assert_eq!(update.merge(&current).description, None);
    }

    #[test]
    fn create_without_coffee_drops_headcount() {
        let t = |h| Utc.with_ymd_and_hms(2025, 3, 10, h, 0, 0).unwrap();
        let draft: ReservationDraft = CreateReservation::new(
            "Matriz".into(),
            "Sala 1".into(),
            t(10),
            t(11),
            "Ana".into(),
            false,
            Some(5),
            None,
        )
        .into();
        assert_eq!(draft.headcount, None);
    }
}
