use crate::model::id::ReservationId;
use chrono::{DateTime, Utc};
use shared::error::{AppError, AppResult};

pub mod conflict;
pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
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

impl Reservation {
    // 保存済みの予約は start < end が保証されている
    pub fn window(&self) -> ReservationWindow {
        ReservationWindow {
            start: self.start_at,
            end: self.end_at,
        }
    }

    pub fn occupies(&self, resource: &Resource) -> bool {
        self.location == resource.location && self.room == resource.room
    }
}

/// 予約の取り合いの単位となる (場所, 部屋) の組
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    pub location: String,
    pub room: String,
}

impl Resource {
    pub fn new(location: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            room: room.into(),
        }
    }
}

/// 半開区間 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReservationWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::InvalidTimeRange);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    // 端点が接しているだけなら重ならない
    pub fn overlaps(&self, other: &ReservationWindow) -> bool {
        other.end > self.start && other.start < self.end
    }
}

/// コーヒー提供の有無と人数。提供ありなら人数は必ず正
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catering {
    coffee: bool,
    headcount: Option<i32>,
}

impl Catering {
    pub fn new(coffee: bool, headcount: Option<i32>) -> AppResult<Self> {
        if !coffee {
            return Ok(Self {
                coffee: false,
                headcount: None,
            });
        }
        match headcount {
            Some(n) if n > 0 => Ok(Self {
                coffee: true,
                headcount: Some(n),
            }),
            _ => Err(AppError::BusinessRuleViolation(
                "Quando café é solicitado, a quantidade de pessoas é obrigatória".into(),
            )),
        }
    }

    pub fn coffee(&self) -> bool {
        self.coffee
    }

    pub fn headcount(&self) -> Option<i32> {
        self.headcount
    }
}

/// 作成・更新の検証前の予約内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub location: String,
    pub room: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub responsible: String,
    pub coffee: bool,
    pub headcount: Option<i32>,
    pub description: Option<String>,
}

impl ReservationDraft {
    pub fn resource(&self) -> Resource {
        Resource::new(self.location.clone(), self.room.clone())
    }

    pub fn window(&self) -> AppResult<ReservationWindow> {
        ReservationWindow::new(self.start_at, self.end_at)
    }

    pub fn catering(&self) -> AppResult<Catering> {
        Catering::new(self.coffee, self.headcount)
    }
}

/// 書き込み系操作の結果。衝突は業務上の結果として扱う
#[derive(Debug)]
pub enum ReservationOutcome {
    Saved(Reservation),
    // 並行書き込みで衝突した場合、相手の予約を特定できないことがある
    Conflicted(Option<Reservation>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, 0).unwrap()
    }

    fn window(from: (u32, u32), to: (u32, u32)) -> ReservationWindow {
        ReservationWindow::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    #[test]
    fn window_rejects_inverted_and_empty_ranges() {
        assert!(matches!(
            ReservationWindow::new(at(11, 0), at(10, 0)),
            Err(AppError::InvalidTimeRange)
        ));
        assert!(matches!(
            ReservationWindow::new(at(10, 0), at(10, 0)),
            Err(AppError::InvalidTimeRange)
        ));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let a = window((10, 0), (11, 0));
        assert!(!a.overlaps(&window((11, 0), (12, 0))));
        assert!(!a.overlaps(&window((9, 0), (10, 0))));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = window((10, 0), (11, 0));
        let b = window((10, 30), (11, 30));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let inner = window((10, 15), (10, 45));
        assert!(a.overlaps(&inner));
        assert!(inner.overlaps(&a));
    }

    #[test]
    fn catering_requires_positive_headcount_with_coffee() {
        assert!(Catering::new(true, None).is_err());
        assert!(Catering::new(true, Some(0)).is_err());
        assert!(Catering::new(true, Some(-2)).is_err());

        let c = Catering::new(true, Some(8)).unwrap();
        assert!(c.coffee());
        assert_eq!(c.headcount(), Some(8));
    }

    #[test]
    fn catering_without_coffee_drops_headcount() {
        let c = Catering::new(false, Some(12)).unwrap();
        assert!(!c.coffee());
        assert_eq!(c.headcount(), None);
    }
}
