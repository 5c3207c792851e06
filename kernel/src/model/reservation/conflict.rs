use super::{event::CheckConflict, Reservation};

/// 同じ (場所, 部屋) で候補の時間帯と重なる予約を探す。
///
/// `exclude` に指定された予約（編集中の予約自身）は対象外とする。
/// 複数見つかった場合は開始時刻が最も早いものを返す。
pub fn find_conflict<'a, I>(reservations: I, query: &CheckConflict) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    reservations
        .into_iter()
        .filter(|r| r.occupies(&query.resource))
        .filter(|r| query.exclude != Some(r.reservation_id))
        .filter(|r| r.window().overlaps(&query.window))
        .min_by_key(|r| r.start_at)
}
