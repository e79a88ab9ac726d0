use super::types::TimeOfDay;

/// Maps an hour of the day (0–23) to its [`TimeOfDay`] bucket.
///
/// | Hours   | Bucket       |
/// |---------|--------------|
/// | 5–8     | Morning Rush |
/// | 9–11    | Mid Morning  |
/// | 12–16   | Afternoon    |
/// | 17–19   | Evening Rush |
/// | 20–23   | Night        |
/// | 0–4     | Late Night   |
pub fn time_of_day(hour: u32) -> TimeOfDay {
    match hour {
        5..=8 => TimeOfDay::MorningRush,
        9..=11 => TimeOfDay::MidMorning,
        12..=16 => TimeOfDay::Afternoon,
        17..=19 => TimeOfDay::EveningRush,
        20..=23 => TimeOfDay::Night,
        _ => TimeOfDay::LateNight,
    }
}
