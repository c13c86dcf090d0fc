use super::record::BLANK;

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// `9:15:00.000000 AM` → `9:15 am`.
fn clock(raw: &str) -> String {
    raw.replace(":00.000000", "").trim().to_lowercase()
}

/// `start-end`, empty when the class has no meeting time.
pub fn meeting_time(start: &str, end: &str) -> String {
    let (start, end) = (clock(start), clock(end));
    if start.is_empty() && end.is_empty() {
        String::new()
    } else {
        format!("{}-{}", start, end)
    }
}

/// Room, meeting days and time, e.g. `KY 101 Mon, Wed 9:15 am-10:30 am`.
pub fn schedule_string(room: &str, days: &[bool; 7], start: &str, end: &str) -> String {
    let room = match room.trim() {
        "" => BLANK,
        r => r,
    };
    let days = DAY_NAMES
        .iter()
        .zip(days)
        .filter(|&(_, &meets)| meets)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let time = meeting_time(start, end);

    [room, days.as_str(), time.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_schedule_strings() {
        let mw = [true, false, true, false, false, false, false];
        assert_eq!(
            schedule_string("KY 101", &mw, "9:15:00.000000 AM", "10:30:00.000000 AM"),
            "KY 101 Mon, Wed 9:15 am-10:30 am"
        );
        assert_eq!(schedule_string("", &[false; 7], "", ""), "—");
        assert_eq!(
            schedule_string(" ", &[false, false, false, false, false, true, false], "", ""),
            "— Sat"
        );
    }
}
