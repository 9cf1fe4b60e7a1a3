use chrono::{Datelike, NaiveDate};

pub fn week_key(date: &NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn weekday_name(index: usize) -> &'static str {
    // Monday-first, matching Datelike::weekday().num_days_from_monday()
    match index {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_key_uses_iso_year() {
        // 2024-12-30 falls in ISO week 1 of 2025
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(week_key(&date), "2025-W01");
    }

    #[test]
    fn week_key_formats_two_digits() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 7).unwrap();
        assert_eq!(week_key(&date), "2024-W06");
    }
}
