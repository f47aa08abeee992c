//! Indian public and regional holidays shown on the calendar views.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holiday {
    pub name: &'static str,
    pub date: (i32, u32, u32),
    pub is_national: bool,
}

const fn holiday(
    name: &'static str,
    year: i32,
    month: u32,
    day: u32,
    is_national: bool,
) -> Holiday {
    Holiday {
        name,
        date: (year, month, day),
        is_national,
    }
}

pub const HOLIDAYS: [Holiday; 60] = [
    // 2024
    holiday("New Year Day", 2024, 1, 1, true),
    holiday("Makar Sankranti", 2024, 1, 14, false),
    holiday("Republic Day", 2024, 1, 26, true),
    holiday("Vasant Panchami", 2024, 2, 14, false),
    holiday("Maha Shivratri", 2024, 3, 8, false),
    holiday("Holi", 2024, 3, 25, true),
    holiday("Good Friday", 2024, 3, 29, true),
    holiday("Eid-ul-Fitr", 2024, 4, 11, true),
    holiday("Ram Navami", 2024, 4, 17, false),
    holiday("Maharashtra Day", 2024, 5, 1, false),
    holiday("Buddha Purnima", 2024, 5, 23, false),
    holiday("Eid al-Adha", 2024, 6, 17, true),
    holiday("Independence Day", 2024, 8, 15, true),
    holiday("Janmashtami", 2024, 8, 26, false),
    holiday("Ganesh Chaturthi", 2024, 9, 7, false),
    holiday("Gandhi Jayanti", 2024, 10, 2, true),
    holiday("Dussehra", 2024, 10, 12, true),
    holiday("Diwali", 2024, 11, 1, true),
    holiday("Guru Nanak Jayanti", 2024, 11, 15, true),
    holiday("Christmas", 2024, 12, 25, true),

    // 2025
    holiday("New Year Day", 2025, 1, 1, true),
    holiday("Makar Sankranti", 2025, 1, 14, false),
    holiday("Republic Day", 2025, 1, 26, true),
    holiday("Vasant Panchami", 2025, 2, 3, false),
    holiday("Maha Shivratri", 2025, 2, 26, false),
    holiday("Holi", 2025, 3, 14, true),
    holiday("Good Friday", 2025, 4, 18, true),
    holiday("Ram Navami", 2025, 4, 6, false),
    holiday("Eid-ul-Fitr", 2025, 4, 31, true),
    holiday("Maharashtra Day", 2025, 5, 1, false),
    holiday("Buddha Purnima", 2025, 5, 13, false),
    holiday("Eid al-Adha", 2025, 6, 7, true),
    holiday("Independence Day", 2025, 8, 15, true),
    holiday("Janmashtami", 2025, 8, 15, false),
    holiday("Ganesh Chaturthi", 2025, 8, 28, false),
    holiday("Gandhi Jayanti", 2025, 10, 2, true),
    holiday("Dussehra", 2025, 10, 2, true),
    holiday("Diwali", 2025, 10, 20, true),
    holiday("Guru Nanak Jayanti", 2025, 11, 4, true),
    holiday("Christmas", 2025, 12, 25, true),

    // 2026
    holiday("New Year Day", 2026, 1, 1, true),
    holiday("Makar Sankranti", 2026, 1, 14, false),
    holiday("Republic Day", 2026, 1, 26, true),
    holiday("Vasant Panchami", 2026, 1, 23, false),
    holiday("Maha Shivratri", 2026, 2, 15, false),
    holiday("Holi", 2026, 3, 3, true),
    holiday("Good Friday", 2026, 4, 3, true),
    holiday("Ram Navami", 2026, 3, 26, false),
    holiday("Eid-ul-Fitr", 2026, 3, 21, true),
    holiday("Maharashtra Day", 2026, 5, 1, false),
    holiday("Buddha Purnima", 2026, 5, 2, false),
    holiday("Eid al-Adha", 2026, 5, 28, true),
    holiday("Independence Day", 2026, 8, 15, true),
    holiday("Janmashtami", 2026, 8, 5, false),
    holiday("Ganesh Chaturthi", 2026, 9, 17, false),
    holiday("Gandhi Jayanti", 2026, 10, 2, true),
    holiday("Dussehra", 2026, 9, 21, true),
    holiday("Diwali", 2026, 11, 8, true),
    holiday("Guru Nanak Jayanti", 2026, 11, 24, true),
    holiday("Christmas", 2026, 12, 25, true),
];

impl Holiday {
    pub fn date(&self) -> Option<NaiveDate> {
        let (year, month, day) = self.date;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// First holiday listed for `date`. Where two share a day the table order
/// decides.
pub fn holiday_on(date: NaiveDate) -> Option<&'static Holiday> {
    HOLIDAYS.iter().find(|h| h.date() == Some(date))
}

/// Whether `date` is before `today`. Dates are compared by day only.
pub fn is_past_date(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}
