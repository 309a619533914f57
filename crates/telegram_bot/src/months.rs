//! Russian month names and month arithmetic.

/// Nominative names, used for labels and keyboard buttons.
const MONTHS: [&str; 12] = [
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

/// Genitive names, as they appear in dates like "1 января".
const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

pub(crate) fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTHS[(month - 1) as usize],
        _ => "",
    }
}

/// Month number for a name in either case form, case-insensitive.
pub(crate) fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim().to_lowercase();
    MONTHS
        .iter()
        .chain(MONTHS_GENITIVE.iter())
        .position(|month| month.to_lowercase() == lower)
        .map(|index| (index % 12 + 1) as u32)
}

/// "Январь 2024" style label used across prompts and buttons.
pub(crate) fn month_label(month: u32, year: i32) -> String {
    format!("{} {year}", month_name(month))
}

pub(crate) fn next_month(month: u32, year: i32) -> (u32, i32) {
    if month == 12 { (1, year + 1) } else { (month + 1, year) }
}

pub(crate) fn previous_month(month: u32, year: i32) -> (u32, i32) {
    if month == 1 { (12, year - 1) } else { (month - 1, year) }
}
