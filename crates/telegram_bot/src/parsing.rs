use chrono::{Datelike, NaiveDate};
use engine::TransactionDraft;

use crate::months;

/// Parses a free-form transaction line into a draft.
///
/// Rules:
/// - `1500 такси` => expense dated today
/// - `+50000 зарплата` => income
/// - the line may start with a date: `сегодня`, `вчера`, `01.02.2024`,
///   `01.02`, `2024-02-01` or `1 февраля [2024]`; slashes work like dots
/// - the amount takes at most two decimals, dot or comma
/// - a malformed leading date is not an error: the token is read as the
///   amount instead
pub(crate) fn parse_transaction(input: &str, today: NaiveDate) -> Option<TransactionDraft> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let (date, consumed) = match leading_date(&tokens, today) {
        Some((date, consumed)) => (date, consumed),
        None => (today, 0),
    };

    let rest = tokens.get(consumed..)?;
    let (amount, is_income) = parse_amount(rest.first()?)?;
    let description = rest[1..].join(" ");
    if description.is_empty() {
        return None;
    }

    Some(TransactionDraft {
        date,
        amount,
        description,
        is_income,
    })
}

/// "Месяц Год" answer in the binding flow, e.g. "Январь 2024".
pub(crate) fn parse_month_year(input: &str) -> Option<(u32, i32)> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let [month, year] = tokens.as_slice() else {
        return None;
    };
    Some((months::month_number(month)?, parse_bounded_year(year)?))
}

/// Month argument of a listing command: a number 1-12 or a Russian name.
pub(crate) fn parse_month_argument(token: &str) -> Option<u32> {
    if let Some(number) = parse_number(token) {
        return (1..=12).contains(&number).then_some(number);
    }
    months::month_number(token)
}

fn leading_date(tokens: &[&str], today: NaiveDate) -> Option<(NaiveDate, usize)> {
    let first = tokens.first()?;

    // "1 января" and "1 января 2024". A bare number with no month name
    // after it is an amount, not a date.
    if let Some(day) = parse_number(first) {
        let month = tokens.get(1).and_then(|token| months::month_number(token))?;
        if let Some(year) = tokens.get(2).and_then(|token| parse_bounded_year(token))
            && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
        {
            return Some((date, 3));
        }
        return NaiveDate::from_ymd_opt(today.year(), month, day).map(|date| (date, 2));
    }

    single_token_date(first, today).map(|date| (date, 1))
}

fn single_token_date(token: &str, today: NaiveDate) -> Option<NaiveDate> {
    match token.to_lowercase().as_str() {
        "сегодня" => return Some(today),
        "вчера" => return today.pred_opt(),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Some(date);
    }

    let separator = if token.contains('.') {
        '.'
    } else if token.contains('/') {
        '/'
    } else {
        return None;
    };

    let parts: Vec<&str> = token.split(separator).collect();
    match parts.as_slice() {
        [day, month] => {
            NaiveDate::from_ymd_opt(today.year(), parse_number(month)?, parse_number(day)?)
        }
        [day, month, year] => {
            NaiveDate::from_ymd_opt(parse_year(year)?, parse_number(month)?, parse_number(day)?)
        }
        _ => None,
    }
}

/// `^\+?\d+([.,]\d{1,2})?$` over the whole token; `+` marks income.
fn parse_amount(token: &str) -> Option<(f64, bool)> {
    let (body, is_income) = match token.strip_prefix('+') {
        Some(rest) => (rest, true),
        None => (token, false),
    };

    let normalized = body.replace(',', ".");
    let (whole, fraction) = match normalized.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (normalized.as_str(), None),
    };
    if whole.is_empty() || !whole.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction
        && (fraction.is_empty()
            || fraction.len() > 2
            || !fraction.bytes().all(|byte| byte.is_ascii_digit()))
    {
        return None;
    }

    let amount: f64 = normalized.parse().ok()?;
    (amount > 0.0).then_some((amount, is_income))
}

fn parse_number(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn parse_year(token: &str) -> Option<i32> {
    if token.len() != 4 {
        return None;
    }
    parse_number(token).map(|year| year as i32)
}

/// Years are bounded so that an amount is never mistaken for one.
fn parse_bounded_year(token: &str) -> Option<i32> {
    parse_year(token).filter(|year| (2000..=2100).contains(year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn expense_defaults_to_today() {
        let draft = parse_transaction("1500 такси", today()).unwrap();
        assert_eq!(draft.date, today());
        assert_eq!(draft.amount, 1500.0);
        assert_eq!(draft.description, "такси");
        assert!(!draft.is_income);
    }

    #[test]
    fn plus_sign_marks_income() {
        let draft = parse_transaction("вчера +50000 зарплата", today()).unwrap();
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
        assert!(draft.is_income);
        assert_eq!(draft.description, "зарплата");
    }

    #[test]
    fn explicit_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        for input in [
            "01.02.2024 200 коммуналка",
            "1.2.2024 200 коммуналка",
            "01.02 200 коммуналка",
            "01/02/2024 200 коммуналка",
            "01/02 200 коммуналка",
            "2024-02-01 200 коммуналка",
        ] {
            let draft = parse_transaction(input, today()).unwrap();
            assert_eq!(draft.date, expected, "{input}");
            assert_eq!(draft.amount, 200.0, "{input}");
        }
    }

    #[test]
    fn named_month_dates() {
        let draft = parse_transaction("1 февраля 2024 500 такси", today()).unwrap();
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(draft.amount, 500.0);

        let draft = parse_transaction("5 марта 300 кафе", today()).unwrap();
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(draft.description, "кафе");
    }

    #[test]
    fn named_month_year_out_of_bounds_is_an_amount() {
        let draft = parse_transaction("1 января 1000 пицца", today()).unwrap();
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(draft.amount, 1000.0);
        assert_eq!(draft.description, "пицца");
    }

    #[test]
    fn malformed_date_falls_through_to_amount() {
        let draft = parse_transaction("31 февраля 100 тест", today()).unwrap();
        assert_eq!(draft.date, today());
        assert_eq!(draft.amount, 31.0);
        assert_eq!(draft.description, "февраля 100 тест");
    }

    #[test]
    fn amount_rules() {
        assert!(parse_transaction("1,5 кофе", today()).is_some());
        assert!(parse_transaction("100.55 кофе", today()).is_some());
        assert!(parse_transaction("100.555 кофе", today()).is_none());
        assert!(parse_transaction("100. кофе", today()).is_none());
        assert!(parse_transaction("0 кофе", today()).is_none());
        assert!(parse_transaction("-100 кофе", today()).is_none());
    }

    #[test]
    fn incomplete_lines_are_rejected() {
        assert!(parse_transaction("100", today()).is_none());
        assert!(parse_transaction("такси 100", today()).is_none());
        assert!(parse_transaction("вчера", today()).is_none());
        assert!(parse_transaction("сегодня 100", today()).is_none());
        assert!(parse_transaction("", today()).is_none());
    }

    #[test]
    fn month_year_answer() {
        assert_eq!(parse_month_year("Январь 2024"), Some((1, 2024)));
        assert_eq!(parse_month_year("  январь   2024  "), Some((1, 2024)));
        assert_eq!(parse_month_year("Январь 1999"), None);
        assert_eq!(parse_month_year("Январь"), None);
        assert_eq!(parse_month_year("Январь 2024 лишнее"), None);
    }

    #[test]
    fn month_argument_number_or_name() {
        assert_eq!(parse_month_argument("5"), Some(5));
        assert_eq!(parse_month_argument("13"), None);
        assert_eq!(parse_month_argument("Май"), Some(5));
        assert_eq!(parse_month_argument("чепуха"), None);
    }
}
