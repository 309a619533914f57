use engine::{Category, CategoryKind, SpreadsheetBinding, TransactionDraft};
use sheets::ledger;

use crate::{months, sync::SyncReport};

/// What a handler wants sent back: text plus an optional reply keyboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Keyboard {
    /// Hidden after one press.
    OneTime(Vec<Vec<String>>),
    /// Stays open, used while paging.
    Persistent(Vec<Vec<String>>),
    /// Removes whatever keyboard is open.
    Remove,
}

impl Reply {
    pub(crate) fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub(crate) fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

pub(crate) fn one_per_row(labels: impl IntoIterator<Item = String>) -> Keyboard {
    Keyboard::OneTime(labels.into_iter().map(|label| vec![label]).collect())
}

pub(crate) const PLEASE_START: &str = "Пожалуйста, начните с команды /start";
pub(crate) const USE_START: &str = "Пожалуйста, используйте /start для начала работы.";
pub(crate) const INTERNAL_ERROR: &str = "Произошла ошибка. Попробуйте еще раз.";

pub(crate) const GREETING: &str = "Привет! Я помогу вести учет доходов и расходов в Google Таблицах. \
    Отправляйте сообщения в формате: \"[дата] [+]сумма описание\"\n\n\
    Доступные команды:\n\
    /list - список доступных таблиц\n\
    /add - добавить таблицу\n\
    /categories - управление категориями";

pub(crate) const HELP: &str = "Доступные команды:\n\
    /start - регистрация и приветствие\n\
    /add - добавить таблицу\n\
    /remove - удалить таблицу\n\
    /list - транзакции за месяц\n\
    /list_tables - список добавленных таблиц\n\
    /categories - управление категориями\n\
    /map - сопоставления ключевых слов\n\
    /sync_categories - синхронизировать категории с таблицей\n\
    /clear_categories - удалить пользовательские категории\n\n\
    Записи добавляются сообщением вида \"[дата] [+]сумма описание\", \
    например \"вчера 1500 такси\" или \"+50000 зарплата\"";

pub(crate) const BAD_FORMAT: &str =
    "Неверный формат сообщения. Используйте формат: \"[дата] [+]сумма описание\"";

pub(crate) const ADD_PROMPT: &str = "Отправьте ссылку на таблицу или её идентификатор. \
    Таблица должна быть создана на основе шаблона: \
    https://docs.google.com/spreadsheets/d/1-BxqnQqyBPjyuRxMSrwQ2FDDxR-sQGQs_EZbZEn_Xzc";
pub(crate) const BAD_LINK: &str = "Неверный формат ссылки. Пожалуйста, убедитесь, что вы \
    скопировали полную ссылку на таблицу.";
pub(crate) const MONTH_PROMPT: &str =
    "Выберите месяц и год или введите их в формате \"Месяц Год\" (например \"Январь 2024\"):";
pub(crate) const BAD_MONTH: &str =
    "Неверный формат. Используйте формат \"Месяц Год\" (например \"Январь 2024\")";
pub(crate) const DUPLICATE_BINDING: &str = "Таблица для этого месяца и года уже существует";
pub(crate) const ADD_FAILED: &str = "Не удалось добавить таблицу. Попробуйте еще раз.";

pub(crate) const NO_TABLES_YET: &str = "У вас пока нет добавленных таблиц. \
    Используйте команду /add чтобы добавить таблицу";
pub(crate) const PICK_TABLE_TO_DELETE: &str = "Выберите таблицу для удаления:";
pub(crate) const TABLE_NOT_FOUND: &str = "Таблица не найдена";
pub(crate) const TABLE_REMOVED: &str = "Таблица успешно удалена";

pub(crate) const PICK_ACTION: &str = "Выберите действие:";
pub(crate) const UNKNOWN_ACTION: &str = "Неизвестное действие";
pub(crate) const MENU_EXPENSE_CATEGORIES: &str = "Категории расходов";
pub(crate) const MENU_INCOME_CATEGORIES: &str = "Категории доходов";
pub(crate) const MENU_ADD_CATEGORY: &str = "Добавить категорию";
pub(crate) const MENU_DELETE_CATEGORY: &str = "Удалить категорию";
pub(crate) const PICK_CATEGORY_KIND: &str = "Выберите тип категории:";
pub(crate) const BAD_CATEGORY_KIND: &str = "Неверный тип. Выберите \"Расходы\" или \"Доходы\"";
pub(crate) const NEW_CATEGORY_PROMPT: &str = "Введите название категории:";
pub(crate) const NO_OWN_CATEGORIES: &str = "У вас нет собственных категорий";
pub(crate) const PICK_CATEGORY_TO_DELETE: &str = "Выберите категорию для удаления:";

pub(crate) const MAP_USAGE: &str = "Пожалуйста, укажите описание расхода после команды /map. \
    Например: /map еда";
pub(crate) const BAD_MAPPING: &str = "Неверный формат. Используйте: слово = категория";
pub(crate) const ADD_MAPPING_BUTTON: &str = "Добавить сопоставление";

pub(crate) const BAD_LIST_MONTH: &str = "Неверный формат месяца. Пожалуйста, укажите месяц \
    числом (1-12) или словом (Январь-Декабрь).";
pub(crate) const BAD_LIST_YEAR: &str =
    "Неверный формат года. Пожалуйста, укажите год в числовом формате.";
pub(crate) const YEAR_TOO_OLD: &str = "Год не может быть меньше 2020.";
pub(crate) const LIST_CLOSED: &str = "Просмотр транзакций завершен";
pub(crate) const BACK_BUTTON: &str = "⬅️ Назад";
pub(crate) const FORWARD_BUTTON: &str = "➡️ Вперед";
pub(crate) const CLOSE_BUTTON: &str = "❌ Закрыть";

pub(crate) const SHEET_READ_FAILED: &str = "Не удалось прочитать таблицу. Попробуйте еще раз.";
pub(crate) const RECORD_FAILED: &str =
    "Не удалось записать транзакцию в таблицу. Попробуйте еще раз.";
pub(crate) const ALL_SYNCED: &str = "Все категории уже синхронизированы";
pub(crate) const SYNC_FAILED: &str = "Не удалось синхронизировать категории. Попробуйте еще раз.";
pub(crate) const CLEAR_FAILED: &str = "Не удалось очистить категории. Попробуйте еще раз.";

pub(crate) fn kind_button(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Expense => "Расходы",
        CategoryKind::Income => "Доходы",
    }
}

pub(crate) fn kind_from_button(label: &str) -> Option<CategoryKind> {
    match label {
        "Расходы" => Some(CategoryKind::Expense),
        "Доходы" => Some(CategoryKind::Income),
        _ => None,
    }
}

fn kind_genitive(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Expense => "расходов",
        CategoryKind::Income => "доходов",
    }
}

pub(crate) fn kind_keyboard() -> Keyboard {
    one_per_row([
        kind_button(CategoryKind::Expense).to_string(),
        kind_button(CategoryKind::Income).to_string(),
    ])
}

pub(crate) fn categories_menu_keyboard() -> Keyboard {
    one_per_row([
        MENU_EXPENSE_CATEGORIES.to_string(),
        MENU_INCOME_CATEGORIES.to_string(),
        MENU_ADD_CATEGORY.to_string(),
        MENU_DELETE_CATEGORY.to_string(),
    ])
}

/// Next month first, then the current one and four before it.
pub(crate) fn month_keyboard(month: u32, year: i32) -> Keyboard {
    let mut labels = Vec::with_capacity(6);
    let (next_month, next_year) = months::next_month(month, year);
    labels.push(months::month_label(next_month, next_year));
    let (mut m, mut y) = (month, year);
    for _ in 0..5 {
        labels.push(months::month_label(m, y));
        (m, y) = months::previous_month(m, y);
    }
    one_per_row(labels)
}

pub(crate) fn category_keyboard(names: &[String]) -> Keyboard {
    let mut labels = names.to_vec();
    labels.push(ADD_MAPPING_BUTTON.to_string());
    one_per_row(labels)
}

pub(crate) fn pager_keyboard(has_prev: bool, has_next: bool) -> Keyboard {
    let mut nav = Vec::new();
    if has_prev {
        nav.push(BACK_BUTTON.to_string());
    }
    if has_next {
        nav.push(FORWARD_BUTTON.to_string());
    }
    let mut rows = Vec::new();
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(vec![CLOSE_BUTTON.to_string()]);
    Keyboard::Persistent(rows)
}

pub(crate) fn sharing_instructions(email: &str) -> String {
    format!(
        "Для работы с таблицей нужно предоставить доступ сервисному аккаунту:\n\n\
         1. Откройте таблицу\n\
         2. Нажмите кнопку \"Настройки доступа\" (или \"Share\")\n\
         3. В поле \"Добавить пользователей или группы\" введите:\n{email}\n\
         4. Выберите роль \"Редактор\"\n\
         5. Нажмите \"Готово\"\n\n\
         После этого отправьте команду /add еще раз"
    )
}

pub(crate) fn binding_added(label: &str) -> String {
    format!("Таблица за {label} успешно добавлена")
}

pub(crate) fn binding_removed(label: &str) -> String {
    format!("Таблица за {label} успешно удалена")
}

pub(crate) fn no_binding_for(label: &str) -> String {
    format!("У вас нет таблицы за {label}. Пожалуйста, добавьте её с помощью команды /add")
}

pub(crate) fn no_table_for(label: &str) -> String {
    format!("У вас нет таблицы за {label}")
}

pub(crate) fn tables_list(bindings: &[SpreadsheetBinding]) -> String {
    let mut text = String::from("Список ваших таблиц:\n");
    for binding in bindings {
        text.push_str(&format!(
            "{}: {}\n",
            months::month_label(binding.month, binding.year),
            ledger::spreadsheet_url(&binding.spreadsheet_id)
        ));
    }
    text
}

pub(crate) fn category_listing(kind: CategoryKind, names: &[String]) -> String {
    format!("Категории {}:\n{}", kind_genitive(kind), names.join("\n"))
}

pub(crate) fn category_added(name: &str) -> String {
    format!("Категория \"{name}\" добавлена")
}

pub(crate) fn category_exists(name: &str) -> String {
    format!("Категория \"{name}\" уже существует")
}

pub(crate) fn category_removed(name: &str) -> String {
    format!("Категория \"{name}\" удалена")
}

pub(crate) fn category_not_found(name: &str) -> String {
    format!("Категория \"{name}\" не найдена")
}

pub(crate) fn cleared_categories(expenses: u64, incomes: u64) -> String {
    format!("Пользовательские категории очищены:\n- Расходы: {expenses}\n- Доходы: {incomes}")
}

pub(crate) fn recorded(draft: &TransactionDraft, category: &str) -> String {
    let (title, kind_name) = if draft.is_income {
        ("Доход", "доход")
    } else {
        ("Расход", "расход")
    };
    format!(
        "{title} успешно добавлен\nДата: {}\nСумма: {:.2}\nТип: {kind_name}\nОписание: {}\nКатегория: {category}",
        draft.date.format("%d.%m.%Y"),
        draft.amount,
        draft.description
    )
}

pub(crate) fn unresolved_category(description: &str) -> String {
    format!(
        "Не удалось определить категорию для \"{description}\". \
         Выберите категорию из списка или добавьте сопоставление:"
    )
}

pub(crate) fn still_unresolved(description: &str) -> String {
    format!(
        "Категория для \"{description}\" все еще не определена. \
         Выберите категорию из списка или добавьте еще одно сопоставление:"
    )
}

pub(crate) fn mapping_prompt(description: &str) -> String {
    format!(
        "Введите сопоставление в формате \"слово = категория\". \
         Например: \"{description} = Питание\""
    )
}

pub(crate) fn mapping_added(word: &str, category: &str) -> String {
    format!("Добавлено сопоставление: \"{word}\" → \"{category}\"")
}

pub(crate) fn unknown_category_pick(name: &str) -> String {
    format!("Категория \"{name}\" не найдена. Выберите категорию из списка:")
}

pub(crate) fn unknown_category_available(name: &str, names: &[String]) -> String {
    format!(
        "Категория \"{name}\" не найдена. Доступные категории:\n{}",
        names.join("\n")
    )
}

pub(crate) fn map_found(description: &str, category: &str) -> String {
    format!("Описание \"{description}\" соответствует категории \"{category}\"")
}

pub(crate) fn map_not_found(description: &str) -> String {
    format!("Для описания \"{description}\" категория не найдена")
}

pub(crate) fn mappings_reference(groups: &[(Category, Vec<String>)]) -> String {
    let mut text = String::from("Справочник категорий расходов:\n\n");
    let mut any = false;

    for (category, words) in groups.iter().filter(|(c, w)| c.is_default() && !w.is_empty()) {
        any = true;
        text.push_str(&format!("📍 {}:\n{}\n\n", category.name, words.join(", ")));
    }

    let owned: Vec<_> = groups
        .iter()
        .filter(|(c, w)| !c.is_default() && !w.is_empty())
        .collect();
    if !owned.is_empty() {
        any = true;
        text.push_str("\nВаши категории:\n\n");
        for (category, words) in owned {
            text.push_str(&format!("📍 {}:\n{}\n\n", category.name, words.join(", ")));
        }
    }

    if !any {
        text.push_str(
            "Сопоставлений пока нет. Чтобы добавить сопоставление, используйте команду:\n\
             /map слово = категория\n\nНапример:\n/map еда = Питание",
        );
    }
    text
}

pub(crate) fn sync_report(report: &SyncReport) -> String {
    let mut text = String::from("Синхронизация категорий завершена:\n");
    push_sync_section(
        &mut text,
        "Добавлены в базу данных:",
        &report.db_expenses,
        &report.db_incomes,
    );
    push_sync_section(
        &mut text,
        "Добавлены в таблицу:",
        &report.sheet_expenses,
        &report.sheet_incomes,
    );
    text
}

fn push_sync_section(text: &mut String, header: &str, expenses: &[String], incomes: &[String]) {
    if expenses.is_empty() && incomes.is_empty() {
        return;
    }
    text.push_str(&format!("\n{header}\n"));
    if !expenses.is_empty() {
        text.push_str(&format!("- Расходы: {}\n", expenses.join(", ")));
    }
    if !incomes.is_empty() {
        text.push_str(&format!("- Доходы: {}\n", incomes.join(", ")));
    }
}

pub(crate) fn pick_list_type(label: &str) -> String {
    format!("Выберите тип транзакций за {label}:")
}

pub(crate) fn no_transactions(kind: CategoryKind, label: &str) -> String {
    format!("Нет {} за {label}", kind_genitive(kind))
}

/// One row of the rendered listing.
pub(crate) struct ListedRow {
    pub date: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
}

pub(crate) fn transactions_page(
    kind: CategoryKind,
    label: &str,
    page: usize,
    total_pages: usize,
    rows: &[ListedRow],
    grand_total: f64,
) -> String {
    let mut text = format!(
        "{} за {label} (страница {page} из {total_pages}):\n\n",
        kind_button(kind)
    );
    let mut page_total = 0.0;
    for row in rows {
        page_total += row.amount;
        text.push_str(&format!(
            "{} | {} руб. | [{}] {}\n",
            row.date,
            format_amount(row.amount),
            row.category,
            row.description
        ));
    }
    text.push_str(&format!("\nИтого за страницу: {page_total:.2} руб."));
    text.push_str(&format!("\nОбщий итог: {grand_total:.2} руб."));
    text
}

/// Two decimals, thousands separated by a space: `12 345.67`.
pub(crate) fn format_amount(value: f64) -> String {
    let plain = format!("{value:.2}");
    let (whole, fraction) = match plain.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (plain.as_str(), "00"),
    };
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }
    format!("{sign}{grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.9), "999.90");
        assert_eq!(format_amount(1500.0), "1 500.00");
        assert_eq!(format_amount(1_234_567.89), "1 234 567.89");
        assert_eq!(format_amount(-1500.0), "-1 500.00");
    }

    #[test]
    fn month_keyboard_starts_with_next_month() {
        let Keyboard::OneTime(rows) = month_keyboard(12, 2024) else {
            panic!("expected a one-time keyboard");
        };
        let labels: Vec<&str> = rows.iter().map(|row| row[0].as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Январь 2025",
                "Декабрь 2024",
                "Ноябрь 2024",
                "Октябрь 2024",
                "Сентябрь 2024",
                "Август 2024",
            ]
        );
    }

    #[test]
    fn page_render_includes_totals() {
        let rows = vec![
            ListedRow {
                date: "15.01.2024".to_string(),
                amount: 1500.0,
                category: "Питание".to_string(),
                description: "продукты".to_string(),
            },
            ListedRow {
                date: "14.01.2024".to_string(),
                amount: 200.0,
                category: "Транспорт".to_string(),
                description: "такси".to_string(),
            },
        ];
        let text = transactions_page(CategoryKind::Expense, "Январь 2024", 1, 2, &rows, 2000.0);
        assert!(text.starts_with("Расходы за Январь 2024 (страница 1 из 2):"));
        assert!(text.contains("15.01.2024 | 1 500.00 руб. | [Питание] продукты"));
        assert!(text.contains("Итого за страницу: 1700.00 руб."));
        assert!(text.contains("Общий итог: 2000.00 руб."));
    }

    #[test]
    fn recorded_summary_shape() {
        let draft = TransactionDraft {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount: 1500.0,
            description: "такси".to_string(),
            is_income: false,
        };
        let text = recorded(&draft, "Транспорт");
        assert_eq!(
            text,
            "Расход успешно добавлен\nДата: 15.01.2024\nСумма: 1500.00\n\
             Тип: расход\nОписание: такси\nКатегория: Транспорт"
        );
    }
}
