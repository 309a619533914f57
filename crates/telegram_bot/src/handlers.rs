use chrono::Utc;
use chrono_tz::Europe::Moscow;
use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, ReplyMarkup},
};

use crate::{
    ConfigParameters,
    dialogue::{Dialogue, Profile},
    ui::{self, Keyboard, Reply},
};

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = msg.chat.id;
    let profile = msg
        .from
        .as_ref()
        .map(|from| Profile {
            username: from.username.as_deref(),
            first_name: Some(from.first_name.as_str()),
            last_name: from.last_name.as_deref(),
        })
        .unwrap_or_default();

    // Users type dates relative to their own day, not the server's.
    let today = Utc::now().with_timezone(&Moscow).date_naive();
    let dialogue = Dialogue::new(&cfg.engine, &cfg.sheets, &cfg.service_email, today);

    let replies = match dialogue.handle(chat_id.0, profile, text).await {
        Ok(replies) => replies,
        Err(err) => {
            tracing::error!(chat = chat_id.0, error = %err, "message handling failed");
            vec![Reply::plain(ui::INTERNAL_ERROR)]
        }
    };

    for reply in replies {
        let mut request = bot.send_message(chat_id, reply.text);
        if let Some(keyboard) = reply.keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        request.await?;
    }

    Ok(())
}

fn reply_markup(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::OneTime(rows) => ReplyMarkup::Keyboard(markup(rows).one_time_keyboard()),
        Keyboard::Persistent(rows) => ReplyMarkup::Keyboard(markup(rows)),
        Keyboard::Remove => ReplyMarkup::kb_remove(),
    }
}

fn markup(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
    .resize_keyboard()
}
