use std::error::Error;

use chrono::Local;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot_state::AppState;
use crate::handlers::{booking, cancellation, StepContext, StepReply};
use crate::models::{Flow, Session};

const WELCOME: &str = "👋 *Bem-vindo à Barbearia X!*\n\n\
ℹ️ *Comandos disponíveis:*\n\
/ajuda - Ver comandos\n\
/servicos - Ver serviços disponíveis\n\
/horarios - Ver horários de atendimento\n\
/agendar - Iniciar um novo agendamento\n\
/cancelar - Cancelar agendamento atual\n\n\
🕒 *Horário de atendimento:*\n\
Segunda a Sábado, das 09:00 às 16:00\n\n\
Para começar, digite seu nome abaixo:";

const APOLOGY: &str =
    "😕 Desculpe, algo deu errado ao processar sua mensagem. Tente novamente em instantes.";

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat_id, "👋 Envie uma mensagem de texto para agendar ou use /ajuda.")
            .await?;
        return Ok(());
    };
    let text = text.trim();
    // Commands were already consumed by the command branch.
    if text.starts_with('/') {
        return Ok(());
    }

    let Some(entry) = state.sessions.get(chat_id).await else {
        // First contact: greet and open a booking session at ask_name.
        state.sessions.start(chat_id, Session::booking()).await;
        bot.send_message(chat_id, WELCOME).parse_mode(ParseMode::Markdown).await?;
        return Ok(());
    };

    // Per-conversation serialization: a double-send queues here until the
    // first message finishes its whole step, persistence calls included.
    let mut session = entry.lock().await;
    if !state.sessions.is_current(chat_id, &entry).await {
        // The session completed while this message waited in line.
        state.sessions.start(chat_id, Session::booking()).await;
        bot.send_message(chat_id, WELCOME).parse_mode(ParseMode::Markdown).await?;
        return Ok(());
    }

    let ctx = StepContext {
        repo: state.repo.as_ref(),
        notifier: state.notifier.as_ref(),
        now: Local::now().naive_local(),
    };
    let result = match session.flow {
        Flow::Booking(step) => booking::advance(&mut session, step, text, &ctx).await,
        Flow::Cancellation(step) => cancellation::advance(&mut session, step, text, &ctx).await,
    };

    let StepReply { text, completed, schedule, cancel } = match result {
        Ok(reply) => reply,
        Err(err) => {
            // Infrastructure failure: isolate it to this message and keep
            // the session so the user does not have to start over.
            log::error!("❌ Step failed for chat {}: {}", chat_id, err);
            bot.send_message(chat_id, APOLOGY).await?;
            return Ok(());
        }
    };

    bot.send_message(chat_id, text).parse_mode(ParseMode::Markdown).await?;

    if let Some(key) = &cancel {
        if state.reminders.cancel(key) {
            log::info!("🔕 Reminder cancelled for {} {} ({})", key.date, key.time, key.barber);
        }
    }

    if let Some(reminder) = schedule {
        let bot = bot.clone();
        let text = reminder.text;
        state.reminders.schedule(reminder.key, reminder.trigger_at, move || async move {
            log::info!("🔔 Firing reminder for chat {}", chat_id);
            if let Err(err) = bot.send_message(chat_id, text).await {
                log::error!("❌ Reminder delivery failed for chat {}: {}", chat_id, err);
            }
        });
        log::debug!("⏳ {} reminder(s) pending", state.reminders.pending());
    }

    if completed {
        log::debug!(
            "💾 Flow completed for chat {} (name: {:?}, slot: {:?})",
            chat_id,
            session.name,
            session.time
        );
        drop(session);
        state.sessions.remove(chat_id).await;
    }

    Ok(())
}
