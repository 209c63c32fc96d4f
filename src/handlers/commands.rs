use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot_state::AppState;
use crate::catalog::{ALLOWED_SLOTS, SERVICES};
use crate::models::Session;
use crate::Command;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: AppState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Command::Ajuda => handle_ajuda(bot, msg).await?,
        Command::Servicos => handle_servicos(bot, msg).await?,
        Command::Horarios => handle_horarios(bot, msg).await?,
        Command::Agendar => handle_agendar(bot, msg, state).await?,
        Command::Cancelar => handle_cancelar(bot, msg, state).await?,
    }
    Ok(())
}

async fn handle_ajuda(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(
        msg.chat.id,
        "ℹ️ *Comandos disponíveis:*\n\
        /ajuda - Ver comandos\n\
        /servicos - Ver serviços disponíveis\n\
        /horarios - Ver horários disponíveis\n\
        /agendar - Iniciar novo agendamento\n\
        /cancelar - Cancelar agendamento atual",
    )
    .parse_mode(ParseMode::Markdown)
    .await?;

    Ok(())
}

async fn handle_servicos(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut text = String::from("💈 *Serviços disponíveis:*");
    for service in &SERVICES {
        text.push_str(&format!(
            "\n ✂️ {} — R$ {:.2} ({} min)",
            service.name, service.price, service.duration_minutes
        ));
    }

    bot.send_message(msg.chat.id, text).parse_mode(ParseMode::Markdown).await?;

    Ok(())
}

async fn handle_horarios(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(
        msg.chat.id,
        format!(
            "🕒 *Horário de atendimento:*\n\
            Segunda a Sábado\n\
            Horários de início: {}",
            ALLOWED_SLOTS.join(", ")
        ),
    )
    .parse_mode(ParseMode::Markdown)
    .await?;

    Ok(())
}

async fn handle_agendar(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    state.sessions.start(msg.chat.id, Session::booking()).await;
    bot.send_message(
        msg.chat.id,
        "👋 Vamos começar um novo agendamento!\nQual é o seu nome?",
    )
    .await?;

    Ok(())
}

async fn handle_cancelar(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    state.sessions.start(msg.chat.id, Session::cancellation()).await;
    bot.send_message(
        msg.chat.id,
        "❌ Vamos cancelar um agendamento. Por favor, informe seu nome:",
    )
    .await?;

    Ok(())
}
