use std::env;
use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

mod availability;
mod bot_state;
mod catalog;
mod database;
mod handlers;
mod http;
mod models;
mod normalize;
mod notify;
mod repository;
mod scheduler;

use crate::bot_state::AppState;
use crate::database::Database;
use crate::handlers::{command_handler, message_handler};
use crate::notify::WhatsappNotifier;
use crate::repository::PgReservationRepository;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Comandos disponíveis:")]
enum Command {
    #[command(description = "ver comandos")]
    Ajuda,
    #[command(description = "ver serviços disponíveis")]
    Servicos,
    #[command(description = "ver horários de atendimento")]
    Horarios,
    #[command(description = "iniciar novo agendamento")]
    Agendar,
    #[command(description = "cancelar um agendamento")]
    Cancelar,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting barbershop booking bot with PostgreSQL...");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = Database::new(&database_url).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    let state = AppState::new(
        Arc::new(PgReservationRepository::new(db)),
        Arc::new(WhatsappNotifier),
    );

    // The REST surface shares the repository and reminder scheduler with
    // the bot; it runs beside the dispatcher on the same runtime.
    let port: u16 = env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    let app = http::router(state.clone());
    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                log::info!("🚀 HTTP API listening on {}", addr);
                if let Err(err) = axum::serve(listener, app).await {
                    log::error!("❌ HTTP server error: {}", err);
                }
            }
            Err(err) => log::error!("❌ Could not bind HTTP port {}: {}", port, err),
        }
    });

    let bot = Bot::from_env();

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
