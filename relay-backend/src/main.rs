use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod ai;
mod channels;
mod config;
mod controllers;
mod db;
mod graph;
mod models;

use ai::{CompletionClient, InMemoryConversationStore, OpenAICompatClient, ReplyGenerator};
use channels::{GraphSender, OutboundSender, WebhookDispatcher};
use config::Config;
use db::Database;
use graph::GraphClient;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub graph: GraphClient,
    pub dispatcher: Arc<WebhookDispatcher>,
}

fn build_replier(config: &Config) -> std::io::Result<CompletionClient> {
    let api = OpenAICompatClient::new(
        &config.completion_api_key,
        &config.completion_endpoint,
        &config.completion_model,
        Duration::from_secs(config.http_timeout_secs),
    )
    .map_err(std::io::Error::other)?;

    let client = CompletionClient::new(api, config.system_prompt.clone());
    if config.chat_memory_turns == 0 {
        log::info!("Rolling chat memory disabled");
        return Ok(client);
    }

    log::info!("Rolling chat memory enabled ({} turns per conversation)", config.chat_memory_turns);
    Ok(client.with_memory(Arc::new(InMemoryConversationStore::new(config.chat_memory_turns))))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).map_err(std::io::Error::other)?;
    let db = Arc::new(db);

    log::info!(
        "Using Graph API {} at {}",
        config.api_version,
        config.graph_api_base
    );
    let graph = GraphClient::from_config(&config).map_err(std::io::Error::other)?;

    log::info!(
        "Using completion endpoint {} with model {}",
        config.completion_endpoint,
        config.completion_model
    );
    let replier: Arc<dyn ReplyGenerator> = Arc::new(build_replier(&config)?);
    let sender: Arc<dyn OutboundSender> = Arc::new(GraphSender::new(graph.clone()));
    let dispatcher = Arc::new(WebhookDispatcher::new(db.clone(), replier, sender));

    if config.verify_webhook_signature {
        log::info!("Webhook signature verification enabled");
    }
    log::info!("Meta Chatbot running on port {} (public URL {})", port, config.base_url);

    let state = web::Data::new(AppState {
        db,
        config,
        graph,
        dispatcher,
    });

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::oauth::config)
            .configure(controllers::whatsapp::config)
            .configure(controllers::webhook::config)
            .configure(controllers::messages::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
