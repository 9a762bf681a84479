mod chart;
mod commands;
mod config;
mod error;
mod format;
mod healthcheck;
mod model;
mod sanitize;
mod store;

use std::env;
use std::process::exit;
use std::sync::Arc;

use log::{error, info};
use serenity::async_trait;
use serenity::builder::{CreateAttachment, CreateMessage};
use serenity::client::{Client, Context, EventHandler};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::GatewayIntents;

use crate::commands::Reply;
use crate::config::{CensusMode, Config};
use crate::store::{MongoStore, RecordStore};

struct Handler {
    store: Arc<dyn RecordStore>,
    census_mode: CensusMode,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, data_about_bot: Ready) {
        info!("Logged in as {}", data_about_bot.user.name);
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        // Never react to our own output.
        if new_message.author.id == ctx.cache.current_user().id {
            return;
        }

        info!("{}", new_message.content);
        let reply =
            commands::respond(self.store.as_ref(), self.census_mode, &new_message.content).await;
        match reply {
            Ok(None) => {}
            Ok(Some(Reply::Text(text))) => {
                if let Err(e) = new_message.channel_id.say(&ctx.http, text).await {
                    error!("sending reply for {:?} failed: {e}", new_message.content);
                }
            }
            Ok(Some(Reply::Chart(artifact))) => {
                match CreateAttachment::path(artifact.path()).await {
                    Ok(attachment) => {
                        if let Err(e) = new_message
                            .channel_id
                            .send_files(&ctx.http, [attachment], CreateMessage::new())
                            .await
                        {
                            error!("sending chart for {:?} failed: {e}", new_message.content);
                        }
                    }
                    Err(e) => {
                        error!("reading chart for {:?} failed: {e}", new_message.content);
                    }
                }
                // artifact drops here, removing the temp file whether or
                // not the send succeeded
            }
            Err(e) => {
                error!("command {:?} failed: {e}", new_message.content);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init_timed();

    for argument in env::args() {
        match argument.to_lowercase().as_str() {
            "serve" => {
                exit(serve().await);
            }
            "healthcheck" => {
                exit(healthcheck::healthcheck().await);
            }
            &_ => {}
        }
    }
    error!("Usage: clanstats [serve|healthcheck]");
}

async fn serve() -> i32 {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return 1;
        }
    };

    let mongo = match mongodb::Client::with_uri_str(&config.mongodb_url).await {
        Ok(client) => client,
        Err(e) => {
            error!("connecting to the records store failed: {e}");
            return 1;
        }
    };
    let store: Arc<dyn RecordStore> = Arc::new(MongoStore::new(&mongo.database(&config.db_name)));

    tokio::spawn(healthcheck::run(config.keepalive_port));

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let handler = Handler {
        store,
        census_mode: config.census_mode,
    };

    let client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await;
    let mut client = match client {
        Ok(client) => client,
        Err(e) => {
            error!("building the gateway client failed: {e}");
            return 1;
        }
    };
    if let Err(e) = client.start().await {
        error!("gateway connection ended: {e}");
        return 1;
    }

    0
}
