use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use supabase_client::{AuthApi, SupabaseClient, SupabaseConfig};

mod config;
mod controllers;
mod rate_limit;
#[cfg(test)]
mod test_utils;

use config::Config;
use rate_limit::{Clock, CooldownLimiter, SystemClock};

pub struct AppState {
    pub config: Config,
    pub auth: Arc<dyn AuthApi>,
    pub login_limiter: CooldownLimiter,
    pub register_limiter: CooldownLimiter,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let port = config.port;

    log::info!("Connecting auth routes to {}", config.supabase_url);
    let auth: Arc<dyn AuthApi> = Arc::new(SupabaseClient::new(SupabaseConfig::new(
        &config.supabase_url,
        &config.supabase_anon_key,
    )));

    log::info!("Initializing {} cooldown store", config.cooldown_store.name());
    let store = rate_limit::open_store(&config.cooldown_store)
        .map_err(io::Error::other)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let login_limiter = CooldownLimiter::new("login", store.clone(), clock.clone(), config.cooldown_ms);
    let register_limiter =
        CooldownLimiter::new("register", store.clone(), clock.clone(), config.cooldown_ms);

    rate_limit::spawn_sweeper(
        store,
        clock,
        login_limiter.window(),
        Duration::from_secs(config.cooldown_sweep_secs),
    );

    let allowed_origin = config.base_url.clone();
    let state = web::Data::new(AppState {
        config,
        auth,
        login_limiter,
        register_limiter,
    });

    log::info!("Starting Map of Us backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::auth::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
