use actix_web::{App, HttpServer, web};
use tracing::info;

use density_cube::app_state::AppState;
use density_cube::config::ServiceConfig;
use density_cube::{init_logging, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = ServiceConfig::load().map_err(std::io::Error::other)?;
    init_logging(&config.log_filter);

    let (host, port) = (config.host.clone(), config.port);
    let cleanup_interval = config.cleanup_interval();
    let app_state = web::Data::new(AppState::new(config));

    // 启动后台清理任务：定期清理过期的网格，避免长期占用内存
    let cleanup_store = app_state.cube_store.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let cleaned_count = cleanup_store.cleanup_expired();
            if cleaned_count > 0 {
                info!(
                    cleaned_count,
                    remaining = cleanup_store.cube_count(),
                    "[清理任务] 已清理过期网格"
                );
            }
        }
    });

    info!("服务器启动在 http://{}:{}", host, port);
    info!(
        "网格 TTL: {} 分钟",
        app_state.cube_store.default_ttl().as_secs() / 60
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
