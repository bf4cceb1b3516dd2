use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use gous::{
    AppState,
    cache::RedisCache,
    config::{Config, LogFormat, LogOutput},
    create_router,
    database::PgUserStore,
    services::AccountService,
};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    let config = Config::from_env().context("Failed to load configuration")?;

    // 初始化日志，文件输出时 guard 需要存活到进程结束
    let _log_guard = init_tracing(&config).context("Failed to initialize logging")?;
    tracing::info!(
        "Starting {} {} in {:?} mode",
        config.app_name,
        config.app_version,
        config.run_mode
    );

    // 设置数据库连接池
    let connect_options = config
        .database_url
        .parse::<PgConnectOptions>()
        .context("Invalid DATABASE_URL")?
        .application_name(&config.app_name);
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_open_conn)
        .min_connections(config.db_max_idle_conn)
        .idle_timeout(config.db_idle_timeout())
        .max_lifetime(config.db_max_lifetime())
        .connect_with(connect_options)
        .await
        .context("Failed to connect to Postgres")?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    // 设置 Redis 连接
    let redis = RedisCache::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;

    // 设置应用状态
    let accounts = AccountService::new(
        &config,
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(redis),
    );
    let state = AppState::new(config, accounts);

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    let app = create_router(state);

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    // RUST_LOG 优先于 LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let (writer, guard) = match config.log_output {
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), None),
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), None),
        LogOutput::File => {
            let (dir, prefix) = config.log_file_parts();
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(prefix)
                .max_log_files(config.log_save_days.max(1))
                .build(&dir)
                .with_context(|| format!("Failed to open log directory {}", dir.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
    };
    let ansi = config.log_output != LogOutput::File;

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init(),
    }
    Ok(guard)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
