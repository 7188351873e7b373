use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // 提前加载 .env，使得 RUST_LOG / LOG_FORMAT 生效
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
    info!(service = "report_desk", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // Panic 钩子：捕获异常并输出错误日志
    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "report_desk",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // 线程数：config.toml，其次 TOKIO_WORKER_THREADS
    let worker_threads = match configs::AppConfig::load_or_default() {
        Ok(cfg) => cfg.server.worker_threads,
        Err(e) => {
            error!(service = "report_desk", event = "config_invalid", error = %e, "configuration rejected");
            return std::process::ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads { builder.worker_threads(w); }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "report_desk", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "report_desk",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "report desk starting"
    );

    rt.block_on(async move {
        let server_task = tokio::spawn(server::run());

        tokio::select! {
            res = server_task => match res {
                Ok(Ok(())) => {
                    info!(service = "report_desk", event = "stop", %service_id, pid, "server stopped normally");
                    std::process::ExitCode::SUCCESS
                }
                Ok(Err(e)) => {
                    error!(service = "report_desk", event = "run_failed", error = %e, "server::run returned error");
                    std::process::ExitCode::FAILURE
                }
                Err(e) => {
                    error!(service = "report_desk", event = "task_join_error", error = %e, "server task join error");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                // every write finishes with a rename, so stopping mid-request leaves the snapshot whole
                info!(service = "report_desk", event = "shutdown_signal", %service_id, pid, "received Ctrl+C, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}
