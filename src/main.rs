use std::process::ExitCode;

use addrgroup_service::config::ServiceConfig;
use addrgroup_service::logging::{self, Component};
use addrgroup_service::server;

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("addrgroup_service: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::info(
        Component::System,
        None,
        &format!(
            "starting on port {} (city trim: {:?})",
            config.server.listen_port, config.parser.city_trim
        ),
    );

    if let Err(e) = server::serve(config.server.listen_port, config.parse_options()) {
        logging::error(Component::System, None, &format!("server stopped: {}", e));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
