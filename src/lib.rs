#[macro_use]
mod logging;

pub mod activity;
pub mod io;
pub mod scheduler;
pub mod scrollback;
pub mod session;
pub mod settings;
pub mod ui;

use anyhow::Context;

use io::serial::{PortDirectory, SerialLink};
use session::SerialSession;
use settings::Settings;

/// Build the session from the OS serial layer and run the terminal UI on a
/// single-threaded runtime until the user quits.
pub fn run() -> anyhow::Result<()> {
    let settings = Settings::load();
    if settings.file_logging {
        if let Err(e) = logging::init_file_logging(&settings::logs_dir()) {
            tlog!("[logging] {}", e);
        }
    }
    tlog!(
        "[app] {} {} starting",
        session::APP_NAME,
        env!("CARGO_PKG_VERSION")
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build runtime")?;

    let mut session = SerialSession::new(PortDirectory::system(), SerialLink::system(), &settings);
    let result = runtime.block_on(async {
        session.startup();
        ui::run(&mut session).await
    });
    session.shutdown();

    tlog!("[app] Exiting");
    logging::stop_file_logging();
    result
}
