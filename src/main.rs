use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use riftpilot_lib::config::ConfigStore;
use riftpilot_lib::lcu::{LcuClient, LcuGateway};
use riftpilot_lib::logging::{init_logging, DEFAULT_LOG_DIR};
use riftpilot_lib::orchestrator::{Orchestrator, StdProcessExit, EXIT_CLEAN};
use riftpilot_lib::window::system_windows;
use riftpilot_lib::worker::{WorkerManager, WorkerRegistry};

fn main() {
  if let Some(path) = init_logging(Path::new(DEFAULT_LOG_DIR)) {
    info!("[Main] Logging to {}", path.display());
  }

  let config = ConfigStore::from_env();
  let install_dirs = match config.load() {
    Ok(loaded) => loaded.general.install_dirs(),
    Err(e) => {
      error!("[Config] Cannot start without {}: {}", config.path().display(), e);
      std::process::exit(1);
    }
  };

  // Gateway callbacks and handlers all run on this one thread.
  let runtime = match tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
  {
    Ok(runtime) => runtime,
    Err(e) => {
      error!("[Main] Failed to build runtime: {}", e);
      std::process::exit(1);
    }
  };

  runtime.block_on(async move {
    let client = match LcuClient::new() {
      Ok(client) => client,
      Err(e) => {
        error!("[Main] {}", e);
        std::process::exit(1);
      }
    };

    let workers = Arc::new(WorkerManager::new(
      WorkerRegistry::with_defaults(),
      config.clone(),
    ));
    let orch = Orchestrator::new(
      Arc::new(client.clone()),
      config,
      workers,
      system_windows(),
      Arc::new(StdProcessExit),
    );

    let dispatcher = orch.dispatcher();
    let (gateway, events) = LcuGateway::start(client, install_dirs, dispatcher.topics());
    let shutdown = orch.shutdown_coordinator();
    shutdown.attach_gateway(Arc::new(gateway));
    tokio::spawn(dispatcher.run(events));
    info!("[Main] Orchestrator running, press Ctrl+C to stop");

    let session = orch.session();
    let reason = tokio::select! {
      res = tokio::signal::ctrl_c() => {
        if let Err(e) = res {
          error!("[Main] Failed to listen for Ctrl+C: {}", e);
        }
        "operator interrupt"
      }
      _ = session.shutdown_requested() => "shutdown requested",
    };
    shutdown.shutdown(reason, EXIT_CLEAN).await;
  });
}
