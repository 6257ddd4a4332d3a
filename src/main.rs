use std::sync::Arc;
use tracing::{error, info};
use crate::bridge::logic::start_bridge;
use crate::camera::domain::FileCamera;
use crate::channels::domain::Channels;
use crate::context::domain::AppContext;
use crate::scheduler::logic::run_scheduler;
use crate::server::logic::run_listener;
use crate::system::domain::{init_tracing, Role, System};

mod bridge;
mod camera;
mod channels;
mod classifier;
mod config;
mod context;
mod database;
mod decision;
mod protocol;
mod scheduler;
mod server;
mod system;
mod uplink;


#[tokio::main]
async fn main() {

    let system = Arc::new(System::new().expect("no se pudo cargar la configuración"));
    init_tracing(&system);

    match system.role {
        Role::Device => run_device(system).await,
        Role::Server => run_server(system).await,
    }
}


async fn run_device(system: Arc<System>) {

    info!("Info: iniciando rol dispositivo ({})", system.device_id);

    let channels = Channels::new();

    start_bridge(system.serial_port.clone(),
                 channels.bridge_to_scheduler,
                 channels.bridge_from_scheduler);

    let camera = FileCamera::new(system.camera_source.clone());

    run_scheduler(system.device_id.clone(),
                  system.server_addr.clone(),
                  camera,
                  channels.scheduler_from_bridge,
                  channels.scheduler_to_bridge).await;
}


async fn run_server(system: Arc<System>) {

    info!("Info: iniciando rol servidor");

    let ctx = AppContext::new(system).await;

    if let Err(e) = run_listener(ctx).await {
        error!("Error: no se pudo tomar el socket de escucha: {}", e);
        std::process::exit(1);
    }
}
