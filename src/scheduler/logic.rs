//! Bucle cooperativo del dispositivo.
//!
//! Un único tick realiza, en orden: (a) captura disparada por temporizador,
//! (b) drenaje de los eventos pendientes del puente, (c) chequeo del timeout
//! de alerta, (d) refresco del indicador, y suspende un intervalo corto fijo.
//! `DeviceState` se toca exclusivamente desde este bucle; el único punto de
//! suspensión real es el viaje de red acotado de la subida.


use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};
use crate::bridge::domain::{BridgeEvent, SerialMsg};
use crate::camera::domain::Camera;
use crate::config::modes::{STATUS_EVERY_TICKS, TICK};
use crate::uplink::logic::upload_frame;
use super::domain::{Scheduler, TracingIndicator};


/// Un ciclo de captura y subida.
///
/// El fallo nunca es fatal: cualquier problema de captura o de red deja al
/// dispositivo en `offline` con el modo local intacto, operando en forma
/// autónoma con sus sensores y temporizadores.
pub async fn capture_cycle<C: Camera>(scheduler: &mut Scheduler,
                                      camera: &mut C,
                                      server_addr: &str) {

    let quality = scheduler.current_quality();
    let sequence = scheduler.begin_capture();

    match camera.capture(quality) {
        Ok(image) => {
            let frame = scheduler.build_frame(sequence, image, Utc::now().timestamp());

            match upload_frame(server_addr, &frame).await {
                Ok(response) => {
                    scheduler.set_offline(false);
                    scheduler.apply_response(&response, Instant::now());
                }
                Err(e) => {
                    warn!("Warning: subida del frame {} fallida: {}", sequence, e);
                    scheduler.set_offline(true);
                }
            }
        }
        Err(e) => {
            error!("Error: captura del frame {} fallida: {}", sequence, e);
            scheduler.set_offline(true);
        }
    }

    scheduler.mark_capture(Instant::now(), Utc::now().timestamp());
    scheduler.emit_status();
    info!("Info: frame {} capturado en modo {}", sequence, scheduler.state.mode);
}


/// Ejecuta el bucle principal del dispositivo. No retorna.
pub async fn run_scheduler<C: Camera>(device_id: String,
                                      server_addr: String,
                                      mut camera: C,
                                      mut rx_bridge: mpsc::Receiver<BridgeEvent>,
                                      tx_status: mpsc::Sender<SerialMsg>) {

    let mut scheduler = Scheduler::new(
        device_id,
        tx_status,
        Box::new(TracingIndicator::default()),
        Instant::now(),
    );
    let mut ticks: u32 = 0;

    info!("Info: planificador iniciado en modo {}", scheduler.state.mode);
    scheduler.refresh_indicator();
    scheduler.emit_status();

    loop {
        if scheduler.due_for_capture(Instant::now()) {
            capture_cycle(&mut scheduler, &mut camera, &server_addr).await;
        }

        while let Ok(event) = rx_bridge.try_recv() {
            scheduler.apply_bridge_event(event, Instant::now());
        }

        scheduler.check_alert_timeout(Instant::now());
        scheduler.refresh_indicator();

        ticks = ticks.wrapping_add(1);
        if ticks % STATUS_EVERY_TICKS == 0 {
            scheduler.emit_status();
        }

        sleep(TICK).await;
    }
}
