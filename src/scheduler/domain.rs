//! Planificador de Modos del dispositivo.
//!
//! Máquina de estados única del lado dispositivo. Es la dueña exclusiva de
//! `DeviceState`: todas las transiciones pasan por [`Scheduler::set_mode`],
//! nunca por asignación directa de campos, de modo que cada transición
//! re-evalúa temporizadores y señalización de estado.
//!
//! # Funcionalidades Principales
//! * **Tabla de perfiles:** cadencia de captura y calidad por modo.
//! * **Transiciones:** movimiento local, timeout de alerta, respuesta del
//!   servidor, comando directo del auxiliar.
//! * **Señalización:** indicador LED y mensajes de estado al puente serie.


use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{info, warn};
use crate::bridge::domain::{BridgeEvent, SerialMsg};
use crate::config::modes::{ACTIVE_INTERVAL, ACTIVE_QUALITY, ALERT_INTERVAL, ALERT_QUALITY,
                           ALERT_TIMEOUT, CAPTURE_FORMAT, CAPTURE_RESOLUTION,
                           STANDBY_INTERVAL, STANDBY_QUALITY};
use crate::protocol::domain::{Action, CaptureInfo, CommandResponse, FrameMetadata, Mode,
                              NextMode, SensorSnapshot, UploadFrame};


/// Perfil operativo de un modo: configuración, no lógica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    pub interval: Duration,
    pub quality: u8,
}

/// Tabla de perfiles por modo.
pub const fn profile(mode: Mode) -> ModeProfile {
    match mode {
        Mode::Standby => ModeProfile { interval: STANDBY_INTERVAL, quality: STANDBY_QUALITY },
        Mode::Alert => ModeProfile { interval: ALERT_INTERVAL, quality: ALERT_QUALITY },
        Mode::Active => ModeProfile { interval: ACTIVE_INTERVAL, quality: ACTIVE_QUALITY },
    }
}


/// Color del indicador de estado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLed {
    Red,
    Green,
    Amber,
    Blue,
}


/// Indicador de estado enchufable; el driver físico queda fuera del núcleo.
pub trait StatusIndicator: Send {
    fn set(&mut self, led: StatusLed);
}


/// Indicador por defecto: registra el cambio de color en el log.
#[derive(Debug, Default)]
pub struct TracingIndicator {
    last: Option<StatusLed>,
}

impl StatusIndicator for TracingIndicator {
    fn set(&mut self, led: StatusLed) {
        if self.last != Some(led) {
            info!("Info: indicador de estado -> {:?}", led);
            self.last = Some(led);
        }
    }
}


/// Estado local del dispositivo. Mutado únicamente por el planificador.
#[derive(Debug)]
pub struct DeviceState {
    pub mode: Mode,
    /// Contador monótono de capturas; arranca en 0 y se incrementa por captura.
    pub frame_seq: u64,
    pub last_capture: Instant,
    pub last_alert_trigger: Instant,
    /// `true` cuando el servidor fijó Alert suprimiendo el timeout local.
    pub remain_in_alert: bool,
    pub offline: bool,
    pub sensor: SensorSnapshot,
    pub last_upload_ts: i64,
}


pub struct Scheduler {
    device_id: String,
    pub state: DeviceState,
    tx_status: mpsc::Sender<SerialMsg>,
    indicator: Box<dyn StatusIndicator>,
}

impl Scheduler {
    pub fn new(device_id: String,
               tx_status: mpsc::Sender<SerialMsg>,
               indicator: Box<dyn StatusIndicator>,
               now: Instant) -> Self {

        Self {
            device_id,
            state: DeviceState {
                mode: Mode::Standby,
                frame_seq: 0,
                last_capture: now,
                last_alert_trigger: now,
                remain_in_alert: false,
                offline: false,
                sensor: SensorSnapshot::default(),
                last_upload_ts: 0,
            },
            tx_status,
            indicator,
        }
    }

    /// Cambia el modo operativo.
    ///
    /// Es idempotente: con el modo vigente no reinicia el temporizador de
    /// alerta ni re-emite estado. En un cambio real actualiza el modo,
    /// reinicia el temporizador si se entra a Alert, refresca el indicador
    /// y emite un mensaje de estado al puente.
    pub fn set_mode(&mut self, new_mode: Mode, now: Instant) {
        if new_mode == self.state.mode {
            return;
        }

        info!("Info: cambio de modo {} -> {}", self.state.mode, new_mode);
        self.state.mode = new_mode;

        if new_mode == Mode::Alert {
            self.state.last_alert_trigger = now;
        }

        self.refresh_indicator();
        self.emit_status();
    }

    pub fn due_for_capture(&self, now: Instant) -> bool {
        now.duration_since(self.state.last_capture) >= profile(self.state.mode).interval
    }

    pub fn current_quality(&self) -> u8 {
        profile(self.state.mode).quality
    }

    /// Reserva la secuencia de la próxima captura. Estrictamente creciente.
    pub fn begin_capture(&mut self) -> u64 {
        self.state.frame_seq += 1;
        self.state.frame_seq
    }

    /// Cierra el ciclo de captura: fija el instante y el timestamp de subida.
    pub fn mark_capture(&mut self, now: Instant, upload_ts: i64) {
        self.state.last_capture = now;
        self.state.last_upload_ts = upload_ts;
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.state.offline = offline;
    }

    /// Construye el frame de subida con la instantánea actual del estado.
    pub fn build_frame(&self, sequence: u64, image: Vec<u8>, timestamp_utc: i64) -> UploadFrame {
        UploadFrame {
            sequence,
            image,
            metadata: FrameMetadata {
                device_id: self.device_id.clone(),
                timestamp_utc,
                mode: Some(self.state.mode),
                seq: sequence,
                sensor: self.state.sensor,
                capture: CaptureInfo {
                    exposure_ms: 0,
                    resolution: CAPTURE_RESOLUTION.to_string(),
                    format: CAPTURE_FORMAT.to_string(),
                },
            },
        }
    }

    /// Aplica la respuesta del servidor.
    ///
    /// `remain_alert` fija el Alert vigente sin re-disparar la alerta; los
    /// tres modos directos limpian el fijado. `stop_stream` solo baja de
    /// Active a Standby.
    pub fn apply_response(&mut self, response: &CommandResponse, now: Instant) {
        if let Some(next_mode) = response.next_mode {
            match next_mode {
                NextMode::RemainAlert => {
                    self.state.remain_in_alert = true;
                    if self.state.mode != Mode::Alert {
                        self.set_mode(Mode::Alert, now);
                    }
                }
                NextMode::Standby => {
                    self.state.remain_in_alert = false;
                    self.set_mode(Mode::Standby, now);
                }
                NextMode::Alert => {
                    self.state.remain_in_alert = false;
                    self.set_mode(Mode::Alert, now);
                }
                NextMode::Active => {
                    self.state.remain_in_alert = false;
                    self.set_mode(Mode::Active, now);
                }
            }
        }

        match response.action {
            Action::StartStream => self.set_mode(Mode::Active, now),
            Action::StopStream => {
                if self.state.mode == Mode::Active {
                    self.set_mode(Mode::Standby, now);
                }
            }
            Action::None => {}
        }
    }

    /// Aplica un evento ya validado del puente serie.
    pub fn apply_bridge_event(&mut self, event: BridgeEvent, now: Instant) {
        match event {
            BridgeEvent::Sensor(snapshot) => {
                self.state.sensor = snapshot;
                if snapshot.motion && self.state.mode == Mode::Standby {
                    info!("Info: movimiento detectado por el auxiliar, entrando en alerta");
                    self.state.remain_in_alert = false;
                    self.set_mode(Mode::Alert, now);
                }
            }
            BridgeEvent::SetMode(mode) => {
                // Orden directa del auxiliar: no pasa por la lógica de detección.
                self.set_mode(mode, now);
            }
        }
    }

    /// Expira la alerta por tiempo cuando el servidor no la fijó.
    pub fn check_alert_timeout(&mut self, now: Instant) {
        if self.state.mode == Mode::Alert
            && !self.state.remain_in_alert
            && now.duration_since(self.state.last_alert_trigger) > ALERT_TIMEOUT
        {
            info!("Info: timeout de alerta, volviendo a standby");
            self.set_mode(Mode::Standby, now);
        }
    }

    pub fn refresh_indicator(&mut self) {
        let led = if self.state.offline {
            StatusLed::Red
        } else {
            match self.state.mode {
                Mode::Standby => StatusLed::Green,
                Mode::Alert => StatusLed::Amber,
                Mode::Active => StatusLed::Blue,
            }
        };
        self.indicator.set(led);
    }

    pub fn emit_status(&mut self) {
        let status = SerialMsg::Status {
            mode: self.state.mode,
            last_upload: self.state.last_upload_ts,
            seq: self.state.frame_seq,
            offline: self.state.offline,
        };

        if self.tx_status.try_send(status).is_err() {
            warn!("Warning: no se pudo encolar el estado hacia el puente");
        }
    }
}
