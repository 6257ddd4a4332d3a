use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use crate::protocol::domain::SensorSnapshot;
use super::domain::{BridgeEvent, SerialMsg};


/// Traduce una línea entrante del auxiliar a un evento del planificador.
///
/// # Retorno
/// * `None` para líneas malformadas, comandos desconocidos o mensajes que
///   no corresponden al sentido entrante (se registran y descartan).
pub fn parse_inbound_line(line: &str) -> Option<BridgeEvent> {
    let msg = match serde_json::from_str::<SerialMsg>(line) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Warning: línea serie malformada, descartada: {}", e);
            return None;
        }
    };

    match msg {
        SerialMsg::Sensor { motion, temp_c, humidity } => {
            Some(BridgeEvent::Sensor(SensorSnapshot {
                motion,
                temperature_c: temp_c,
                humidity,
            }))
        }
        SerialMsg::Command { cmd, mode } => {
            if cmd == "set_mode" {
                if let Some(mode) = mode {
                    return Some(BridgeEvent::SetMode(mode));
                }
            }
            warn!("Warning: comando serie desconocido, descartado: {:?}", cmd);
            None
        }
        SerialMsg::Status { .. } => {
            debug!("Debug: mensaje de estado entrante inesperado, descartado");
            None
        }
    }
}


pub async fn bridge_reader<R>(reader: R,
                              tx: mpsc::Sender<BridgeEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(event) = parse_inbound_line(line) {
                    if tx.send(event).await.is_err() {
                        info!("Info: planificador cerrado, terminando lector del puente");
                        return;
                    }
                }
            }
            Ok(None) => {
                info!("Info: enlace serie cerrado, terminando lector del puente");
                return;
            }
            Err(e) => {
                warn!("Warning: error de lectura del enlace serie: {}", e);
                return;
            }
        }
    }
}


pub async fn bridge_writer<W>(mut writer: W,
                              mut rx: mpsc::Receiver<SerialMsg>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let mut line = match serde_json::to_vec(&msg) {
            Ok(line) => line,
            Err(e) => {
                error!("Error: no se pudo serializar el mensaje de estado: {}", e);
                continue;
            }
        };
        line.push(b'\n');

        if let Err(e) = writer.write_all(&line).await {
            warn!("Warning: no se pudo escribir al enlace serie: {}", e);
            continue;
        }
        if let Err(e) = writer.flush().await {
            warn!("Warning: no se pudo vaciar el enlace serie: {}", e);
        }
    }
    info!("Info: canal de estado cerrado, terminando escritor del puente");
}


/// Inicializa las tareas del puente sobre el puerto configurado.
///
/// Si el puerto no puede abrirse el dispositivo sigue operando en forma
/// autónoma, sin sensores externos ni reporte de estado.
pub fn start_bridge(port_path: String,
                    tx_events: mpsc::Sender<BridgeEvent>,
                    rx_status: mpsc::Receiver<SerialMsg>) {

    info!("Info: iniciando puente serie sobre {}", port_path);

    let read_path = port_path.clone();
    tokio::spawn(async move {
        match OpenOptions::new().read(true).open(&read_path).await {
            Ok(port) => bridge_reader(BufReader::new(port), tx_events).await,
            Err(e) => error!("Error: no se pudo abrir {} para lectura: {}", read_path, e),
        }
    });

    tokio::spawn(async move {
        match OpenOptions::new().write(true).open(&port_path).await {
            Ok(port) => bridge_writer(port, rx_status).await,
            Err(e) => error!("Error: no se pudo abrir {} para escritura: {}", port_path, e),
        }
    });
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::domain::Mode;

    #[test]
    fn sensor_line_becomes_sensor_event() {
        let event = parse_inbound_line(
            r#"{"type":"sensor","motion":true,"temp_c":22.5,"humidity":48.0}"#
        ).unwrap();

        match event {
            BridgeEvent::Sensor(snapshot) => {
                assert!(snapshot.motion);
                assert_eq!(snapshot.temperature_c, 22.5);
                assert_eq!(snapshot.humidity, 48.0);
            }
            other => panic!("se esperaba Sensor, llegó {other:?}"),
        }
    }

    #[test]
    fn sensor_line_with_missing_fields_uses_defaults() {
        let event = parse_inbound_line(r#"{"type":"sensor"}"#).unwrap();
        match event {
            BridgeEvent::Sensor(snapshot) => {
                assert!(!snapshot.motion);
                assert_eq!(snapshot.temperature_c, 0.0);
            }
            other => panic!("se esperaba Sensor, llegó {other:?}"),
        }
    }

    #[test]
    fn set_mode_command_becomes_set_mode_event() {
        let event = parse_inbound_line(
            r#"{"type":"command","cmd":"set_mode","mode":"active"}"#
        ).unwrap();
        assert_eq!(event, BridgeEvent::SetMode(Mode::Active));
    }

    #[test]
    fn unknown_command_is_dropped() {
        assert!(parse_inbound_line(r#"{"type":"command","cmd":"reboot"}"#).is_none());
        assert!(parse_inbound_line(r#"{"type":"command","cmd":"set_mode"}"#).is_none());
    }

    #[test]
    fn malformed_lines_are_dropped() {
        assert!(parse_inbound_line("no soy json").is_none());
        assert!(parse_inbound_line(r#"{"type":"sensor","motion":"tal vez"}"#).is_none());
        assert!(parse_inbound_line(r#"{"type":"command","cmd":"set_mode","mode":"volar"}"#).is_none());
    }

    #[test]
    fn status_message_serializes_with_expected_shape() {
        let status = SerialMsg::Status {
            mode: Mode::Alert,
            last_upload: 1_765_000_000,
            seq: 12,
            offline: false,
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&status).unwrap()).unwrap();

        assert_eq!(value["type"], "status");
        assert_eq!(value["mode"], "alert");
        assert_eq!(value["last_upload"], 1_765_000_000);
        assert_eq!(value["seq"], 12);
        assert_eq!(value["offline"], false);
    }

    #[tokio::test]
    async fn reader_feeds_events_and_skips_garbage() {
        let (tx, mut rx) = mpsc::channel(8);
        let input = b"{\"type\":\"sensor\",\"motion\":true}\nbasura\n{\"type\":\"command\",\"cmd\":\"set_mode\",\"mode\":\"standby\"}\n";

        bridge_reader(BufReader::new(&input[..]), tx).await;

        assert!(matches!(rx.recv().await, Some(BridgeEvent::Sensor(s)) if s.motion));
        assert_eq!(rx.recv().await, Some(BridgeEvent::SetMode(Mode::Standby)));
        assert_eq!(rx.recv().await, None);
    }
}
