//! Codec del frame de subida y de la respuesta de comando.
//!
//! Forma en cable del frame, fijada por el firmware:
//! 1. Una línea ASCII `"<secuencia>,<longitud_imagen>\n"`.
//! 2. Exactamente `longitud_imagen` bytes crudos de imagen.
//! 3. Opcionalmente, un documento JSON de metadatos, acotado por el timeout
//!    de lectura de la conexión. Ausente o inparseable ⇒ se sintetiza.
//!
//! La respuesta es un único documento JSON terminado en `\n`.


use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::{timeout, Duration};
use tracing::debug;
use crate::config::protocol::{MAX_IMAGE_BYTES, METADATA_BUF_BYTES};
use super::domain::{CommandResponse, FrameError, FrameMetadata, UploadFrame};


/// Serializa un frame completo a bytes listos para enviar.
///
/// # Retorno
/// * Encabezado + imagen + metadatos JSON, en un único buffer contiguo.
pub fn encode_upload(frame: &UploadFrame) -> Result<Vec<u8>, serde_json::Error> {
    let metadata = serde_json::to_vec(&frame.metadata)?;
    let header = format!("{},{}\n", frame.sequence, frame.image.len());

    let mut out = Vec::with_capacity(header.len() + frame.image.len() + metadata.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&frame.image);
    out.extend_from_slice(&metadata);
    Ok(out)
}


/// Decodifica un frame desde un stream de lectura.
///
/// # Flujo de Trabajo
/// 1. Lee la línea de encabezado y valida `<secuencia>,<longitud>`.
/// 2. Lee exactamente la longitud declarada de bytes de imagen, contando
///    lo realmente recibido para poder reportar truncamientos.
/// 3. Intenta leer el documento de metadatos dentro de `metadata_wait`;
///    si no llega o no parsea, sintetiza metadatos por defecto.
///
/// # Argumentos
/// * `reader`: mitad de lectura de la conexión, con buffer.
/// * `read_timeout`: cota por operación de lectura del cuerpo.
/// * `metadata_wait`: espera máxima por el documento de metadatos opcional.
pub async fn decode_upload<R>(reader: &mut R,
                              read_timeout: Duration,
                              metadata_wait: Duration) -> Result<UploadFrame, FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let (sequence, length) = read_header(reader, read_timeout).await?;

    if length > MAX_IMAGE_BYTES {
        return Err(FrameError::BadHeader(
            format!("longitud declarada {length} excede el límite {MAX_IMAGE_BYTES}")
        ));
    }

    let image = read_body(reader, length, read_timeout).await?;
    let metadata = read_metadata(reader, sequence, metadata_wait).await;

    Ok(UploadFrame { sequence, image, metadata })
}


async fn read_header<R>(reader: &mut R,
                        read_timeout: Duration) -> Result<(u64, usize), FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();

    let n = match timeout(read_timeout, reader.read_until(b'\n', &mut line)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(FrameError::BadHeader(format!("error de lectura: {e}"))),
        Err(_) => return Err(FrameError::BadHeader("timeout leyendo encabezado".to_string())),
    };

    if n == 0 {
        return Err(FrameError::BadHeader("conexión cerrada antes del encabezado".to_string()));
    }

    let text = String::from_utf8_lossy(&line);
    let text = text.trim();

    let (seq_part, len_part) = text
        .split_once(',')
        .ok_or_else(|| FrameError::BadHeader(format!("sin coma: {text:?}")))?;

    let sequence: u64 = seq_part.trim().parse()
        .map_err(|_| FrameError::BadHeader(format!("secuencia no numérica: {seq_part:?}")))?;
    let length: usize = len_part.trim().parse()
        .map_err(|_| FrameError::BadHeader(format!("longitud no numérica: {len_part:?}")))?;

    Ok((sequence, length))
}


async fn read_body<R>(reader: &mut R,
                      expected: usize,
                      read_timeout: Duration) -> Result<Vec<u8>, FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let mut image = vec![0u8; expected];
    let mut actual = 0usize;

    while actual < expected {
        match timeout(read_timeout, reader.read(&mut image[actual..])).await {
            Ok(Ok(0)) => return Err(FrameError::Truncated { expected, actual }),
            Ok(Ok(n)) => actual += n,
            Ok(Err(_)) | Err(_) => return Err(FrameError::Truncated { expected, actual }),
        }
    }

    Ok(image)
}


/// El documento de metadatos es opcional: cualquier fallo aquí degrada a
/// metadatos sintetizados, nunca a un error de frame.
async fn read_metadata<R>(reader: &mut R,
                          sequence: u64,
                          metadata_wait: Duration) -> FrameMetadata
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = vec![0u8; METADATA_BUF_BYTES];

    let n = match timeout(metadata_wait, reader.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => n,
        _ => {
            debug!("Debug: frame {} sin documento de metadatos", sequence);
            return FrameMetadata::synthesized(sequence, Utc::now().timestamp());
        }
    };

    match serde_json::from_slice::<FrameMetadata>(&buf[..n]) {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!("Debug: metadatos inparseables del frame {}: {}", sequence, e);
            FrameMetadata::synthesized(sequence, Utc::now().timestamp())
        }
    }
}


/// Serializa la respuesta de comando como un documento JSON + `\n`.
pub fn encode_response(response: &CommandResponse) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec(response)?;
    out.push(b'\n');
    Ok(out)
}


/// Decodifica una línea de respuesta. El llamador decide qué hacer con el
/// fallo; del lado del dispositivo equivale a "sin respuesta".
pub fn decode_response(line: &[u8]) -> Result<CommandResponse, serde_json::Error> {
    serde_json::from_slice(line)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::domain::{Action, Mode, NextMode, SensorSnapshot, CaptureInfo, Detection};
    use tokio::io::{AsyncWriteExt, BufReader};

    const READ_TIMEOUT: Duration = Duration::from_millis(500);
    const META_WAIT: Duration = Duration::from_millis(100);

    fn sample_frame(image_len: usize) -> UploadFrame {
        UploadFrame {
            sequence: 42,
            image: (0..image_len).map(|i| (i % 251) as u8).collect(),
            metadata: FrameMetadata {
                device_id: "nicla-catcam-001".to_string(),
                timestamp_utc: 1_765_000_000,
                mode: Some(Mode::Alert),
                seq: 42,
                sensor: SensorSnapshot { motion: true, temperature_c: 21.5, humidity: 40.0 },
                capture: CaptureInfo {
                    exposure_ms: 0,
                    resolution: "320x240".to_string(),
                    format: "jpg".to_string(),
                },
            },
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_image_and_sequence() {
        let frame = sample_frame(1000);
        let bytes = encode_upload(&frame).unwrap();

        let (mut tx, rx) = tokio::io::duplex(16 * 1024);
        tx.write_all(&bytes).await.unwrap();
        drop(tx);

        let mut reader = BufReader::new(rx);
        let decoded = decode_upload(&mut reader, READ_TIMEOUT, META_WAIT).await.unwrap();

        assert_eq!(decoded.sequence, 42);
        assert_eq!(decoded.image, frame.image);
        assert_eq!(decoded.metadata, frame.metadata);
    }

    #[tokio::test]
    async fn truncated_body_reports_both_counts() {
        let (mut tx, rx) = tokio::io::duplex(16 * 1024);
        tx.write_all(b"7,1000\n").await.unwrap();
        tx.write_all(&[0xAB; 500]).await.unwrap();
        drop(tx);

        let mut reader = BufReader::new(rx);
        let err = decode_upload(&mut reader, READ_TIMEOUT, META_WAIT).await.unwrap_err();

        match err {
            FrameError::Truncated { expected, actual } => {
                assert_eq!(expected, 1000);
                assert_eq!(actual, 500);
            }
            other => panic!("se esperaba Truncated, llegó {other:?}"),
        }
    }

    #[tokio::test]
    async fn header_without_comma_is_rejected() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        tx.write_all(b"12 500\n").await.unwrap();
        drop(tx);

        let mut reader = BufReader::new(rx);
        let err = decode_upload(&mut reader, READ_TIMEOUT, META_WAIT).await.unwrap_err();
        assert!(matches!(err, FrameError::BadHeader(_)));
    }

    #[tokio::test]
    async fn header_with_non_integer_fields_is_rejected() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        tx.write_all(b"abc,def\n").await.unwrap();
        drop(tx);

        let mut reader = BufReader::new(rx);
        let err = decode_upload(&mut reader, READ_TIMEOUT, META_WAIT).await.unwrap_err();
        assert!(matches!(err, FrameError::BadHeader(_)));
    }

    #[tokio::test]
    async fn oversize_declared_length_is_rejected() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        let header = format!("1,{}\n", MAX_IMAGE_BYTES + 1);
        tx.write_all(header.as_bytes()).await.unwrap();
        drop(tx);

        let mut reader = BufReader::new(rx);
        let err = decode_upload(&mut reader, READ_TIMEOUT, META_WAIT).await.unwrap_err();
        assert!(matches!(err, FrameError::BadHeader(_)));
    }

    #[tokio::test]
    async fn missing_metadata_is_synthesized() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        tx.write_all(b"9,4\n").await.unwrap();
        tx.write_all(&[1, 2, 3, 4]).await.unwrap();
        drop(tx);

        let mut reader = BufReader::new(rx);
        let decoded = decode_upload(&mut reader, READ_TIMEOUT, META_WAIT).await.unwrap();

        assert_eq!(decoded.sequence, 9);
        assert_eq!(decoded.metadata.device_id, "unknown");
        assert_eq!(decoded.metadata.mode, None);
        assert_eq!(decoded.metadata.seq, 9);
        assert!(!decoded.metadata.sensor.motion);
    }

    #[tokio::test]
    async fn unparseable_metadata_is_synthesized() {
        let (mut tx, rx) = tokio::io::duplex(1024);
        tx.write_all(b"3,2\n").await.unwrap();
        tx.write_all(&[9, 9]).await.unwrap();
        tx.write_all(b"{esto no es json").await.unwrap();
        drop(tx);

        let mut reader = BufReader::new(rx);
        let decoded = decode_upload(&mut reader, READ_TIMEOUT, META_WAIT).await.unwrap();
        assert_eq!(decoded.metadata.device_id, "unknown");
        assert_eq!(decoded.metadata.mode, None);
    }

    #[test]
    fn response_round_trip() {
        let response = CommandResponse {
            status: "ok".to_string(),
            frame: "42".to_string(),
            next_mode: Some(NextMode::RemainAlert),
            action: Action::None,
            message: "Detection in progress - remaining in alert".to_string(),
            detection: Detection { cat_detected: true, confidence: 0.8, bbox: None },
        };

        let bytes = encode_response(&response).unwrap();
        assert_eq!(*bytes.last().unwrap(), b'\n');

        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn garbage_response_fails_to_decode() {
        assert!(decode_response(b"no soy json\n").is_err());
        assert!(decode_response(b"").is_err());
    }

    #[test]
    fn response_with_minimal_fields_decodes_with_defaults() {
        let decoded = decode_response(br#"{"status":"ok"}"#).unwrap();
        assert_eq!(decoded.next_mode, None);
        assert_eq!(decoded.action, Action::None);
        assert!(!decoded.detection.cat_detected);
    }
}
