//! Cliente de subida del dispositivo.
//!
//! Un viaje por captura: conectar, enviar el frame codificado, intentar leer
//! una línea de respuesta. Todo acotado por timeouts cortos; cualquier fallo
//! se devuelve al planificador, que lo absorbe pasando a operación autónoma.


use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use crate::config::protocol::{CONNECT_TIMEOUT, READ_TIMEOUT, RESPONSE_LINE_BYTES};
use crate::protocol::domain::{CommandResponse, UploadFrame};
use crate::protocol::logic::{decode_response, encode_upload};
use super::domain::UploadError;


/// Sube un frame y espera la respuesta de comando.
///
/// # Flujo de Trabajo
/// 1. Conecta con timeout de conexión.
/// 2. Envía encabezado + imagen + metadatos en un solo buffer.
/// 3. Lee una línea de respuesta con timeout de lectura y la decodifica.
pub async fn upload_frame(server_addr: &str,
                          frame: &UploadFrame) -> Result<CommandResponse, UploadError> {

    let bytes = encode_upload(frame).map_err(UploadError::Encode)?;

    let mut stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(server_addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(UploadError::Io(e)),
        Err(_) => return Err(UploadError::ConnectTimeout),
    };

    stream.write_all(&bytes).await.map_err(UploadError::Io)?;
    debug!("Debug: frame {} enviado ({} bytes de imagen)", frame.sequence, frame.image.len());

    let mut reader = BufReader::new(stream);
    let mut line = Vec::with_capacity(RESPONSE_LINE_BYTES);

    match timeout(READ_TIMEOUT, reader.read_until(b'\n', &mut line)).await {
        Ok(Ok(0)) => Err(UploadError::EmptyResponse),
        Ok(Ok(_)) => decode_response(&line).map_err(UploadError::BadResponse),
        Ok(Err(e)) => Err(UploadError::Io(e)),
        Err(_) => Err(UploadError::ReadTimeout),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::domain::{FrameMetadata, NextMode};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn frame(seq: u64, image: Vec<u8>) -> UploadFrame {
        let metadata = FrameMetadata {
            device_id: "cam-1".to_string(),
            ..FrameMetadata::synthesized(seq, 1_765_000_000)
        };
        UploadFrame { sequence: seq, image, metadata }
    }

    async fn one_shot_server(reply: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut sink = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut sink).await;
            socket.write_all(reply).await.unwrap();
        });

        addr
    }

    #[tokio::test]
    async fn parsable_response_is_returned() {
        let addr = one_shot_server(
            b"{\"status\":\"ok\",\"frame\":\"5\",\"next_mode\":\"alert\",\"action\":\"none\",\
              \"message\":\"m\",\"detection\":{\"cat_detected\":true,\"confidence\":0.8,\"bbox\":null}}\n"
        ).await;

        let response = upload_frame(&addr, &frame(5, vec![7; 100])).await.unwrap();
        assert_eq!(response.next_mode, Some(NextMode::Alert));
        assert!(response.detection.cat_detected);
    }

    #[tokio::test]
    async fn refused_connection_is_an_error_not_a_panic() {
        // Puerto reservado y cerrado de inmediato: la conexión debe fallar.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = upload_frame(&addr, &frame(1, vec![0; 10])).await;
        assert!(matches!(result, Err(UploadError::Io(_)) | Err(UploadError::ConnectTimeout)));
    }

    #[tokio::test]
    async fn garbage_response_is_a_bad_response_error() {
        let addr = one_shot_server(b"esto no es json\n").await;
        let result = upload_frame(&addr, &frame(2, vec![0; 10])).await;
        assert!(matches!(result, Err(UploadError::BadResponse(_))));
    }

    #[tokio::test]
    async fn close_without_reply_is_an_empty_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut sink = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut sink).await;
            // Cierre sin respuesta.
        });

        let result = upload_frame(&addr, &frame(3, vec![0; 10])).await;
        assert!(matches!(result, Err(UploadError::EmptyResponse) | Err(UploadError::Io(_))));
    }
}
