use crate::error::{CliError, Result};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub enum FetchProgress {
    Started { total_size: Option<u64> },
    Downloading { downloaded: u64 },
}

/// Builds the download URL for a structure code.
pub fn file_url(base_url: &str, code: &str) -> String {
    format!("{}/{}.pdb", base_url.trim_end_matches('/'), code)
}

/// Downloads the text of a PDB file.
///
/// HTTP status failures and transport errors come back unchanged as
/// [`CliError::Network`].
pub async fn fetch_text(
    base_url: &str,
    code: &str,
    mut progress_callback: impl FnMut(FetchProgress),
) -> Result<String> {
    let url = file_url(base_url, code);
    info!("Sending request to {}", url);
    let client = reqwest::Client::new();
    let mut response = client.get(&url).send().await?.error_for_status()?;

    let total_size = response.content_length();
    progress_callback(FetchProgress::Started { total_size });

    let mut downloaded: u64 = 0;
    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        buffer.extend_from_slice(&chunk);
        downloaded += chunk.len() as u64;
        progress_callback(FetchProgress::Downloading { downloaded });
    }
    debug!(bytes = downloaded, "Download complete");

    String::from_utf8(buffer).map_err(|e| {
        CliError::Other(anyhow::anyhow!("Response from {} is not UTF-8: {}", url, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn url_joins_base_and_code() {
        assert_eq!(
            file_url("https://files.rcsb.org/view", "1LOL"),
            "https://files.rcsb.org/view/1LOL.pdb"
        );
        assert_eq!(file_url("http://mirror/", "1abc"), "http://mirror/1abc.pdb");
    }

    #[tokio::test]
    async fn unreachable_server_surfaces_network_error() {
        let result = fetch_text("http://127.0.0.1:9", "1LOL", |_| {}).await;
        assert!(matches!(result, Err(CliError::Network(_))));
    }

    #[tokio::test]
    async fn oversized_content_length_is_not_trusted() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1099511627776\r\n\r\nEND\n")
                .await;
        });

        let mut announced = None;
        let result = fetch_text(&format!("http://{}", addr), "1LOL", |progress| {
            if let FetchProgress::Started { total_size } = progress {
                announced = total_size;
            }
        })
        .await;
        assert_eq!(announced, Some(1 << 40));
        assert!(matches!(result, Err(CliError::Network(_))));
    }
}
