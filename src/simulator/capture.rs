use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of a single read from a simulator pipe.
const CHUNK_SIZE: usize = 8 * 1024;

/// Output of a stream read by [`capture_bounded`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Retained bytes, at most the configured limit.
    pub bytes: Vec<u8>,
    /// Number of bytes read past the limit and dropped.
    pub discarded: u64,
}

impl CapturedOutput {
    /// Whether any output was dropped.
    pub fn is_truncated(&self) -> bool {
        self.discarded > 0
    }

    /// The retained bytes as text, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Reads `reader` to EOF, keeping at most `limit` bytes.
///
/// The stream is always drained so the writer never blocks on a full pipe, but nothing past
/// `limit` is buffered.
pub async fn capture_bounded<R>(mut reader: R, limit: usize) -> std::io::Result<CapturedOutput>
where
    R: AsyncRead + Unpin,
{
    let mut output = CapturedOutput::default();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            break;
        }

        let keep = read.min(limit - output.bytes.len());
        output.bytes.extend_from_slice(&chunk[..keep]);
        output.discarded += (read - keep) as u64;
    }

    Ok(output)
}
