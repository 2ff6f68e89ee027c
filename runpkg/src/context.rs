use runpkg_core::{Context, OsEnv};
use runpkg_file_read_tokio::TokioFileRead;
use runpkg_http_send_reqwest::ReqwestHttpSend;

/// Create a context backed by the process environment, tokio file reads
/// and a default reqwest client.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::new(reqwest::Client::new()))
        .with_env(OsEnv)
}
