//! Backend commands queued from UI to backend worker.

use client_core::GatewayRequest;

use crate::controller::events::UiErrorContext;

#[derive(Debug)]
pub enum BackendCommand {
    Gateway(GatewayRequest),
    /// Abort in-flight requests and stop the worker.
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gateway(request) => request.kind().name(),
            Self::Shutdown => "shutdown",
        }
    }

    pub fn error_context(&self) -> UiErrorContext {
        match self {
            Self::Gateway(request) => UiErrorContext::for_request(request.kind()),
            Self::Shutdown => UiErrorContext::General,
        }
    }
}
