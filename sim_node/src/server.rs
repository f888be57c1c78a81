//! Simulated request server
//!
//! Clients are simulated by [`SimRequestServer::submit`]; requests wait in
//! an inbox until the scheduler polls. Poll timeouts and responses are
//! recorded for inspection, and nothing ever blocks.

use crate::fault_injection::ServerFault;
use core_types::Duration;
use node_api::{
    ClientRequest, IncomingRequest, RequestId, RequestServer, Response, ServerError, ServerHandle,
};
use std::collections::VecDeque;
use tracing::debug;

/// In-memory request server
#[derive(Debug, Default)]
pub struct SimRequestServer {
    bind_failure: bool,
    poll_failures: usize,
    handle: Option<ServerHandle>,
    port: Option<u16>,
    next_handle: u64,
    next_request: u64,
    inbox: VecDeque<IncomingRequest>,
    poll_timeouts: Vec<Duration>,
    responses: Vec<(RequestId, Response)>,
    closed: bool,
}

impl SimRequestServer {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            next_request: 1,
            ..Self::default()
        }
    }

    /// Applies server faults
    pub fn with_faults(mut self, faults: Vec<ServerFault>) -> Self {
        for fault in faults {
            match fault {
                ServerFault::BindFailure => self.bind_failure = true,
                ServerFault::PollFailure { count } => self.poll_failures += count,
            }
        }
        self
    }

    /// Queues a client request; returns its correlation ID
    pub fn submit(&mut self, request: ClientRequest) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        self.inbox.push_back(IncomingRequest { id, request });
        id
    }

    /// Returns every timeout passed to `poll`, oldest first
    pub fn poll_timeouts(&self) -> &[Duration] {
        &self.poll_timeouts
    }

    /// Returns every response sent, oldest first
    pub fn responses(&self) -> &[(RequestId, Response)] {
        &self.responses
    }

    /// Returns the response sent for `id`, if any
    pub fn response_to(&self, id: RequestId) -> Option<&Response> {
        self.responses
            .iter()
            .find(|(request, _)| *request == id)
            .map(|(_, response)| response)
    }

    /// Returns the bound port while the server is started
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Checks if the server was started and then closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_handle(&self, handle: &ServerHandle) -> Result<(), ServerError> {
        if self.handle.as_ref() == Some(handle) {
            Ok(())
        } else {
            Err(ServerError::UnknownHandle(*handle))
        }
    }
}

impl RequestServer for SimRequestServer {
    fn start(&mut self, port: u16) -> Result<ServerHandle, ServerError> {
        if self.bind_failure {
            return Err(ServerError::Bind {
                port,
                reason: "address already in use".to_string(),
            });
        }

        let handle = ServerHandle::new(self.next_handle);
        self.next_handle += 1;
        self.handle = Some(handle);
        self.port = Some(port);
        self.closed = false;
        debug!(port, handle = %handle, "Request server listening");
        Ok(handle)
    }

    fn poll(
        &mut self,
        handle: &ServerHandle,
        timeout: Duration,
    ) -> Result<Vec<IncomingRequest>, ServerError> {
        self.check_handle(handle)?;
        self.poll_timeouts.push(timeout);

        if self.poll_failures > 0 {
            self.poll_failures -= 1;
            return Err(ServerError::Transport("connection reset".to_string()));
        }
        Ok(self.inbox.drain(..).collect())
    }

    fn respond(
        &mut self,
        handle: &ServerHandle,
        id: RequestId,
        response: Response,
    ) -> Result<(), ServerError> {
        self.check_handle(handle)?;
        self.responses.push((id, response));
        Ok(())
    }

    fn close(&mut self, handle: ServerHandle) {
        if self.handle == Some(handle) {
            self.handle = None;
            self.port = None;
            self.closed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_poll() {
        let mut server = SimRequestServer::new();
        let handle = server.start(7400).unwrap();
        assert_eq!(server.port(), Some(7400));

        let id = server.submit(ClientRequest::Status);
        let polled = server.poll(&handle, Duration::ZERO).unwrap();
        assert_eq!(polled, vec![IncomingRequest { id, request: ClientRequest::Status }]);
        assert!(server.poll(&handle, Duration::from_millis(250)).unwrap().is_empty());
        assert_eq!(
            server.poll_timeouts(),
            &[Duration::ZERO, Duration::from_millis(250)]
        );
    }

    #[test]
    fn test_bind_failure() {
        let mut server = SimRequestServer::new().with_faults(vec![ServerFault::BindFailure]);
        assert!(matches!(
            server.start(7400),
            Err(ServerError::Bind { port: 7400, .. })
        ));
    }

    #[test]
    fn test_poll_failure_then_recovery() {
        let mut server =
            SimRequestServer::new().with_faults(vec![ServerFault::PollFailure { count: 1 }]);
        let handle = server.start(1).unwrap();
        server.submit(ClientRequest::Shutdown);

        assert!(matches!(
            server.poll(&handle, Duration::ZERO),
            Err(ServerError::Transport(_))
        ));
        assert_eq!(server.poll(&handle, Duration::ZERO).unwrap().len(), 1);
    }

    #[test]
    fn test_closed_handle_is_rejected() {
        let mut server = SimRequestServer::new();
        let handle = server.start(1).unwrap();
        server.close(handle);

        assert!(server.is_closed());
        assert_eq!(
            server.poll(&handle, Duration::ZERO),
            Err(ServerError::UnknownHandle(handle))
        );
        assert!(server
            .respond(&handle, RequestId(1), Response::Ack)
            .is_err());
    }
}
