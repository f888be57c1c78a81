//! Client request handling

use crate::scheduler::Scheduler;
use core_types::Duration;
use node_api::{ClientRequest, IncomingRequest, NodeRuntime, Response};
use tracing::{debug, warn};

impl Scheduler {
    /// Polls the request server and answers every request received
    ///
    /// Returns how many requests were answered.
    pub(crate) fn serve_requests(&mut self, rt: &mut NodeRuntime<'_>, timeout: Duration) -> usize {
        let Some(handle) = self.context.server else {
            return 0;
        };

        let incoming = match rt.server.poll(&handle, timeout) {
            Ok(incoming) => incoming,
            Err(err) => {
                warn!(error = %err, "Request server poll failed");
                return 0;
            }
        };

        let mut answered = 0;
        for IncomingRequest { id, request } in incoming {
            debug!(request_id = id.0, request = ?request, "Handling client request");
            let response = self.handle_request(rt, request);
            match rt.server.respond(&handle, id, response) {
                Ok(()) => answered += 1,
                Err(err) => warn!(request_id = id.0, error = %err, "Failed to send response"),
            }
        }
        answered
    }

    /// Applies one client request
    pub fn handle_request(&mut self, rt: &mut NodeRuntime<'_>, request: ClientRequest) -> Response {
        match request {
            ClientRequest::Status => Response::Status(self.status()),
            ClientRequest::Shutdown => {
                self.stop();
                Response::Ack
            }
            _ if !self.is_running() => Response::Rejected {
                reason: "scheduler is stopping".to_string(),
            },
            ClientRequest::ChangeAllowedGroups { add, filter } => {
                self.change_allowed_groups(add, filter);
                Response::Ack
            }
            ClientRequest::ChangeMasterRole { promoting } => {
                match self.change_master_role(rt, promoting) {
                    Ok(_) => Response::Ack,
                    Err(err) => Response::Rejected {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }
}
