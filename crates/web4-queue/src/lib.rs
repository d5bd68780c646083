//! Offline pairing request queue.
//!
//! Storage keys are `queue/<priority digit>/<enqueued_at BE>/<request_id>`,
//! so sled's ordered iteration yields priority classes first and FIFO order
//! within a class. Timeouts are observed lazily at dequeue time.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use web4_core::constants::{QUEUE_BATCH_SIZE, QUEUE_DEFAULT_TTL_NS, QUEUE_MAX_RETRIES};
use web4_core::error::LedgerError;
use web4_core::event::Event;
use web4_core::transaction::QueuePriority;
use web4_core::types::{ComponentId, RequestId, TimestampNs};
use web4_crypto::sha256_concat;
use web4_store::{keys, Overlay};

// ── Records ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Processed,
    Cancelled,
    Timeout,
}

/// One queued offline pairing request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QueuedPairingRequest {
    pub request_id: RequestId,
    pub component_a: ComponentId,
    pub component_b: ComponentId,
    pub operational_context: String,
    pub proxy_id: Option<ComponentId>,
    pub priority: QueuePriority,
    pub status: RequestStatus,
    /// Identity that queued the request; used as the trust anchor when the
    /// pairing is eventually created.
    pub requested_by: String,
    pub enqueued_at: TimestampNs,
    pub timeout_at: TimestampNs,
    pub retries: u32,
    pub cancel_reason: Option<String>,
}

/// Summary of one `process_offline_queue` run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueRunReport {
    pub processed: u64,
    pub failed: u64,
    pub timed_out: u64,
}

// ── Operations ───────────────────────────────────────────────────────────────

fn queue_key(request: &QueuedPairingRequest) -> Vec<u8> {
    keys::queue(
        request.priority.key_digit(),
        request.enqueued_at,
        &request.request_id,
    )
}

/// Enqueue an offline pairing request.
pub fn enqueue_pairing_request(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    requested_by: &str,
    component_a: ComponentId,
    component_b: ComponentId,
    operational_context: &str,
    proxy_id: Option<ComponentId>,
    priority: QueuePriority,
    timeout_at: Option<TimestampNs>,
    now: TimestampNs,
) -> Result<QueuedPairingRequest, LedgerError> {
    let request_id = RequestId::from_bytes(sha256_concat(&[
        b"queue:",
        component_a.as_bytes(),
        component_b.as_bytes(),
        &now.to_le_bytes(),
    ]));
    let request = QueuedPairingRequest {
        request_id,
        component_a,
        component_b,
        operational_context: operational_context.to_string(),
        proxy_id,
        priority,
        status: RequestStatus::Pending,
        requested_by: requested_by.to_string(),
        enqueued_at: now,
        timeout_at: timeout_at.unwrap_or(now + QUEUE_DEFAULT_TTL_NS),
        retries: 0,
        cancel_reason: None,
    };
    state.put(queue_key(&request), &request)?;

    events.push(Event::PairingRequestQueued {
        request_id,
        component_a,
        component_b,
        priority: format!("{priority:?}").to_lowercase(),
    });
    info!(request_id = %request_id, ?priority, "pairing request queued");
    Ok(request)
}

fn find_request(
    state: &Overlay<'_>,
    request_id: &RequestId,
) -> Result<Option<(Vec<u8>, QueuedPairingRequest)>, LedgerError> {
    let all: Vec<(Vec<u8>, QueuedPairingRequest)> =
        state.scan_prefix_as(keys::QUEUE.as_bytes())?;
    Ok(all.into_iter().find(|(_, r)| r.request_id == *request_id))
}

/// Cancel a pending request.
pub fn cancel_pairing_request(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    request_id: &RequestId,
    reason: &str,
) -> Result<(), LedgerError> {
    let (key, mut request) =
        find_request(state, request_id)?.ok_or(LedgerError::RequestNotFound(*request_id))?;
    if request.status != RequestStatus::Pending {
        return Err(LedgerError::RequestNotPending(*request_id));
    }
    request.status = RequestStatus::Cancelled;
    request.cancel_reason = Some(reason.to_string());
    state.put(key, &request)?;

    events.push(Event::PairingRequestCancelled {
        request_id: *request_id,
        reason: reason.to_string(),
    });
    Ok(())
}

/// Drain up to [`QUEUE_BATCH_SIZE`] pending requests for `component_id`.
///
/// Requests past their `timeout_at` transition to `Timeout` at dequeue.
/// A failed pairing attempt rolls back its partial writes, increments the
/// retry counter, and leaves the request pending at the same priority until
/// `max_retries` is exhausted, after which it is cancelled. A failure never
/// blocks the requests behind it.
pub fn process_offline_queue(
    state: &mut Overlay<'_>,
    events: &mut Vec<Event>,
    component_id: &ComponentId,
    now: TimestampNs,
) -> Result<QueueRunReport, LedgerError> {
    let all: Vec<(Vec<u8>, QueuedPairingRequest)> =
        state.scan_prefix_as(keys::QUEUE.as_bytes())?;
    let batch: Vec<(Vec<u8>, QueuedPairingRequest)> = all
        .into_iter()
        .filter(|(_, r)| r.status == RequestStatus::Pending && r.component_a == *component_id)
        .take(QUEUE_BATCH_SIZE)
        .collect();

    let mut report = QueueRunReport::default();
    for (key, mut request) in batch {
        if now >= request.timeout_at {
            request.status = RequestStatus::Timeout;
            state.put(key, &request)?;
            report.timed_out += 1;
            continue;
        }

        let checkpoint = state.checkpoint();
        let attempt = web4_lct::create_lct_relationship(
            state,
            events,
            &request.requested_by,
            request.component_a,
            request.component_b,
            &request.operational_context,
            request.proxy_id,
            now,
        );
        match attempt {
            Ok(_) => {
                request.status = RequestStatus::Processed;
                state.put(key, &request)?;
                report.processed += 1;
            }
            Err(err) => {
                state.restore(checkpoint);
                request.retries += 1;
                warn!(request_id = %request.request_id, retries = request.retries,
                      error = %err, "queued pairing attempt failed");
                if request.retries >= QUEUE_MAX_RETRIES {
                    request.status = RequestStatus::Cancelled;
                    request.cancel_reason = Some("retry_exhausted".into());
                    events.push(Event::PairingRequestCancelled {
                        request_id: request.request_id,
                        reason: "retry_exhausted".into(),
                    });
                }
                state.put(key, &request)?;
                report.failed += 1;
            }
        }
    }

    events.push(Event::OfflineQueueProcessed {
        component_id: *component_id,
        processed: report.processed,
        failed: report.failed,
        timed_out: report.timed_out,
    });
    info!(component = %component_id, ?report, "offline queue processed");
    Ok(report)
}

/// Fetch one request by id (query surface).
pub fn get_request(
    state: &Overlay<'_>,
    request_id: &RequestId,
) -> Result<Option<QueuedPairingRequest>, LedgerError> {
    Ok(find_request(state, request_id)?.map(|(_, r)| r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_store::Store;

    const NOW: TimestampNs = 1_700_000_000_000_000_000;

    fn registered(
        state: &mut Overlay<'_>,
        events: &mut Vec<Event>,
        real_id: &str,
        kind: &str,
    ) -> ComponentId {
        web4_registry::register_anonymous_component(
            state, events, real_id, "ACME", kind, "anchor-1", NOW,
        )
        .unwrap()
        .component_id
    }

    #[test]
    fn priority_then_fifo_ordering() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let a = registered(&mut state, &mut events, "batt-001", "battery_pack");
        let b = registered(&mut state, &mut events, "motor-001", "motor_controller");

        let low = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, b, "ctx", None,
            QueuePriority::Low, None, NOW,
        )
        .unwrap();
        let critical = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, b, "ctx", None,
            QueuePriority::Critical, None, NOW + 5,
        )
        .unwrap();
        let earlier_low = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, b, "ctx", None,
            QueuePriority::Low, None, NOW - 5,
        )
        .unwrap();

        let all: Vec<(Vec<u8>, QueuedPairingRequest)> =
            state.scan_prefix_as(keys::QUEUE.as_bytes()).unwrap();
        let order: Vec<RequestId> = all.into_iter().map(|(_, r)| r.request_id).collect();
        assert_eq!(
            order,
            vec![critical.request_id, earlier_low.request_id, low.request_id]
        );
    }

    #[test]
    fn processing_creates_lcts_and_marks_processed() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let a = registered(&mut state, &mut events, "batt-001", "battery_pack");
        let b = registered(&mut state, &mut events, "motor-001", "motor_controller");
        let req = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, b, "energy_transfer", None,
            QueuePriority::High, None, NOW,
        )
        .unwrap();

        let report = process_offline_queue(&mut state, &mut events, &a, NOW + 1).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
        let stored = get_request(&state, &req.request_id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Processed);

        // The component now carries the relationship created by processing.
        let comp = web4_registry::get_component(&state, &a).unwrap().unwrap();
        assert_eq!(comp.relationship_hashes.len(), 1);
    }

    #[test]
    fn timed_out_requests_transition_at_dequeue() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let a = registered(&mut state, &mut events, "batt-001", "battery_pack");
        let b = registered(&mut state, &mut events, "motor-001", "motor_controller");
        let req = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, b, "ctx", None,
            QueuePriority::Medium, Some(NOW + 10), NOW,
        )
        .unwrap();

        // Before the deadline nothing times out; at dequeue past it, it does.
        let report = process_offline_queue(&mut state, &mut events, &a, NOW + 20).unwrap();
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.processed, 0);
        let stored = get_request(&state, &req.request_id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Timeout);
    }

    #[test]
    fn failures_retry_then_cancel_without_blocking_others() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let a = registered(&mut state, &mut events, "batt-001", "battery_pack");
        let b = registered(&mut state, &mut events, "motor-001", "motor_controller");
        // An unregistered partner makes the pairing attempt fail.
        let ghost = ComponentId::from_bytes([0xaa; 32]);

        let doomed = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, ghost, "ctx", None,
            QueuePriority::Critical, None, NOW,
        )
        .unwrap();
        let fine = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, b, "ctx", None,
            QueuePriority::Low, None, NOW,
        )
        .unwrap();

        // The doomed request fails but the later, lower-priority one still runs.
        let report = process_offline_queue(&mut state, &mut events, &a, NOW + 1).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(
            get_request(&state, &fine.request_id).unwrap().unwrap().status,
            RequestStatus::Processed
        );
        let d = get_request(&state, &doomed.request_id).unwrap().unwrap();
        assert_eq!(d.status, RequestStatus::Pending);
        assert_eq!(d.retries, 1);

        // Exhaust the retries.
        for i in 1..QUEUE_MAX_RETRIES {
            let report =
                process_offline_queue(&mut state, &mut events, &a, NOW + 1 + i as u64).unwrap();
            assert_eq!(report.failed, 1);
        }
        let d = get_request(&state, &doomed.request_id).unwrap().unwrap();
        assert_eq!(d.status, RequestStatus::Cancelled);
        assert_eq!(d.cancel_reason.as_deref(), Some("retry_exhausted"));
    }

    #[test]
    fn cancel_requires_pending() {
        let store = Store::temporary().unwrap();
        let mut state = Overlay::new(&store);
        let mut events = Vec::new();
        let a = registered(&mut state, &mut events, "batt-001", "battery_pack");
        let b = registered(&mut state, &mut events, "motor-001", "motor_controller");
        let req = enqueue_pairing_request(
            &mut state, &mut events, "anchor-1", a, b, "ctx", None,
            QueuePriority::Offline, None, NOW,
        )
        .unwrap();
        cancel_pairing_request(&mut state, &mut events, &req.request_id, "operator").unwrap();
        assert!(matches!(
            cancel_pairing_request(&mut state, &mut events, &req.request_id, "again"),
            Err(LedgerError::RequestNotPending(_))
        ));
    }
}
