//! Route configuration for the lead endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{ingest_lead, submit_lead, LeadAppState};

/// Creates the lead router.
///
/// Routes:
/// - `POST /api/bot/lead` - forward a widget lead to the ingestion endpoint
/// - `POST /api/lead/submit` - record and sync a contact-form lead
pub fn lead_router() -> Router<LeadAppState> {
    Router::new()
        .route("/api/bot/lead", post(ingest_lead))
        .route("/api/lead/submit", post(submit_lead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use crate::application::LeadRecorder;
    use crate::config::LeadsConfig;
    use crate::domain::foundation::{LeadId, Timestamp};
    use crate::domain::lead::NewLead;
    use crate::ports::{
        CrmDelivery, CrmError, CrmLeadPayload, CrmSink, DispatchLead, DispatchOutcome,
        LeadDispatcher, LeadRepository, StoreError,
    };

    // ───────────────────────────────────────────────────────────────
    // Mock implementations (minimal for route testing)
    // ───────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct MockDispatcher {
        fail: bool,
        dispatched: Mutex<Vec<DispatchLead>>,
    }

    #[async_trait]
    impl LeadDispatcher for MockDispatcher {
        async fn dispatch(&self, lead: &DispatchLead) -> DispatchOutcome {
            self.dispatched.lock().unwrap().push(lead.clone());
            if self.fail {
                DispatchOutcome::Failed {
                    last_error: "down".into(),
                }
            } else {
                DispatchOutcome::Delivered
            }
        }
    }

    #[derive(Default)]
    struct MockLeads {
        rows: Mutex<Vec<NewLead>>,
    }

    #[async_trait]
    impl LeadRepository for MockLeads {
        async fn find_recent_by_contact(
            &self,
            _email: Option<&str>,
            _phone: Option<&str>,
            _since: Timestamp,
        ) -> Result<Option<LeadId>, StoreError> {
            Ok(None)
        }

        async fn insert(&self, lead: &NewLead) -> Result<LeadId, StoreError> {
            self.rows.lock().unwrap().push(lead.clone());
            Ok(LeadId::new())
        }
    }

    #[derive(Default)]
    struct MockSink {
        reject: bool,
    }

    #[async_trait]
    impl CrmSink for MockSink {
        async fn deliver(&self, _payload: &CrmLeadPayload) -> Result<CrmDelivery, CrmError> {
            if self.reject {
                return Err(CrmError::Rejected {
                    status: 422,
                    message: "invalid".into(),
                });
            }
            Ok(CrmDelivery {
                lead_id: Some("crm-7".into()),
                status: 200,
            })
        }
    }

    struct Fixture {
        dispatcher: Arc<MockDispatcher>,
        leads: Arc<MockLeads>,
        app: Router,
    }

    fn fixture(dispatcher: MockDispatcher, sink: MockSink) -> Fixture {
        let dispatcher = Arc::new(dispatcher);
        let leads = Arc::new(MockLeads::default());
        let recorder = Arc::new(LeadRecorder::new(leads.clone(), &LeadsConfig::default()));
        let state = LeadAppState::new(dispatcher.clone(), recorder, Arc::new(sink));
        Fixture {
            dispatcher,
            leads,
            app: lead_router().with_state(state),
        }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // POST /api/bot/lead
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn ingest_forwards_and_acks() {
        let f = fixture(MockDispatcher::default(), MockSink::default());
        let response = f
            .app
            .oneshot(post_json(
                "/api/bot/lead",
                r#"{"name":"Ana","email":"ana@example.com","message":"deuda"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);
        assert_eq!(f.dispatcher.dispatched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ingest_accepts_localized_field_names() {
        let f = fixture(MockDispatcher::default(), MockSink::default());
        let response = f
            .app
            .oneshot(post_json(
                "/api/bot/lead",
                r#"{"nombre":"Ana","telefono":"912345678","motivo":"despido"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let dispatched = f.dispatcher.dispatched.lock().unwrap();
        assert_eq!(dispatched[0].name, "Ana");
        assert_eq!(dispatched[0].phone.as_deref(), Some("912345678"));
        assert_eq!(dispatched[0].message.as_deref(), Some("despido"));
    }

    #[tokio::test]
    async fn ingest_without_contact_is_bad_request() {
        let f = fixture(MockDispatcher::default(), MockSink::default());
        let response = f
            .app
            .oneshot(post_json("/api/bot/lead", r#"{"name":"Ana"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(f.dispatcher.dispatched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ingest_failure_is_bad_gateway() {
        let f = fixture(
            MockDispatcher {
                fail: true,
                ..Default::default()
            },
            MockSink::default(),
        );
        let response = f
            .app
            .oneshot(post_json(
                "/api/bot/lead",
                r#"{"name":"Ana","email":"ana@example.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["ok"], false);
    }

    // ───────────────────────────────────────────────────────────────
    // POST /api/lead/submit
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn submit_records_locally_and_syncs() {
        let f = fixture(MockDispatcher::default(), MockSink::default());
        let response = f
            .app
            .oneshot(post_json(
                "/api/lead/submit",
                r#"{"full_name":"Ana Rojas","email":"ana@example.com","lead_type":"evaluacion","message":"deuda grande"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["lead_id"], "crm-7");

        let rows = f.leads.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].channel, "landing");
        assert_eq!(rows[0].source, "form");
    }

    #[tokio::test]
    async fn submit_requires_name_email_and_type() {
        let f = fixture(MockDispatcher::default(), MockSink::default());
        let response = f
            .app
            .clone()
            .oneshot(post_json(
                "/api/lead/submit",
                r#"{"email":"ana@example.com","lead_type":"evaluacion"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = f
            .app
            .oneshot(post_json(
                "/api/lead/submit",
                r#"{"full_name":"Ana","email":"ana@example.com"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_propagates_crm_rejection_status() {
        let f = fixture(MockDispatcher::default(), MockSink { reject: true });
        let response = f
            .app
            .oneshot(post_json(
                "/api/lead/submit",
                r#"{"full_name":"Ana","email":"ana@example.com","lead_type":"evaluacion"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        // The local record survives the failed sync.
        assert_eq!(f.leads.rows.lock().unwrap().len(), 1);
    }
}
