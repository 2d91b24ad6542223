//! Tests for the service bootstrap, covering readiness signalling and
//! routing through the assembled application.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use super::server::{ServerConfig, create_server};
use acrostic::domain::ports::LoggingReplySink;
use acrostic::domain::{MatchingMode, MessagePipeline, Pattern, ScoreLedger, SequenceMatcher};
use acrostic::inbound::http::health::HealthState;
use acrostic::inbound::http::state::HttpState;
use acrostic::outbound::memory::InMemoryCounterStore;
use actix_web::web;
use rstest::{fixture, rstest};

#[fixture]
fn health_state() -> web::Data<HealthState> {
    web::Data::new(HealthState::new())
}

#[fixture]
fn bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

#[fixture]
fn http_state() -> HttpState {
    let matcher = SequenceMatcher::new(
        Pattern::new("owl").expect("valid pattern"),
        MatchingMode::LetterScan,
    );
    let ledger = ScoreLedger::new(Arc::new(InMemoryCounterStore::default()));
    let pipeline = MessagePipeline::new(matcher, ledger, Arc::new(LoggingReplySink));
    HttpState::new(Arc::new(pipeline))
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(
    health_state: web::Data<HealthState>,
    bind_address: SocketAddr,
    http_state: HttpState,
) {
    assert!(!health_state.is_ready(), "state should start unready");

    let config = ServerConfig::new(bind_address, http_state);
    assert_eq!(config.bind_addr(), bind_address);
    let _server = create_server(health_state.clone(), config).expect("server should bind");

    assert!(health_state.is_ready(), "state should be ready after bind");
}

#[rstest]
#[actix_rt::test]
async fn create_server_fails_when_address_is_taken(
    health_state: web::Data<HealthState>,
    bind_address: SocketAddr,
    http_state: HttpState,
) {
    let occupied = TcpListener::bind(bind_address).expect("reserve a port");
    let taken = occupied.local_addr().expect("local addr");

    let result = create_server(health_state.clone(), ServerConfig::new(taken, http_state));

    assert!(result.is_err(), "binding an occupied port should fail");
    assert!(!health_state.is_ready(), "failed bind must not mark ready");
}
