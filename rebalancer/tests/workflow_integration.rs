//! Integration tests for the CLI workflows against a mock broker.

use std::path::Path;

use weightbook::{Action, Mode, RebalanceError};
use weightbook_broker::Broker;
use weightbook_broker::mock::MockBroker;
use weightbook_rebalancer::config::Config;
use weightbook_rebalancer::crypto::{EncryptionKey, TokenCipher};
use weightbook_rebalancer::error::{Error, Result};
use weightbook_rebalancer::store::MemoryStore;
use weightbook_rebalancer::target::{PlanFile, TargetSpec};
use weightbook_rebalancer::workflow::App;

const GOOD_TOKEN: &str = "t.good-token";

type Connector = fn(&str) -> Result<Box<dyn Broker>>;

/// Account 2000 holds A (700) and B (300) plus 250 cash; account 2001 is empty.
fn connect(token: &str) -> Result<Box<dyn Broker>> {
    let mut builder = MockBroker::builder()
        .with_account("2000", "Brokerage")
        .with_account("2001", "IIS")
        .with_holding("2000", "FIGI_A", "AAA", 70.0, 10.0)
        .with_holding("2000", "FIGI_B", "BBB", 60.0, 5.0)
        .with_cash("2000", 250.0);
    if token != GOOD_TOKEN {
        builder = builder.reject_token();
    }
    Ok(Box::new(builder.build()))
}

fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.session.dir = dir.join("state").display().to_string();
    config.logging.dir = dir.join("logs").display().to_string();
    config
}

fn app_with(config: Config) -> App<MemoryStore, Connector> {
    let cipher = TokenCipher::new(&EncryptionKey::generate());
    App::new(config, MemoryStore::new(), cipher, connect as Connector).unwrap()
}

fn app(dir: &Path) -> App<MemoryStore, Connector> {
    app_with(config_in(dir))
}

fn logged_in(dir: &Path) -> App<MemoryStore, Connector> {
    let mut app = app(dir);
    app.login(GOOD_TOKEN, Some("alice")).unwrap();
    app
}

fn half_and_half() -> TargetSpec {
    TargetSpec::from_json(
        r#"{"targets":[{"id":"FIGI_A","weight":50},{"id":"FIGI_B","weight":50}]}"#,
    )
    .unwrap()
}

fn audit_events(app: &App<MemoryStore, Connector>) -> Vec<serde_json::Value> {
    std::fs::read_to_string(app.config().audit_path())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// ============================================================================
// Login / session lifecycle
// ============================================================================

#[test]
fn login_stores_encrypted_token() {
    let dir = tempfile::tempdir().unwrap();
    let app = logged_in(dir.path());

    let status = app.status().unwrap();
    assert!(status.logged_in);
    assert_eq!(status.username.as_deref(), Some("alice"));

    let records = app.vault().store().records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].1.encrypted_token.contains("good-token"));

    let audit = std::fs::read_to_string(app.config().audit_path()).unwrap();
    assert!(audit.contains("\"event\":\"login\""));
    assert!(!audit.contains(GOOD_TOKEN));
}

#[test]
fn login_returns_accounts_and_default_username() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());
    let outcome = app.login(GOOD_TOKEN, None).unwrap();
    assert_eq!(outcome.username, "Brokerage");
    assert_eq!(outcome.accounts.len(), 2);
}

#[test]
fn rejected_token_is_not_stored() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());

    let err = app.login("t.revoked", Some("alice")).unwrap_err();
    assert!(matches!(&err, Error::Broker(e) if e.is_auth()));
    assert_eq!(err.exit_code(), 1);
    assert!(app.vault().store().is_empty());
    assert!(!app.status().unwrap().logged_in);
}

#[test]
fn blank_token_rejected_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());
    let err = app.login("   ", None).unwrap_err();
    assert_eq!(err.kind(), "auth");
}

#[test]
fn commands_require_login() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());

    let err = app.accounts().unwrap_err();
    assert!(matches!(err, Error::NotLoggedIn));
    assert_eq!(err.exit_code(), 3);

    let err = app
        .rebalance("2000", &half_and_half(), "target.json", None)
        .unwrap_err();
    assert!(matches!(err, Error::NotLoggedIn));
}

#[test]
fn logout_keeps_stored_token() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());

    assert!(app.logout().unwrap());
    assert!(!app.logout().unwrap());
    assert!(!app.status().unwrap().logged_in);
    assert_eq!(app.vault().store().len(), 1);
    assert!(matches!(app.accounts(), Err(Error::NotLoggedIn)));
}

#[test]
fn forget_after_logout_deletes_token() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());

    app.logout().unwrap();
    assert!(app.forget().unwrap());
    assert!(app.vault().store().is_empty());
    assert!(matches!(app.forget(), Err(Error::NotLoggedIn)));
}

#[test]
fn login_after_logout_reuses_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());

    app.logout().unwrap();
    app.login(GOOD_TOKEN, Some("alice")).unwrap();
    assert_eq!(app.vault().store().len(), 1);
    assert!(app.status().unwrap().logged_in);
    assert_eq!(app.accounts().unwrap().len(), 2);
}

#[test]
fn relogin_same_session_updates_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());
    app.login(GOOD_TOKEN, Some("alice2")).unwrap();

    assert_eq!(app.vault().store().len(), 1);
    assert_eq!(app.status().unwrap().username.as_deref(), Some("alice2"));
}

#[test]
fn forget_deletes_token_and_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());

    assert!(app.forget().unwrap());
    assert!(app.vault().store().is_empty());
    assert!(!app.status().unwrap().logged_in);
    assert!(matches!(app.forget(), Err(Error::NotLoggedIn)));

    let events = audit_events(&app);
    assert!(events.iter().any(|e| e["event"] == "token_forgotten"));
}

// ============================================================================
// Broker reads
// ============================================================================

#[test]
fn accounts_and_portfolio() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());

    let accounts = app.accounts().unwrap();
    assert_eq!(accounts[0].id, "2000");

    let portfolio = app.portfolio("2000").unwrap();
    assert_eq!(portfolio.holdings.len(), 2);
    assert_eq!(portfolio.total_value, 1250.0);

    let empty = app.portfolio("2001").unwrap();
    assert!(empty.holdings.is_empty());
}

#[test]
fn unknown_account_is_broker_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());
    let err = app.portfolio("9999").unwrap_err();
    assert!(matches!(err, Error::Broker(weightbook_broker::BrokerError::NotFound(_))));
}

// ============================================================================
// Rebalance
// ============================================================================

#[test]
fn rebalance_buy_only_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());

    let result = app
        .rebalance("2000", &half_and_half(), "target.json", None)
        .unwrap();

    assert_eq!(result.mode, Mode::BuyOnly);
    // Cash is not a position.
    assert!((result.current_total - 1000.0).abs() < 1e-9);
    assert!((result.new_total - 1400.0).abs() < 1e-9);
    assert_eq!(result.operations.len(), 1);

    let op = &result.operations[0];
    assert_eq!(op.id, "FIGI_B");
    assert_eq!(op.ticker, "BBB");
    assert_eq!(op.action, Action::Buy);
    assert!((op.value - 400.0).abs() < 1e-9);
    assert!((op.quantity - 80.0).abs() < 1e-9);
    assert!((result.additional_investment - 400.0).abs() < 1e-9);
}

#[test]
fn mode_flag_overrides_file_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());

    let result = app
        .rebalance("2000", &half_and_half(), "target.json", Some(Mode::BuyAndSell))
        .unwrap();

    assert_eq!(result.mode, Mode::BuyAndSell);
    assert_eq!(result.operations.len(), 2);
    assert_eq!(result.operations[0].action, Action::Sell);
    assert!((result.operations[0].quantity - 20.0).abs() < 1e-9);
    assert_eq!(result.operations[1].action, Action::Buy);
    assert!((result.operations[1].quantity - 40.0).abs() < 1e-9);
    assert!((result.new_total - result.current_total).abs() < 1e-9);
}

#[test]
fn mode_from_file_then_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.rebalance.default_mode = Mode::BuyAndSell;
    let mut app = app_with(config);
    app.login(GOOD_TOKEN, None).unwrap();

    let from_config = app
        .rebalance("2000", &half_and_half(), "target.json", None)
        .unwrap();
    assert_eq!(from_config.mode, Mode::BuyAndSell);

    let spec = TargetSpec::from_json(
        r#"{"mode":"buy_only","targets":[{"id":"FIGI_A","weight":50},{"id":"FIGI_B","weight":50}]}"#,
    )
    .unwrap();
    let from_file = app.rebalance("2000", &spec, "target.json", None).unwrap();
    assert_eq!(from_file.mode, Mode::BuyOnly);
}

#[test]
fn invalid_weights_exit_with_validation_code() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());
    let spec = TargetSpec::from_json(
        r#"{"targets":[{"id":"FIGI_A","weight":50},{"id":"FIGI_B","weight":40}]}"#,
    )
    .unwrap();

    let err = app.rebalance("2000", &spec, "target.json", None).unwrap_err();
    match &err {
        Error::Rebalance(RebalanceError::InvalidWeights { sum }) => {
            assert!((sum - 90.0).abs() < 1e-9)
        }
        other => panic!("expected InvalidWeights, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert_eq!(err.kind(), "invalid_weights");

    let events = audit_events(&app);
    let last = events.last().unwrap();
    assert_eq!(last["event"], "rebalance_failed");
    assert_eq!(last["source"], "target.json");
}

#[test]
fn targets_outside_the_account_give_zero_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());
    let spec = TargetSpec::from_json(r#"{"targets":[{"id":"FIGI_ZZZ","weight":100}]}"#).unwrap();

    let err = app.rebalance("2000", &spec, "target.json", None).unwrap_err();
    assert!(matches!(err, Error::Rebalance(RebalanceError::ZeroPortfolioValue)));
}

#[test]
fn configured_min_trade_value_suppresses_small_trades() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.rebalance.min_trade_value = 500.0;
    let mut app = app_with(config);
    app.login(GOOD_TOKEN, None).unwrap();

    let result = app
        .rebalance("2000", &half_and_half(), "target.json", None)
        .unwrap();
    assert!(result.is_balanced());
    // The scale-up still applies; only the operations are filtered.
    assert!((result.additional_investment - 400.0).abs() < 1e-9);
}

// ============================================================================
// Offline plan
// ============================================================================

#[test]
fn plan_needs_no_login() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());
    let plan = PlanFile::from_json(
        r#"{
            "mode": "buy_and_sell",
            "positions": [
                { "id": "X", "current_price": 10, "current_value": 600 },
                { "id": "Y", "current_price": 20, "current_value": 400 }
            ],
            "targets": [ { "id": "X", "weight": 40 }, { "id": "Y", "weight": 60 } ]
        }"#,
    )
    .unwrap();

    let result = app.plan(&plan, "plan.json", None).unwrap();
    assert_eq!(result.mode, Mode::BuyAndSell);
    assert_eq!(result.operations.len(), 2);
    assert_eq!(result.operations[0].action, Action::Sell);
    assert!((result.operations[0].value - 200.0).abs() < 1e-9);
    assert!((result.operations[1].quantity - 10.0).abs() < 1e-9);
}

#[test]
fn audit_trail_records_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = logged_in(dir.path());
    app.rebalance("2000", &half_and_half(), "target.json", None)
        .unwrap();
    app.logout().unwrap();

    let names: Vec<String> = audit_events(&app)
        .iter()
        .map(|e| e["event"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["login", "portfolio_fetched", "rebalance_computed", "logout"]
    );
}
