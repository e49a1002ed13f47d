//! End-to-end airdrop runs against a mocked JSON-RPC node.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agent_chain_actions::{
    actions::{airdrop::AirdropAction, Action, ActionRequest, CallbackResponse},
    blockchain::{networks::neox_testnet, ClientCache},
};
use mockito::{mock, Matcher, Mock};
use serde_json::json;

const GANACHE_KEY: &str = "0x4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";
const GANACHE_ADDRESS: &str = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1";
const TOKEN: &str = "0x1111111111111111111111111111111111111111";
const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
const NEOX_CHAIN_ID_HEX: &str = "0xba9304";

fn tx_hash() -> String {
    format!("0x{}", "ab".repeat(32))
}

fn rpc_response(path: &str, method: &str, result: serde_json::Value) -> Mock {
    mock("POST", path)
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
}

fn rpc_mock(path: &str, method: &str, result: serde_json::Value) -> Mock {
    rpc_response(path, method, result).create()
}

fn settings(rpc_path: &str) -> HashMap<String, String> {
    [
        ("NEOX_PRIVATE_KEY", GANACHE_KEY.to_string()),
        ("AIRDROP_TOKEN_ADDRESS", TOKEN.to_string()),
        ("AIRDROP_AMOUNT", "10".to_string()),
        ("NEOX_RPC_URL", format!("{}{}", mockito::server_url(), rpc_path)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn action() -> AirdropAction {
    AirdropAction::new(Arc::new(ClientCache::new(reqwest::Client::new())), neox_testnet())
}

/// Mocks every call of a successful transfer on `path`.
fn happy_node(path: &str, decimals: u8) -> Vec<Mock> {
    vec![
        rpc_mock(path, "eth_call", json!(format!("0x{:064x}", decimals))),
        rpc_mock(path, "eth_getTransactionCount", json!("0x7")),
        rpc_mock(path, "eth_chainId", json!(NEOX_CHAIN_ID_HEX)),
        rpc_mock(path, "eth_estimateGas", json!("0xea60")),
        rpc_mock(path, "eth_gasPrice", json!("0x3b9aca00")),
        rpc_mock(path, "eth_sendRawTransaction", json!(tx_hash())),
        rpc_mock(
            path,
            "eth_getTransactionByHash",
            json!({
                "hash": tx_hash(),
                "from": GANACHE_ADDRESS,
                "to": TOKEN,
                "value": "0x0",
                "chainId": NEOX_CHAIN_ID_HEX,
                "blockNumber": null
            }),
        ),
    ]
}

#[tokio::test]
async fn airdrop_reports_hash_and_explorer_link() {
    let path = "/airdrop-happy";
    let _node = happy_node(path, 18);

    let calls: Arc<Mutex<Vec<CallbackResponse>>> = Arc::default();
    let sink = calls.clone();
    let callback = move |response: CallbackResponse| sink.lock().unwrap().push(response);

    let request = ActionRequest::new(format!("airdrop 10 tokens to {}", RECIPIENT));
    let outcome = action()
        .handle(&request, &settings(path), Some(&callback))
        .await;

    assert!(outcome.success, "{}", outcome.text);
    assert_eq!(
        outcome.text,
        format!(
            "Successfully airdropped 10 tokens to {}\nTransaction Hash: {}\nView on Explorer: https://xt4scan.ngd.network/tx/{}",
            RECIPIENT,
            tx_hash(),
            tx_hash()
        )
    );
    let payload = outcome.payload.clone().unwrap();
    assert_eq!(payload["chainId"], 12227332);
    assert_eq!(payload["detailsAvailable"], true);
    assert_eq!(payload["from"].as_str().unwrap().to_lowercase(), GANACHE_ADDRESS);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text, outcome.text);
}

#[tokio::test]
async fn amount_option_overrides_configured_amount() {
    let path = "/airdrop-override";
    let _node = happy_node(path, 6);

    let request = ActionRequest::new(format!("send me tokens at {}", RECIPIENT)).with_option("amount", "2.5");
    let outcome = action().handle(&request, &settings(path), None).await;

    assert!(outcome.success, "{}", outcome.text);
    assert!(outcome.text.starts_with("Successfully airdropped 2.5 tokens"));
}

#[tokio::test]
async fn report_echoes_address_and_amount_as_given() {
    let path = "/airdrop-verbatim";
    let _node = happy_node(path, 18);
    let lowercase = RECIPIENT.to_lowercase();

    let mut source = settings(path);
    source.insert("AIRDROP_AMOUNT".into(), "10.50".into());
    let request = ActionRequest::new(format!("airdrop to {} please", lowercase));
    let outcome = action().handle(&request, &source, None).await;

    assert!(outcome.success, "{}", outcome.text);
    assert!(outcome
        .text
        .starts_with(&format!("Successfully airdropped 10.50 tokens to {}\n", lowercase)));
    let payload = outcome.payload.unwrap();
    assert_eq!(payload["address"], RECIPIENT);
    assert_eq!(payload["baseUnits"], "10500000000000000000");
}

#[tokio::test]
async fn missing_settings_are_reported_in_declared_order() {
    let action = action();
    let request = ActionRequest::new(format!("airdrop to {}", RECIPIENT));

    let mut source: HashMap<String, String> = HashMap::new();
    source.insert("AIRDROP_AMOUNT".into(), "10".into());
    let outcome = action.handle(&request, &source, None).await;
    assert!(!outcome.success);
    assert_eq!(outcome.text, "Error: NEOX_PRIVATE_KEY not configured");

    source.insert("NEOX_PRIVATE_KEY".into(), GANACHE_KEY.into());
    let outcome = action.handle(&request, &source, None).await;
    assert_eq!(outcome.text, "Error: AIRDROP_TOKEN_ADDRESS not configured");

    assert!(action.validate(&source).is_err());
    source.insert("AIRDROP_TOKEN_ADDRESS".into(), TOKEN.into());
    assert!(action.validate(&source).unwrap());
}

#[tokio::test]
async fn message_without_recipient_never_touches_the_node() {
    let path = "/airdrop-no-recipient";
    let untouched = rpc_response(path, "eth_call", json!("0x")).expect(0).create();

    let calls: Arc<Mutex<Vec<CallbackResponse>>> = Arc::default();
    let sink = calls.clone();
    let callback = move |response: CallbackResponse| sink.lock().unwrap().push(response);

    let outcome = action()
        .handle(&ActionRequest::new("airdrop me please"), &settings(path), Some(&callback))
        .await;

    assert!(!outcome.success);
    assert!(outcome.text.starts_with("Error: could not find to_address"));
    assert_eq!(outcome.payload.unwrap()["kind"], "extraction_failure");
    assert_eq!(calls.lock().unwrap().len(), 1);
    untouched.assert();
}

#[tokio::test]
async fn endpoint_on_the_wrong_chain_is_rejected_before_sending() {
    let path = "/airdrop-wrong-chain";
    let _call = rpc_mock(path, "eth_call", json!(format!("0x{:064x}", 18)));
    let _count = rpc_mock(path, "eth_getTransactionCount", json!("0x0"));
    let _chain = rpc_mock(path, "eth_chainId", json!("0x1"));
    let send = rpc_response(path, "eth_sendRawTransaction", json!(tx_hash()))
        .expect(0)
        .create();

    let request = ActionRequest::new(format!("airdrop to {}", RECIPIENT));
    let outcome = action().handle(&request, &settings(path), None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.payload.unwrap()["kind"], "invalid_parameter");
    assert!(outcome.text.contains("chain 1"));
    send.assert();
}

#[tokio::test]
async fn failed_lookup_still_reports_the_submitted_hash() {
    let path = "/airdrop-degraded";
    let _call = rpc_mock(path, "eth_call", json!(format!("0x{:064x}", 18)));
    let _count = rpc_mock(path, "eth_getTransactionCount", json!("0x1"));
    let _chain = rpc_mock(path, "eth_chainId", json!(NEOX_CHAIN_ID_HEX));
    let _gas = rpc_mock(path, "eth_estimateGas", json!("0xea60"));
    let _price = rpc_mock(path, "eth_gasPrice", json!("0x3b9aca00"));
    let _send = rpc_mock(path, "eth_sendRawTransaction", json!(tx_hash()));
    let _lookup = rpc_mock(path, "eth_getTransactionByHash", serde_json::Value::Null);

    let request = ActionRequest::new(format!("airdrop to {}", RECIPIENT));
    let outcome = action().handle(&request, &settings(path), None).await;

    assert!(outcome.success, "{}", outcome.text);
    assert!(outcome.text.contains(&tx_hash()));
    assert!(outcome.text.contains("Note: transaction details unavailable"));
    assert_eq!(outcome.payload.unwrap()["detailsAvailable"], false);
}

#[tokio::test]
async fn node_error_names_the_failing_stage() {
    let path = "/airdrop-node-error";
    let _call = mock("POST", path)
        .match_body(Matcher::PartialJson(json!({ "method": "eth_call" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
        .create();

    let request = ActionRequest::new(format!("airdrop to {}", RECIPIENT));
    let outcome = action().handle(&request, &settings(path), None).await;

    assert!(!outcome.success);
    assert!(outcome.text.contains("reading token decimals failed"));
    assert!(outcome.text.contains("execution reverted"));
}
