//! End-to-end submission against a mock full node

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::time::Duration;
use vault_sweep::config::HuntConfig;
use vault_sweep::crypto::KeyPair;
use vault_sweep::error::SweepError;
use vault_sweep::rpc::SuiRpcClient;
use vault_sweep::submit::{self, GasSettings};
use vault_sweep::transaction::Command;
use vault_sweep::types::Digest;

fn rpc_result(result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

fn rpc_error(code: i64, message: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": code, "message": message } })
        .to_string()
}

async fn mock_method(server: &mut ServerGuard, method: &str, body: String) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::Regex(format!(r#""method"\s*:\s*"{}""#, method)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

fn shared_vault(vault_id: &str) -> Value {
    json!({
        "data": {
            "objectId": vault_id,
            "version": "42",
            "digest": Digest::new([8u8; 32]).to_base58(),
            "owner": { "Shared": { "initial_shared_version": 11 } }
        }
    })
}

fn coin_page(balances: &[u64]) -> Value {
    let data: Vec<Value> = balances
        .iter()
        .enumerate()
        .map(|(i, balance)| {
            json!({
                "coinType": "0x2::sui::SUI",
                "coinObjectId": format!("0x{:x}", i + 100),
                "version": "7",
                "digest": Digest::new([i as u8; 32]).to_base58(),
                "balance": balance.to_string()
            })
        })
        .collect();
    json!({ "data": data, "nextCursor": null, "hasNextPage": false })
}

struct Fixture {
    server: ServerGuard,
    client: SuiRpcClient,
    keypair: KeyPair,
    hunt: HuntConfig,
}

async fn fixture() -> Fixture {
    let server = Server::new_async().await;
    let client = SuiRpcClient::new(&server.url(), Duration::from_secs(5)).unwrap();
    Fixture {
        server,
        client,
        keypair: KeyPair::generate(),
        hunt: HuntConfig::default(),
    }
}

fn gas() -> GasSettings {
    GasSettings {
        budget: 50_000_000,
        price: None,
    }
}

#[tokio::test]
async fn test_prepare_builds_two_repetitions() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(shared_vault(&vault_id)),
    )
    .await;
    let _price = mock_method(
        &mut f.server,
        "suix_getReferenceGasPrice",
        rpc_result(json!("750")),
    )
    .await;
    let _coins = mock_method(
        &mut f.server,
        "suix_getCoins",
        rpc_result(coin_page(&[10, 900_000_000, 60_000_000])),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let sender = f.keypair.address();
    let data = submit::prepare(&f.client, &settings, gas(), sender).await.unwrap();

    assert_eq!(data.sender(), sender);
    assert_eq!(data.gas_data().price, 750);
    assert_eq!(data.gas_data().payment.len(), 1);
    assert_eq!(data.gas_data().payment[0].object_id.to_string(), format!("0x{:0>64}", "65"));

    let pt = data.programmable();
    let move_calls = pt
        .commands
        .iter()
        .filter(|c| matches!(c, Command::MoveCall(_)))
        .count();
    assert_eq!(move_calls, 6);
    match pt.commands.last() {
        Some(Command::TransferObjects(coins, _)) => assert_eq!(coins.len(), 2),
        other => panic!("expected final transfer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sign_and_execute_reports_digest() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(shared_vault(&vault_id)),
    )
    .await;
    let _price = mock_method(
        &mut f.server,
        "suix_getReferenceGasPrice",
        rpc_result(json!("1000")),
    )
    .await;
    let _coins = mock_method(
        &mut f.server,
        "suix_getCoins",
        rpc_result(coin_page(&[100_000_000])),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let data = submit::prepare(&f.client, &settings, gas(), f.keypair.address())
        .await
        .unwrap();
    let digest = data.digest().unwrap().to_string();

    let execute = mock_method(
        &mut f.server,
        "sui_executeTransactionBlock",
        rpc_result(json!({
            "digest": digest,
            "effects": {
                "status": { "status": "success" },
                "gasUsed": {
                    "computationCost": "1000000",
                    "storageCost": "2000000",
                    "storageRebate": "500000"
                }
            }
        })),
    )
    .await;

    let outcome = submit::sign_and_execute(&f.client, &data, &f.keypair)
        .await
        .unwrap();
    execute.assert_async().await;

    assert_eq!(outcome.digest, digest);
    let effects = outcome.effects.unwrap();
    assert!(effects.status.is_success());
    assert_eq!(effects.gas_used.unwrap().net_gas_usage(), 2_500_000);
}

#[tokio::test]
async fn test_failed_execution_is_attributed() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(shared_vault(&vault_id)),
    )
    .await;
    let _price = mock_method(
        &mut f.server,
        "suix_getReferenceGasPrice",
        rpc_result(json!("1000")),
    )
    .await;
    let _coins = mock_method(
        &mut f.server,
        "suix_getCoins",
        rpc_result(coin_page(&[100_000_000])),
    )
    .await;
    let _execute = mock_method(
        &mut f.server,
        "sui_executeTransactionBlock",
        rpc_result(json!({
            "digest": "FailedDigest",
            "effects": {
                "status": {
                    "status": "failure",
                    "error": "MoveAbort in vault::withdraw, code 1"
                }
            }
        })),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let data = submit::prepare(&f.client, &settings, gas(), f.keypair.address())
        .await
        .unwrap();
    let err = submit::sign_and_execute(&f.client, &data, &f.keypair)
        .await
        .unwrap_err();

    match err {
        SweepError::ExecutionFailed { digest, reason } => {
            assert_eq!(digest, "FailedDigest");
            assert!(reason.contains("vault::withdraw"));
        }
        other => panic!("expected ExecutionFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_submission_surfaces_rpc_error() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(shared_vault(&vault_id)),
    )
    .await;
    let _price = mock_method(
        &mut f.server,
        "suix_getReferenceGasPrice",
        rpc_result(json!("1000")),
    )
    .await;
    let _coins = mock_method(
        &mut f.server,
        "suix_getCoins",
        rpc_result(coin_page(&[100_000_000])),
    )
    .await;
    let _execute = mock_method(
        &mut f.server,
        "sui_executeTransactionBlock",
        rpc_error(-32002, "Transaction validator signing failed"),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let data = submit::prepare(&f.client, &settings, gas(), f.keypair.address())
        .await
        .unwrap();
    let err = submit::sign_and_execute(&f.client, &data, &f.keypair)
        .await
        .unwrap_err();

    assert!(matches!(err, SweepError::RpcError { code: -32002, .. }));
    assert!(err.to_string().contains("sui_executeTransactionBlock"));
}

#[tokio::test]
async fn test_missing_vault_is_invalid_object() {
    let mut f = fixture().await;
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(json!({ "error": { "code": "notExists", "object_id": "0x3005" } })),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let err = submit::prepare(&f.client, &settings, gas(), f.keypair.address())
        .await
        .unwrap_err();
    assert!(matches!(err, SweepError::InvalidObject(_)));
}

#[tokio::test]
async fn test_owned_vault_is_rejected() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(json!({
            "data": {
                "objectId": vault_id,
                "version": "3",
                "digest": Digest::new([1u8; 32]).to_base58(),
                "owner": { "AddressOwner": "0x1" }
            }
        })),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let err = submit::prepare(&f.client, &settings, gas(), f.keypair.address())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not a shared object"));
}

#[tokio::test]
async fn test_insufficient_gas() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(shared_vault(&vault_id)),
    )
    .await;
    let _coins = mock_method(&mut f.server, "suix_getCoins", rpc_result(coin_page(&[1_000]))).await;

    let settings = f.hunt.settings().unwrap();
    let fixed_price = GasSettings {
        budget: 50_000_000,
        price: Some(1_000),
    };
    let err = submit::prepare(&f.client, &settings, fixed_price, f.keypair.address())
        .await
        .unwrap_err();
    assert!(matches!(err, SweepError::InsufficientGas(_)));
}

#[tokio::test]
async fn test_signer_must_match_sender() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(shared_vault(&vault_id)),
    )
    .await;
    let _price = mock_method(
        &mut f.server,
        "suix_getReferenceGasPrice",
        rpc_result(json!("1000")),
    )
    .await;
    let _coins = mock_method(
        &mut f.server,
        "suix_getCoins",
        rpc_result(coin_page(&[100_000_000])),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let data = submit::prepare(&f.client, &settings, gas(), f.keypair.address())
        .await
        .unwrap();
    let stranger = KeyPair::generate();
    let err = submit::sign_and_execute(&f.client, &data, &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, SweepError::KeyError(_)));
}

#[tokio::test]
async fn test_dry_run_reports_status() {
    let mut f = fixture().await;
    let vault_id = f.hunt.vault_id.clone();
    let _object = mock_method(
        &mut f.server,
        "sui_getObject",
        rpc_result(shared_vault(&vault_id)),
    )
    .await;
    let _price = mock_method(
        &mut f.server,
        "suix_getReferenceGasPrice",
        rpc_result(json!(1000)),
    )
    .await;
    let _coins = mock_method(
        &mut f.server,
        "suix_getCoins",
        rpc_result(coin_page(&[100_000_000])),
    )
    .await;
    let _dry_run = mock_method(
        &mut f.server,
        "sui_dryRunTransactionBlock",
        rpc_result(json!({
            "effects": { "status": { "status": "success" } }
        })),
    )
    .await;

    let settings = f.hunt.settings().unwrap();
    let data = submit::prepare(&f.client, &settings, gas(), f.keypair.address())
        .await
        .unwrap();
    let response = submit::dry_run(&f.client, &data).await.unwrap();
    assert!(response.effects.status.is_success());
    assert!(response.effects.gas_used.is_none());
}

#[tokio::test]
async fn test_coin_paging_stops_on_repeated_cursor() {
    let mut f = fixture().await;
    let mut page = coin_page(&[1_000, 2_000]);
    page["nextCursor"] = json!("0x65");
    page["hasNextPage"] = json!(true);
    let coins_mock = f
        .server
        .mock("POST", "/")
        .match_body(Matcher::Regex(r#""method"\s*:\s*"suix_getCoins""#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(page))
        .expect(2)
        .create_async()
        .await;

    let coins = f
        .client
        .get_all_coins(f.keypair.address(), "0x2::sui::SUI")
        .await
        .unwrap();

    assert_eq!(coins.len(), 4);
    coins_mock.assert_async().await;
}
