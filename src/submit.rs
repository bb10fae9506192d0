//! Resolve inputs, seal, sign and submit the hunt transaction

use crate::config::{Config, HuntSettings};
use crate::crypto::KeyPair;
use crate::error::{Result, SweepError};
use crate::hunt::{HuntPlan, SharedObjectRef};
use crate::rpc::{Coin, DryRunResponse, ExecutionOutcome, SuiRpcClient};
use crate::transaction::validation::validate_transaction_data;
use crate::transaction::{PtbBuilder, TransactionData};
use crate::types::{ObjectId, SuiAddress};
use tracing::{info, warn};

/// Budget plus an optional fixed price; the reference price is used otherwise.
#[derive(Debug, Clone, Copy)]
pub struct GasSettings {
    pub budget: u64,
    pub price: Option<u64>,
}

impl From<&Config> for GasSettings {
    fn from(config: &Config) -> Self {
        GasSettings {
            budget: config.gas.budget,
            price: config.gas.price,
        }
    }
}

/// Looks up the vault's shared-object version.
pub async fn resolve_vault(client: &SuiRpcClient, vault: ObjectId) -> Result<SharedObjectRef> {
    let object = client.get_object(vault).await?;
    let initial_shared_version = object.initial_shared_version().ok_or_else(|| {
        SweepError::InvalidObject(format!("{} is not a shared object", vault))
    })?;
    Ok(SharedObjectRef {
        id: vault,
        initial_shared_version,
    })
}

/// Picks the largest SUI coin that covers the budget on its own.
pub fn select_gas_coin(coins: &[Coin], budget: u64) -> Result<&Coin> {
    coins
        .iter()
        .filter(|coin| coin.balance >= budget)
        .max_by_key(|coin| coin.balance)
        .ok_or_else(|| {
            let best = coins.iter().map(|c| c.balance).max().unwrap_or(0);
            SweepError::InsufficientGas(format!(
                "no single coin covers the budget of {} MIST (largest: {})",
                budget, best
            ))
        })
}

/// Builds the sealed transaction data for `sender`.
pub async fn prepare(
    client: &SuiRpcClient,
    settings: &HuntSettings,
    gas: GasSettings,
    sender: SuiAddress,
) -> Result<TransactionData> {
    let vault = resolve_vault(client, settings.vault).await?;
    info!(
        vault = %vault.id,
        version = vault.initial_shared_version,
        "Resolved vault"
    );

    let price = match gas.price {
        Some(price) => price,
        None => client.reference_gas_price().await?,
    };

    let coins = client
        .get_all_coins(sender, crate::hunt::GAS_COIN_TYPE)
        .await?;
    let gas_coin = select_gas_coin(&coins, gas.budget)?;
    info!(
        coin = %gas_coin.coin_object_id,
        balance = gas_coin.balance,
        price,
        budget = gas.budget,
        "Selected gas coin"
    );

    let plan = HuntPlan {
        package: settings.package,
        vault,
        key_code: settings.key_code,
        coin_type: settings.coin_type.clone(),
        repetitions: settings.repetitions,
    };

    let mut ptb = PtbBuilder::new();
    plan.declare(&mut ptb, sender)?;
    let pt = ptb.finish()?;
    info!(
        commands = pt.commands.len(),
        inputs = pt.inputs.len(),
        repetitions = %settings.repetitions,
        "Sealed programmable transaction"
    );

    let data = TransactionData::new_programmable(
        sender,
        vec![gas_coin.object_ref()?],
        pt,
        gas.budget,
        price,
    );
    validate_transaction_data(&data)?;
    Ok(data)
}

/// Simulates the transaction without a signature.
pub async fn dry_run(client: &SuiRpcClient, data: &TransactionData) -> Result<DryRunResponse> {
    let tx_bytes = data.to_base64()?;
    let response = client.dry_run(&tx_bytes).await?;
    info!(status = %response.effects.status.status, "Dry run finished");
    Ok(response)
}

/// Signs and submits; a failed execution status is returned as an error.
pub async fn sign_and_execute(
    client: &SuiRpcClient,
    data: &TransactionData,
    keypair: &KeyPair,
) -> Result<ExecutionOutcome> {
    if keypair.address() != data.sender() {
        return Err(SweepError::KeyError(format!(
            "Key pair address {} does not match sender {}",
            keypair.address(),
            data.sender()
        )));
    }

    let signed = data.sign(keypair)?;
    let local_digest = signed.digest.to_string();
    info!(digest = %local_digest, "Submitting transaction");

    let outcome = client.execute(&signed).await?;
    if outcome.digest != local_digest {
        warn!(
            local = %local_digest,
            remote = %outcome.digest,
            "Node reported a different transaction digest"
        );
    }

    if let Some(effects) = &outcome.effects {
        if !effects.status.is_success() {
            return Err(SweepError::ExecutionFailed {
                digest: outcome.digest.clone(),
                reason: effects
                    .status
                    .error
                    .clone()
                    .unwrap_or_else(|| effects.status.status.clone()),
            });
        }
    }
    Ok(outcome)
}
