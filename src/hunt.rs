//! The vault withdrawal plan.
//!
//! One repetition declares three chained calls against the hunt package:
//!
//! 1. `key::new()` creates a key,
//! 2. `key::set_code(&mut key, code)` configures it,
//! 3. `vault::withdraw<T>(vault, key)` trades the key for a coin.
//!
//! After the last repetition every withdrawn coin is transferred, in order, to
//! the sender in a single `TransferObjects` command.

use crate::error::{Result, SweepError};
use crate::transaction::validation::MAX_PROGRAMMABLE_TX_COMMANDS;
use crate::transaction::{ObjectArg, PtbBuilder};
use crate::types::{MoveTarget, ObjectId, SuiAddress, TypeTag};
use std::fmt;
use tracing::debug;

pub const KEY_MODULE: &str = "key";
pub const KEY_NEW_FUNCTION: &str = "new";
pub const KEY_SET_CODE_FUNCTION: &str = "set_code";
pub const VAULT_MODULE: &str = "vault";
pub const VAULT_WITHDRAW_FUNCTION: &str = "withdraw";

/// Coin type used to pay for gas.
pub const GAS_COIN_TYPE: &str = "0x2::sui::SUI";

pub const COMMANDS_PER_REPETITION: usize = 3;

/// Upper bound such that all repetitions plus the final transfer fit in one container.
pub const MAX_REPETITIONS: u32 =
    ((MAX_PROGRAMMABLE_TX_COMMANDS - 1) / COMMANDS_PER_REPETITION) as u32;

pub const DEFAULT_REPETITIONS: u32 = 2;

/// Number of withdrawal chains, always in `1..=MAX_REPETITIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repetitions(u32);

impl Repetitions {
    pub fn new(count: u32) -> Result<Self> {
        if count == 0 || count > MAX_REPETITIONS {
            return Err(SweepError::InvalidRepetitions(format!(
                "{} is outside the valid range 1..={}",
                count, MAX_REPETITIONS
            )));
        }
        Ok(Repetitions(count))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Commands the plan declares: three per repetition plus the transfer.
    pub fn command_count(&self) -> usize {
        self.0 as usize * COMMANDS_PER_REPETITION + 1
    }
}

impl Default for Repetitions {
    fn default() -> Self {
        Repetitions(DEFAULT_REPETITIONS)
    }
}

impl fmt::Display for Repetitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The vault is a shared object; its initial version is resolved from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedObjectRef {
    pub id: ObjectId,
    pub initial_shared_version: u64,
}

#[derive(Debug, Clone)]
pub struct HuntPlan {
    pub package: ObjectId,
    pub vault: SharedObjectRef,
    pub key_code: u64,
    pub coin_type: TypeTag,
    pub repetitions: Repetitions,
}

impl HuntPlan {
    pub fn key_new_target(&self) -> Result<MoveTarget> {
        MoveTarget::new(self.package, KEY_MODULE, KEY_NEW_FUNCTION)
    }

    pub fn key_set_code_target(&self) -> Result<MoveTarget> {
        MoveTarget::new(self.package, KEY_MODULE, KEY_SET_CODE_FUNCTION)
    }

    pub fn vault_withdraw_target(&self) -> Result<MoveTarget> {
        MoveTarget::new(self.package, VAULT_MODULE, VAULT_WITHDRAW_FUNCTION)
    }

    /// Appends every repetition and the final transfer to `ptb`.
    pub fn declare(&self, ptb: &mut PtbBuilder, recipient: SuiAddress) -> Result<()> {
        let new_key = self.key_new_target()?;
        let set_code = self.key_set_code_target()?;
        let withdraw = self.vault_withdraw_target()?;

        let mut coins = Vec::with_capacity(self.repetitions.get() as usize);
        for round in 0..self.repetitions.get() {
            let key = ptb.move_call(&new_key, vec![], vec![])?;

            let key_ref = ptb.borrow(&key)?;
            let code = ptb.pure(&self.key_code)?;
            ptb.move_call_unit(&set_code, vec![], vec![key_ref, code])?;

            let vault = ptb.object(ObjectArg::SharedObject {
                id: self.vault.id,
                initial_shared_version: self.vault.initial_shared_version,
                mutable: true,
            })?;
            let key = ptb.consume(key)?;
            let coin =
                ptb.move_call(&withdraw, vec![self.coin_type.clone()], vec![vault, key])?;

            debug!(round, coin_command = coin.command_index(), "Declared withdrawal");
            coins.push(coin);
        }

        let recipient = ptb.pure(&recipient)?;
        ptb.transfer_objects(coins, recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Argument, CallArg, Command};

    fn test_plan(repetitions: u32) -> HuntPlan {
        HuntPlan {
            package: ObjectId::from_hex_literal("0xef97").unwrap(),
            vault: SharedObjectRef {
                id: ObjectId::from_hex_literal("0x3005").unwrap(),
                initial_shared_version: 11,
            },
            key_code: 1504,
            coin_type: "0x2::sui::SUI".parse().unwrap(),
            repetitions: Repetitions::new(repetitions).unwrap(),
        }
    }

    fn function_of(command: &Command) -> &str {
        match command {
            Command::MoveCall(call) => &call.function,
            Command::TransferObjects(..) => "transfer",
        }
    }

    fn sealed(plan: &HuntPlan) -> crate::transaction::ProgrammableTransaction {
        let mut ptb = PtbBuilder::new();
        plan.declare(&mut ptb, ObjectId::from_hex_literal("0xa11ce").unwrap())
            .unwrap();
        ptb.finish().unwrap()
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        assert!(matches!(
            Repetitions::new(0),
            Err(SweepError::InvalidRepetitions(_))
        ));
    }

    #[test]
    fn test_repetition_bounds() {
        assert!(Repetitions::new(1).is_ok());
        assert!(Repetitions::new(MAX_REPETITIONS).is_ok());
        assert!(Repetitions::new(MAX_REPETITIONS + 1).is_err());
        assert_eq!(Repetitions::default().get(), 2);
    }

    #[test]
    fn test_two_repetitions_command_order() {
        let pt = sealed(&test_plan(2));
        let functions: Vec<&str> = pt.commands.iter().map(function_of).collect();
        assert_eq!(
            functions,
            vec!["new", "set_code", "withdraw", "new", "set_code", "withdraw", "transfer"]
        );

        match pt.commands.last() {
            Some(Command::TransferObjects(coins, _)) => assert_eq!(coins.len(), 2),
            other => panic!("expected transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_configure_uses_key_from_same_repetition() {
        let pt = sealed(&test_plan(3));
        for round in 0..3usize {
            let new_index = (round * COMMANDS_PER_REPETITION) as u16;
            for offset in 1..=2 {
                let Command::MoveCall(call) = &pt.commands[round * COMMANDS_PER_REPETITION + offset]
                else {
                    panic!("expected move call");
                };
                let key_arg = if call.function == "set_code" {
                    call.arguments[0]
                } else {
                    call.arguments[1]
                };
                assert_eq!(key_arg, Argument::Result(new_index));
            }
        }
    }

    #[test]
    fn test_every_coin_transferred_exactly_once() {
        let reps = 5u32;
        let pt = sealed(&test_plan(reps));

        let withdraw_results: Vec<Argument> = pt
            .commands
            .iter()
            .enumerate()
            .filter(|(_, c)| function_of(c) == "withdraw")
            .map(|(i, _)| Argument::Result(i as u16))
            .collect();

        let Some(Command::TransferObjects(coins, _)) = pt.commands.last() else {
            panic!("last command must be the transfer");
        };
        assert_eq!(coins, &withdraw_results);
        assert_eq!(pt.commands.len(), Repetitions::new(reps).unwrap().command_count());
    }

    #[test]
    fn test_inputs_shared_across_repetitions() {
        let pt = sealed(&test_plan(4));
        // Code constant, vault and recipient.
        assert_eq!(pt.inputs.len(), 3);
        assert_eq!(pt.inputs[0], CallArg::Pure(1504u64.to_le_bytes().to_vec()));
        assert!(matches!(
            pt.inputs[1],
            CallArg::Object(ObjectArg::SharedObject {
                initial_shared_version: 11,
                mutable: true,
                ..
            })
        ));
    }

    #[test]
    fn test_withdraw_carries_coin_type() {
        let pt = sealed(&test_plan(1));
        let Command::MoveCall(call) = &pt.commands[2] else {
            panic!("expected move call");
        };
        assert_eq!(call.module, VAULT_MODULE);
        assert_eq!(call.type_arguments.len(), 1);
        assert_eq!(
            call.type_arguments[0].to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000002::sui::SUI"
        );
    }

    #[test]
    fn test_max_repetitions_fit_in_one_container() {
        let pt = sealed(&test_plan(MAX_REPETITIONS));
        assert!(pt.commands.len() <= MAX_PROGRAMMABLE_TX_COMMANDS);
    }
}
