/// Protocol limits checked locally before a container is sealed
use crate::error::{Result, SweepError};
use crate::transaction::types::{Argument, Command, ProgrammableTransaction, TransactionData};

/// Maximum number of commands in one programmable transaction.
pub const MAX_PROGRAMMABLE_TX_COMMANDS: usize = 1024;

/// Maximum number of inputs (pure and object) in one programmable transaction.
pub const MAX_INPUTS: usize = 2048;

/// Maximum type arguments on a single Move call.
pub const MAX_TYPE_ARGUMENTS: usize = 16;

/// Maximum serialized transaction size in bytes.
pub const MAX_TX_SIZE_BYTES: usize = 128 * 1024;

/// Checks the command/input limits and that every argument points backwards.
pub(crate) fn validate_programmable(pt: &ProgrammableTransaction) -> Result<()> {
    if pt.commands.is_empty() {
        return Err(SweepError::InvalidTransaction(
            "Programmable transaction has no commands".to_string(),
        ));
    }
    if pt.commands.len() > MAX_PROGRAMMABLE_TX_COMMANDS {
        return Err(SweepError::ContainerLimit(format!(
            "{} commands (max: {})",
            pt.commands.len(),
            MAX_PROGRAMMABLE_TX_COMMANDS
        )));
    }
    if pt.inputs.len() > MAX_INPUTS {
        return Err(SweepError::ContainerLimit(format!(
            "{} inputs (max: {})",
            pt.inputs.len(),
            MAX_INPUTS
        )));
    }

    for (index, command) in pt.commands.iter().enumerate() {
        let arguments: Vec<&Argument> = match command {
            Command::MoveCall(call) => {
                if call.type_arguments.len() > MAX_TYPE_ARGUMENTS {
                    return Err(SweepError::ContainerLimit(format!(
                        "command {} has {} type arguments (max: {})",
                        index,
                        call.type_arguments.len(),
                        MAX_TYPE_ARGUMENTS
                    )));
                }
                call.arguments.iter().collect()
            }
            Command::TransferObjects(objects, recipient) => {
                if objects.is_empty() {
                    return Err(SweepError::InvalidTransaction(format!(
                        "command {} transfers no objects",
                        index
                    )));
                }
                objects.iter().chain(std::iter::once(recipient)).collect()
            }
        };

        for argument in arguments {
            match *argument {
                Argument::Input(i) if usize::from(i) >= pt.inputs.len() => {
                    return Err(SweepError::InvalidTransaction(format!(
                        "command {} references missing input {}",
                        index, i
                    )));
                }
                Argument::Result(r) | Argument::NestedResult(r, _) if usize::from(r) >= index => {
                    return Err(SweepError::InvalidTransaction(format!(
                        "command {} references result {} which is not declared before it",
                        index, r
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Validates gas settings and serialized size of sealed transaction data.
pub fn validate_transaction_data(data: &TransactionData) -> Result<()> {
    validate_programmable(data.programmable())?;

    let gas = data.gas_data();
    if gas.payment.is_empty() {
        return Err(SweepError::InvalidTransaction(
            "No gas payment object".to_string(),
        ));
    }
    if gas.budget == 0 {
        return Err(SweepError::InvalidTransaction(
            "Gas budget must be greater than zero".to_string(),
        ));
    }

    let size = data.to_bytes()?.len();
    if size > MAX_TX_SIZE_BYTES {
        return Err(SweepError::ContainerLimit(format!(
            "transaction is {} bytes (max: {})",
            size, MAX_TX_SIZE_BYTES
        )));
    }
    Ok(())
}
