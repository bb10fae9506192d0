//! Programmable transaction container with typed call result handles.
//!
//! Declarations are local and synchronous. Each Move call that returns a value
//! yields a [`Handle`] which is neither `Clone` nor `Copy`: it can be borrowed
//! as an argument any number of times but consumed only once, and only by the
//! container that produced it. [`PtbBuilder::finish`] refuses to seal a
//! container while any handle is still outstanding.

use crate::error::{Result, SweepError};
use crate::transaction::types::{
    Argument, CallArg, Command, ObjectArg, ProgrammableMoveCall, ProgrammableTransaction,
};
use crate::transaction::validation::{
    validate_programmable, MAX_INPUTS, MAX_PROGRAMMABLE_TX_COMMANDS,
};
use crate::types::{MoveTarget, TypeTag};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Output of a declared Move call, scoped to its container.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an unconsumed call result makes the container impossible to seal"]
pub struct Handle {
    container: u64,
    command: u16,
}

impl Handle {
    pub fn container_id(&self) -> u64 {
        self.container
    }

    pub fn command_index(&self) -> u16 {
        self.command
    }
}

#[derive(Debug)]
pub struct PtbBuilder {
    id: u64,
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    unconsumed: BTreeSet<u16>,
}

impl Default for PtbBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PtbBuilder {
    pub fn new() -> Self {
        PtbBuilder {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            inputs: Vec::new(),
            commands: Vec::new(),
            unconsumed: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn inputs(&self) -> &[CallArg] {
        &self.inputs
    }

    /// Adds a BCS-encoded pure input. Identical values share one input slot.
    pub fn pure<T: Serialize>(&mut self, value: &T) -> Result<Argument> {
        let bytes = bcs::to_bytes(value)?;
        if let Some(i) = self
            .inputs
            .iter()
            .position(|arg| matches!(arg, CallArg::Pure(existing) if *existing == bytes))
        {
            return Ok(Argument::Input(i as u16));
        }
        self.push_input(CallArg::Pure(bytes))
    }

    /// Adds an object input. The same object id always maps to one input slot;
    /// a shared object requested mutably anywhere is mutable for the whole container.
    pub fn object(&mut self, arg: ObjectArg) -> Result<Argument> {
        let id = arg.id();
        let existing = self
            .inputs
            .iter()
            .position(|input| matches!(input, CallArg::Object(o) if o.id() == id));

        let Some(i) = existing else {
            return self.push_input(CallArg::Object(arg));
        };

        match (&mut self.inputs[i], arg) {
            (
                CallArg::Object(ObjectArg::SharedObject {
                    initial_shared_version,
                    mutable,
                    ..
                }),
                ObjectArg::SharedObject {
                    initial_shared_version: requested_version,
                    mutable: requested_mutable,
                    ..
                },
            ) if *initial_shared_version == requested_version => {
                *mutable |= requested_mutable;
            }
            (CallArg::Object(existing), requested) if *existing == requested => {}
            _ => {
                return Err(SweepError::InvalidTransaction(format!(
                    "Object {} was already added with a different reference",
                    id
                )))
            }
        }
        Ok(Argument::Input(i as u16))
    }

    fn push_input(&mut self, arg: CallArg) -> Result<Argument> {
        if self.inputs.len() >= MAX_INPUTS {
            return Err(SweepError::ContainerLimit(format!(
                "cannot add more than {} inputs",
                MAX_INPUTS
            )));
        }
        self.inputs.push(arg);
        Ok(Argument::Input((self.inputs.len() - 1) as u16))
    }

    fn check_owner(&self, handle: &Handle) -> Result<()> {
        if handle.container != self.id {
            return Err(SweepError::ForeignHandle {
                expected: self.id,
                found: handle.container,
            });
        }
        Ok(())
    }

    /// Uses a result by reference; the handle stays outstanding.
    pub fn borrow(&self, handle: &Handle) -> Result<Argument> {
        self.check_owner(handle)?;
        Ok(Argument::Result(handle.command))
    }

    /// Uses a result by value, retiring the handle.
    pub fn consume(&mut self, handle: Handle) -> Result<Argument> {
        self.check_owner(&handle)?;
        self.unconsumed.remove(&handle.command);
        Ok(Argument::Result(handle.command))
    }

    fn push_command(&mut self, command: Command) -> Result<u16> {
        if self.commands.len() >= MAX_PROGRAMMABLE_TX_COMMANDS {
            return Err(SweepError::ContainerLimit(format!(
                "cannot declare more than {} commands",
                MAX_PROGRAMMABLE_TX_COMMANDS
            )));
        }
        self.commands.push(command);
        Ok((self.commands.len() - 1) as u16)
    }

    fn move_call_command(
        target: &MoveTarget,
        type_arguments: Vec<TypeTag>,
        arguments: Vec<Argument>,
    ) -> Command {
        Command::MoveCall(Box::new(ProgrammableMoveCall {
            package: target.package,
            module: target.module.clone(),
            function: target.function.clone(),
            type_arguments,
            arguments,
        }))
    }

    /// Declares a Move call whose single return value must be used later.
    pub fn move_call(
        &mut self,
        target: &MoveTarget,
        type_arguments: Vec<TypeTag>,
        arguments: Vec<Argument>,
    ) -> Result<Handle> {
        let index = self.push_command(Self::move_call_command(target, type_arguments, arguments))?;
        self.unconsumed.insert(index);
        Ok(Handle {
            container: self.id,
            command: index,
        })
    }

    /// Declares a Move call that returns nothing.
    pub fn move_call_unit(
        &mut self,
        target: &MoveTarget,
        type_arguments: Vec<TypeTag>,
        arguments: Vec<Argument>,
    ) -> Result<()> {
        self.push_command(Self::move_call_command(target, type_arguments, arguments))?;
        Ok(())
    }

    /// Declares a transfer of every handle in `objects`, in order, to `recipient`.
    pub fn transfer_objects(&mut self, objects: Vec<Handle>, recipient: Argument) -> Result<()> {
        if objects.is_empty() {
            return Err(SweepError::InvalidTransaction(
                "Transfer needs at least one object".to_string(),
            ));
        }
        for handle in &objects {
            self.check_owner(handle)?;
        }
        let arguments = objects
            .iter()
            .map(|handle| Argument::Result(handle.command))
            .collect();
        self.push_command(Command::TransferObjects(arguments, recipient))?;
        // Handles are retired only once the transfer is actually declared.
        for handle in objects {
            self.unconsumed.remove(&handle.command);
        }
        Ok(())
    }

    /// Seals the container.
    pub fn finish(self) -> Result<ProgrammableTransaction> {
        if !self.unconsumed.is_empty() {
            return Err(SweepError::UnconsumedHandles(
                self.unconsumed.into_iter().collect(),
            ));
        }
        let pt = ProgrammableTransaction {
            inputs: self.inputs,
            commands: self.commands,
        };
        validate_programmable(&pt)?;
        Ok(pt)
    }
}
