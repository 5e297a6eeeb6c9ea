//! Pure assembly of publish and upgrade transactions. No network I/O.

use std::marker::PhantomData;

use serde::Serialize;

use super::codec;
use super::{Argument, CallArg, Command, MoveCall, ObjectArg, Transaction, UpgradePolicy};
use crate::build::ArtifactDescriptor;
use crate::error::Result;
use crate::types::{Address, Identity, ObjectRef, PackageId};

const FRAMEWORK_PACKAGE: Address = Address::from_short(2);
const PACKAGE_MODULE: &str = "package";
const AUTHORIZE_UPGRADE: &str = "authorize_upgrade";
const COMMIT_UPGRADE: &str = "commit_upgrade";

/// Invariant lifetime unique to one [`TransactionBuilder::build`] call.
#[derive(Debug, Clone, Copy)]
struct Brand<'id>(PhantomData<fn(&'id ()) -> &'id ()>);

impl Brand<'_> {
    fn new() -> Self {
        Self(PhantomData)
    }
}

/// Authorization to run exactly one upgrade in the builder that issued it.
///
/// Tickets carry their builder's brand, so one from another transaction
/// does not type-check:
///
/// ```compile_fail
/// use hoist_core::build::ArtifactDescriptor;
/// use hoist_core::transaction::{TransactionBuilder, UpgradePolicy};
/// use hoist_core::types::Address;
///
/// let artifact = ArtifactDescriptor::new(vec![vec![1]], vec![], vec![0; 32]);
/// TransactionBuilder::build(|first| {
///     let cap = first.pure(&Address::from_short(1))?;
///     let ticket = first.authorize_upgrade(cap, UpgradePolicy::Compatible, &[0; 32])?;
///     TransactionBuilder::build(|second| {
///         let _receipt = second.upgrade(&artifact, Address::from_short(9), ticket);
///         Ok::<_, hoist_core::Error>(())
///     })?;
///     Ok::<_, hoist_core::Error>(())
/// });
/// ```
#[derive(Debug)]
#[must_use = "an upgrade ticket must be consumed by an upgrade command"]
pub struct UpgradeTicket<'id> {
    argument: Argument,
    _brand: Brand<'id>,
}

/// Proof an upgrade ran; must be committed in the same builder.
#[derive(Debug)]
#[must_use = "an upgrade receipt must be committed"]
pub struct UpgradeReceipt<'id> {
    argument: Argument,
    _brand: Brand<'id>,
}

/// Accumulates inputs and commands in order.
#[derive(Debug)]
pub struct TransactionBuilder<'id> {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    brand: Brand<'id>,
}

impl TransactionBuilder<'_> {
    /// Run `assemble` against a fresh builder and return the finished transaction.
    pub fn build<F, E>(assemble: F) -> std::result::Result<Transaction, E>
    where
        F: for<'id> FnOnce(&mut TransactionBuilder<'id>) -> std::result::Result<(), E>,
    {
        let mut builder = TransactionBuilder {
            inputs: Vec::new(),
            commands: Vec::new(),
            brand: Brand::new(),
        };
        assemble(&mut builder)?;
        Ok(Transaction {
            inputs: builder.inputs,
            commands: builder.commands,
        })
    }
}

impl<'id> TransactionBuilder<'id> {
    fn input(&mut self, arg: CallArg) -> Argument {
        let index = self.inputs.len() as u16;
        self.inputs.push(arg);
        Argument::Input(index)
    }

    /// Plain value input, encoded in the ledger's binary format.
    pub fn pure<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<Argument> {
        let bytes = codec::to_bytes(value)?;
        Ok(self.input(CallArg::Pure(bytes)))
    }

    /// Owned object input. The same object passed twice maps to one input.
    pub fn object(&mut self, object: ObjectRef) -> Argument {
        let existing = self.inputs.iter().position(|input| {
            matches!(input, CallArg::Object(ObjectArg::ImmOrOwned(o)) if o.object_id == object.object_id)
        });
        match existing {
            Some(index) => Argument::Input(index as u16),
            None => self.input(CallArg::Object(ObjectArg::ImmOrOwned(object))),
        }
    }

    pub fn command(&mut self, command: Command) -> Argument {
        let index = self.commands.len() as u16;
        self.commands.push(command);
        Argument::Result(index)
    }

    pub fn move_call(
        &mut self,
        package: Address,
        module: &str,
        function: &str,
        arguments: Vec<Argument>,
    ) -> Argument {
        self.command(Command::MoveCall(MoveCall {
            package,
            module: module.to_string(),
            function: function.to_string(),
            type_arguments: Vec::new(),
            arguments,
        }))
    }

    /// Publish the artifact; the result is the new package's upgrade capability.
    pub fn publish(&mut self, artifact: &ArtifactDescriptor) -> Argument {
        self.command(Command::Publish {
            modules: artifact.modules().to_vec(),
            dependencies: artifact.dependencies().to_vec(),
        })
    }

    pub fn transfer_objects(&mut self, objects: Vec<Argument>, recipient: Argument) {
        self.command(Command::TransferObjects { objects, recipient });
    }

    pub fn authorize_upgrade(
        &mut self,
        capability: Argument,
        policy: UpgradePolicy,
        digest: &[u8],
    ) -> Result<UpgradeTicket<'id>> {
        let policy = self.pure(&policy.as_u8())?;
        let digest = self.pure(digest)?;
        let argument = self.move_call(
            FRAMEWORK_PACKAGE,
            PACKAGE_MODULE,
            AUTHORIZE_UPGRADE,
            vec![capability, policy, digest],
        );
        Ok(UpgradeTicket {
            argument,
            _brand: self.brand,
        })
    }

    pub fn upgrade(
        &mut self,
        artifact: &ArtifactDescriptor,
        package: PackageId,
        ticket: UpgradeTicket<'id>,
    ) -> UpgradeReceipt<'id> {
        let argument = self.command(Command::Upgrade {
            modules: artifact.modules().to_vec(),
            dependencies: artifact.dependencies().to_vec(),
            package,
            ticket: ticket.argument,
        });
        UpgradeReceipt {
            argument,
            _brand: self.brand,
        }
    }

    pub fn commit_upgrade(&mut self, capability: Argument, receipt: UpgradeReceipt<'id>) {
        self.move_call(
            FRAMEWORK_PACKAGE,
            PACKAGE_MODULE,
            COMMIT_UPGRADE,
            vec![capability, receipt.argument],
        );
    }
}

/// Publish `artifact` and hand the resulting upgrade capability to `publisher`.
///
/// `publisher` must be the identity that signs and submits the transaction,
/// otherwise the capability would be stranded.
pub fn build_publish(artifact: &ArtifactDescriptor, publisher: Identity) -> Result<Transaction> {
    TransactionBuilder::build(|tx| {
        let capability = tx.publish(artifact);
        let recipient = tx.pure(&publisher)?;
        tx.transfer_objects(vec![capability], recipient);
        Ok(())
    })
}

/// Authorize, run and commit an upgrade of `package` in one transaction.
pub fn build_upgrade(
    artifact: &ArtifactDescriptor,
    package: PackageId,
    capability: ObjectRef,
    policy: UpgradePolicy,
) -> Result<Transaction> {
    TransactionBuilder::build(|tx| {
        let cap = tx.object(capability);
        let ticket = tx.authorize_upgrade(cap, policy, artifact.digest())?;
        let receipt = tx.upgrade(artifact, package, ticket);
        tx.commit_upgrade(cap, receipt);
        Ok(())
    })
}
