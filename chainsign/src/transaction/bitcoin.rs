//! Bitcoin and Litecoin transaction signing
//!
//! A transaction is built from caller supplied UTXO references and
//! receivers. The referenced outputs are fetched through a
//! [`LedgerProvider`], then each input is signed according to the script
//! of the output it spends.

use std::collections::HashSet;

use bitcoin::absolute::LockTime;
use bitcoin::consensus;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, Instruction, PushBytesBuf};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use futures::future::try_join_all;
use secp256k1::{ecdsa, All, Message, PublicKey, Secp256k1, SecretKey};
use tracing::{debug, info, instrument, warn};

use super::provider::LedgerProvider;
use super::types::{SignedTransaction, TransactionReceiver, UtxoReference};
use super::validation::{normalize_receiver, normalize_utxo, NormalizedUtxo};
use crate::crypto::encoding::hash160;
use crate::error::{Error, Result};
use crate::network::{Coin, Network};

/// Shape of the locking script of a spent output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPattern {
    /// `<pubkey> OP_CHECKSIG`
    PayToPubkey,
    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    PayToPubkeyHash,
    /// `OP_0 <20 bytes>`
    PayToWitnessPubkeyHash,
    Unrecognized,
}

impl ScriptPattern {
    pub fn classify(script: &Script) -> Self {
        if script.is_p2pk() {
            Self::PayToPubkey
        } else if script.is_p2pkh() {
            Self::PayToPubkeyHash
        } else if script.is_p2wpkh() {
            Self::PayToWitnessPubkeyHash
        } else {
            Self::Unrecognized
        }
    }
}

/// Public key pushed by a P2PK script
fn p2pk_key(script: &Script) -> &[u8] {
    let bytes = script.as_bytes();
    &bytes[1..bytes.len() - 1]
}

/// Key hash committed to by a P2PKH script
fn p2pkh_hash(script: &Script) -> &[u8] {
    &script.as_bytes()[3..23]
}

/// Key hash committed to by a P2WPKH script
fn p2wpkh_hash(script: &Script) -> &[u8] {
    &script.as_bytes()[2..22]
}

/// A validated input together with the output it spends
struct ResolvedInput {
    utxo: NormalizedUtxo,
    prevout: TxOut,
    pattern: ScriptPattern,
}

impl ResolvedInput {
    fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.utxo.txid, self.utxo.index)
    }
}

/// How a signed input is unlocked
enum Unlock {
    ScriptSig(ScriptBuf),
    Witness(Witness),
}

/// Build and sign a transaction spending `utxos` to `receivers`
///
/// All inputs are validated before the provider is queried, and every
/// referenced transaction is fetched before anything is signed. The
/// difference between input and output totals is left as the fee.
#[instrument(skip_all, fields(coin = %coin.code, network = %network, inputs = utxos.len(), outputs = receivers.len()))]
pub async fn sign_utxo_transaction<P>(
    provider: &P,
    coin: &Coin,
    network: Network,
    utxos: &[UtxoReference],
    receivers: &[TransactionReceiver],
) -> Result<SignedTransaction>
where
    P: LedgerProvider + ?Sized,
{
    if !coin.coin_type.is_utxo() || !coin.is_native() {
        return Err(Error::UnsupportedNetwork(format!(
            "{} cannot be spent as a UTXO transaction",
            coin.code
        )));
    }
    network.require_coin_type(coin.coin_type)?;

    if utxos.is_empty() {
        return Err(Error::InvalidInput("At least one UTXO is required".to_string()));
    }
    if receivers.is_empty() {
        return Err(Error::InvalidInput("At least one receiver is required".to_string()));
    }

    let utxos = utxos
        .iter()
        .enumerate()
        .map(|(position, utxo)| normalize_utxo(network, position, utxo))
        .collect::<Result<Vec<_>>>()?;

    let receivers = receivers
        .iter()
        .enumerate()
        .map(|(position, receiver)| normalize_receiver(network, coin, position, receiver))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for (position, utxo) in utxos.iter().enumerate() {
        if !seen.insert((utxo.txid, utxo.index)) {
            return Err(Error::InvalidInput(format!(
                "UTXO #{} ({}:{}): output is spent twice",
                position, utxo.tx_hash, utxo.index
            )));
        }
    }

    let prevouts = try_join_all(
        utxos
            .iter()
            .enumerate()
            .map(|(position, utxo)| resolve_input(provider, network, position, utxo)),
    )
    .await?;

    let inputs: Vec<ResolvedInput> = utxos
        .into_iter()
        .zip(prevouts)
        .map(|(utxo, prevout)| ResolvedInput {
            pattern: ScriptPattern::classify(&prevout.script_pubkey),
            utxo,
            prevout,
        })
        .collect();

    let input_total: u128 = inputs.iter().map(|input| u128::from(input.prevout.value.to_sat())).sum();
    let output_total: u128 = receivers.iter().map(|receiver| u128::from(receiver.value)).sum();
    if output_total > input_total {
        return Err(Error::InvalidInput(format!(
            "Outputs total {} sat exceeds inputs total {} sat",
            output_total, input_total
        )));
    }

    let mut tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|input| TxIn {
                previous_output: input.outpoint(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            })
            .collect(),
        output: receivers
            .iter()
            .map(|receiver| TxOut {
                value: Amount::from_sat(receiver.value),
                script_pubkey: receiver.destination.script_pubkey(),
            })
            .collect(),
    };

    let secp = Secp256k1::new();
    let unlocks = {
        let mut cache = SighashCache::new(&tx);
        inputs
            .iter()
            .enumerate()
            .map(|(index, input)| sign_input(&secp, &mut cache, index, input))
            .collect::<Result<Vec<_>>>()?
    };

    for (txin, unlock) in tx.input.iter_mut().zip(unlocks) {
        match unlock {
            Unlock::ScriptSig(script_sig) => txin.script_sig = script_sig,
            Unlock::Witness(witness) => txin.witness = witness,
        }
    }

    let prevouts: Vec<TxOut> = inputs.into_iter().map(|input| input.prevout).collect();
    verify_transaction(&secp, network, &tx, &prevouts)?;

    let txid = tx.compute_txid().to_string();
    info!(%txid, fee_sat = %(input_total - output_total), "Signed UTXO transaction");

    Ok(SignedTransaction {
        raw: consensus::serialize(&tx),
        hash: txid,
        coin_type: coin.coin_type,
    })
}

/// Fetch the output a UTXO reference points at
async fn resolve_input<P>(
    provider: &P,
    network: Network,
    position: usize,
    utxo: &NormalizedUtxo,
) -> Result<TxOut>
where
    P: LedgerProvider + ?Sized,
{
    let upstream = |reason: String| {
        Error::UpstreamResolutionFailure(format!("UTXO #{} ({}): {}", position, utxo.tx_hash, reason))
    };

    let raw = match provider.fetch_transaction(network, &utxo.tx_hash).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Err(upstream("transaction not found".to_string())),
        Err(e) => {
            warn!(tx_hash = %utxo.tx_hash, error = %e, "Ledger lookup failed");
            return Err(upstream(e.to_string()));
        }
    };

    let previous: Transaction = consensus::deserialize(&raw)
        .map_err(|e| upstream(format!("malformed transaction: {}", e)))?;

    let txid = previous.compute_txid();
    if txid != utxo.txid {
        return Err(upstream(format!("ledger returned transaction {}", txid)));
    }

    let prevout = previous
        .output
        .into_iter()
        .nth(utxo.index as usize)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "UTXO #{} ({}:{}): transaction has no such output",
                position, utxo.tx_hash, utxo.index
            ))
        })?;

    debug!(position, tx_hash = %utxo.tx_hash, index = utxo.index, value = prevout.value.to_sat(), "Resolved input");
    Ok(prevout)
}

fn ecdsa_signature(secp: &Secp256k1<All>, digest: [u8; 32], secret_key: &SecretKey) -> bitcoin::ecdsa::Signature {
    bitcoin::ecdsa::Signature {
        signature: secp.sign_ecdsa(&Message::from_digest(digest), secret_key),
        sighash_type: EcdsaSighashType::All,
    }
}

fn push_bytes(data: Vec<u8>) -> Result<PushBytesBuf> {
    PushBytesBuf::try_from(data).map_err(|e| Error::Signing(e.to_string()))
}

/// Sign input `index` for the pattern of the output it spends
fn sign_input(
    secp: &Secp256k1<All>,
    cache: &mut SighashCache<&Transaction>,
    index: usize,
    input: &ResolvedInput,
) -> Result<Unlock> {
    let script = &input.prevout.script_pubkey;
    let key = &input.utxo.key;
    let key_mismatch = || {
        Error::InvalidInput(format!(
            "UTXO #{} ({}:{}): private key does not control the referenced output",
            index, input.utxo.tx_hash, input.utxo.index
        ))
    };

    let unlock = match input.pattern {
        ScriptPattern::PayToPubkey => {
            if p2pk_key(script) != key.public_key_bytes().as_slice() {
                return Err(key_mismatch());
            }
            let sighash = cache
                .legacy_signature_hash(index, script, EcdsaSighashType::All.to_u32())
                .map_err(|e| Error::Signing(e.to_string()))?;
            let signature = ecdsa_signature(secp, sighash.to_byte_array(), &key.secret_key);

            Unlock::ScriptSig(Builder::new().push_slice(push_bytes(signature.to_vec())?).into_script())
        }
        ScriptPattern::PayToPubkeyHash => {
            let public_key = key.public_key_bytes();
            if p2pkh_hash(script) != hash160(&public_key) {
                return Err(key_mismatch());
            }
            let sighash = cache
                .legacy_signature_hash(index, script, EcdsaSighashType::All.to_u32())
                .map_err(|e| Error::Signing(e.to_string()))?;
            let signature = ecdsa_signature(secp, sighash.to_byte_array(), &key.secret_key);

            Unlock::ScriptSig(
                Builder::new()
                    .push_slice(push_bytes(signature.to_vec())?)
                    .push_slice(push_bytes(public_key)?)
                    .into_script(),
            )
        }
        ScriptPattern::PayToWitnessPubkeyHash => {
            // Witness programs only commit to compressed keys
            let public_key = PublicKey::from_secret_key(secp, &key.secret_key).serialize();
            if p2wpkh_hash(script) != hash160(&public_key) {
                return Err(key_mismatch());
            }
            let sighash = cache
                .p2wpkh_signature_hash(index, script, input.prevout.value, EcdsaSighashType::All)
                .map_err(|e| Error::Signing(e.to_string()))?;
            let signature = ecdsa_signature(secp, sighash.to_byte_array(), &key.secret_key);

            let mut witness = Witness::new();
            witness.push(signature.to_vec());
            witness.push(public_key);
            Unlock::Witness(witness)
        }
        ScriptPattern::Unrecognized => {
            return Err(Error::UnsignableScript(format!(
                "UTXO #{} ({}:{}) is locked by {}",
                index,
                input.utxo.tx_hash,
                input.utxo.index,
                script.to_asm_string()
            )));
        }
    };

    debug!(index, pattern = ?input.pattern, "Signed input");
    Ok(unlock)
}

/// Check a signed transaction before it is handed out
///
/// `prevouts[i]` is the output spent by input `i`.
pub fn verify_transaction(
    secp: &Secp256k1<All>,
    network: Network,
    tx: &Transaction,
    prevouts: &[TxOut],
) -> Result<()> {
    let failure = |reason: String| Error::InternalValidationFailure(reason);

    if tx.input.is_empty() || tx.output.is_empty() {
        return Err(failure("transaction has no inputs or no outputs".to_string()));
    }
    if tx.input.len() != prevouts.len() {
        return Err(failure("spent outputs do not match inputs".to_string()));
    }

    let mut outpoints = HashSet::new();
    if !tx.input.iter().all(|txin| outpoints.insert(txin.previous_output)) {
        return Err(failure("transaction spends an output twice".to_string()));
    }

    let max_money = network.params().max_money;
    let mut output_total: u64 = 0;
    for txout in &tx.output {
        output_total = output_total
            .checked_add(txout.value.to_sat())
            .filter(|total| *total <= max_money)
            .ok_or_else(|| failure("output value out of range".to_string()))?;
    }
    let input_total = prevouts
        .iter()
        .try_fold(0u64, |total, prevout| total.checked_add(prevout.value.to_sat()))
        .ok_or_else(|| failure("input value out of range".to_string()))?;
    if input_total < output_total {
        return Err(failure("outputs exceed inputs".to_string()));
    }

    let mut cache = SighashCache::new(tx);
    for (index, (txin, prevout)) in tx.input.iter().zip(prevouts).enumerate() {
        let script = &prevout.script_pubkey;
        let invalid = |reason: &str| failure(format!("input {}: {}", index, reason));

        let (digest, signature, public_key) = match ScriptPattern::classify(script) {
            ScriptPattern::PayToPubkey => {
                let [signature] = script_pushes(&txin.script_sig)
                    .and_then(|pushes| <[Vec<u8>; 1]>::try_from(pushes).ok())
                    .ok_or_else(|| invalid("malformed P2PK scriptSig"))?;
                let sighash = cache
                    .legacy_signature_hash(index, script, EcdsaSighashType::All.to_u32())
                    .map_err(|e| invalid(&e.to_string()))?;
                (sighash.to_byte_array(), signature, p2pk_key(script).to_vec())
            }
            ScriptPattern::PayToPubkeyHash => {
                let [signature, public_key] = script_pushes(&txin.script_sig)
                    .and_then(|pushes| <[Vec<u8>; 2]>::try_from(pushes).ok())
                    .ok_or_else(|| invalid("malformed P2PKH scriptSig"))?;
                if p2pkh_hash(script) != hash160(&public_key) {
                    return Err(invalid("public key does not match the key hash"));
                }
                let sighash = cache
                    .legacy_signature_hash(index, script, EcdsaSighashType::All.to_u32())
                    .map_err(|e| invalid(&e.to_string()))?;
                (sighash.to_byte_array(), signature, public_key)
            }
            ScriptPattern::PayToWitnessPubkeyHash => {
                if !txin.script_sig.is_empty() || txin.witness.len() != 2 {
                    return Err(invalid("malformed P2WPKH witness"));
                }
                let signature = txin.witness.nth(0).unwrap_or_default().to_vec();
                let public_key = txin.witness.nth(1).unwrap_or_default().to_vec();
                if p2wpkh_hash(script) != hash160(&public_key) {
                    return Err(invalid("public key does not match the witness program"));
                }
                let sighash = cache
                    .p2wpkh_signature_hash(index, script, prevout.value, EcdsaSighashType::All)
                    .map_err(|e| invalid(&e.to_string()))?;
                (sighash.to_byte_array(), signature, public_key)
            }
            ScriptPattern::Unrecognized => return Err(invalid("unsupported script")),
        };

        let signature = bitcoin::ecdsa::Signature::from_slice(&signature)
            .map_err(|e| invalid(&e.to_string()))?;
        if signature.sighash_type != EcdsaSighashType::All {
            return Err(invalid("signature is not SIGHASH_ALL"));
        }
        let public_key = PublicKey::from_slice(&public_key).map_err(|e| invalid(&e.to_string()))?;

        verify_signature(secp, digest, &signature.signature, &public_key)
            .map_err(|_| invalid("signature does not verify"))?;
    }

    Ok(())
}

fn verify_signature(
    secp: &Secp256k1<All>,
    digest: [u8; 32],
    signature: &ecdsa::Signature,
    public_key: &PublicKey,
) -> std::result::Result<(), secp256k1::Error> {
    secp.verify_ecdsa(&Message::from_digest(digest), signature, public_key)
}

/// Data pushes of a push-only script, `None` if it contains opcodes
fn script_pushes(script: &Script) -> Option<Vec<Vec<u8>>> {
    script
        .instructions()
        .map(|instruction| match instruction {
            Ok(Instruction::PushBytes(bytes)) => Some(bytes.as_bytes().to_vec()),
            _ => None,
        })
        .collect()
}
