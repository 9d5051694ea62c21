//! Ethereum and ERC-20 transaction signing

use ethers::abi::{self, Token};
use ethers::prelude::{Address, Bytes, TransactionRequest as EthersTransactionRequest, U256};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::id;
use tracing::{debug, info, instrument};

use super::types::{EvmTransfer, SignedTransaction};
use super::validation::{normalize_evm_amount, strip_whitespace, to_base_units, validate_gas_params};
use crate::crypto::encoding::keccak256;
use crate::crypto::keys::ethereum as eth;
use crate::error::{Error, Result};
use crate::network::{CoinType, Network};

/// ERC-20 `transfer(address,uint256)` signature
const ERC20_TRANSFER: &str = "transfer(address,uint256)";

/// Call data of an ERC-20 `transfer` of `amount` base units to `to`
pub fn erc20_transfer_data(to: Address, amount: U256) -> Bytes {
    let mut data = id(ERC20_TRANSFER).to_vec();
    data.extend(abi::encode(&[Token::Address(to), Token::Uint(amount)]));
    data.into()
}

/// Sign a legacy EIP-155 transaction moving ETH or an ERC-20 token
///
/// Native transfers carry the amount as the transaction value. Token
/// transfers call the token contract with zero value and the amount in the
/// call data.
#[instrument(skip_all, fields(network = %network, coin = %transfer.coin.code, nonce = transfer.nonce))]
pub fn sign_evm_transaction(network: Network, transfer: &EvmTransfer) -> Result<SignedTransaction> {
    network.require_coin_type(CoinType::Eth)?;
    let coin = &transfer.coin;
    if coin.coin_type != CoinType::Eth {
        return Err(Error::UnsupportedNetwork(format!(
            "{} is not an EVM asset",
            coin.code
        )));
    }

    let secret_key = eth::decode_private_key(&strip_whitespace(&transfer.from_private_key))?;
    let to = eth::parse_address(&strip_whitespace(&transfer.to_address))?;

    let amount = normalize_evm_amount(coin, transfer.amount)?;
    let gas = validate_gas_params(transfer.nonce, transfer.gas_price, transfer.gas_limit)?;
    let units = U256::from(to_base_units(coin, amount)?);

    let chain_id = network
        .params()
        .chain_id
        .ok_or_else(|| Error::UnsupportedNetwork(format!("{} has no chain id", network)))?;

    let request = match &coin.contract_address {
        None => EthersTransactionRequest::new()
            .to(to)
            .value(units)
            .data(Bytes::default()),
        Some(contract) => {
            let contract = eth::parse_address(contract)?;
            debug!(token = %coin.code, contract = ?contract, "Encoding ERC-20 transfer");
            EthersTransactionRequest::new()
                .to(contract)
                .value(U256::zero())
                .data(erc20_transfer_data(to, units))
        }
    }
    .nonce(gas.nonce)
    .gas_price(U256::from(gas.gas_price))
    .gas(gas.gas_limit)
    .chain_id(chain_id);

    let wallet = LocalWallet::from_bytes(&secret_key.secret_bytes())
        .map_err(|e| Error::InvalidPrivateKey(e.to_string()))?
        .with_chain_id(chain_id);

    let tx: TypedTransaction = request.into();
    let signature = wallet
        .sign_transaction_sync(&tx)
        .map_err(|e| Error::Signing(e.to_string()))?;

    let raw = tx.rlp_signed(&signature).to_vec();
    let hash = format!("0x{}", hex::encode(keccak256(&raw)));
    info!(%hash, chain_id, "Signed EVM transaction");

    Ok(SignedTransaction {
        raw,
        hash,
        coin_type: CoinType::Eth,
    })
}
