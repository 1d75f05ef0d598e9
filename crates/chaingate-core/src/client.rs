//! Typed call surface: one method per supported JSON-RPC operation.
//!
//! Each operation only assembles positional parameters and picks the method
//! name; dispatch, error classification and normalization happen in
//! [`RpcDispatcher`].

use std::str::FromStr;
use std::sync::Arc;

use num_traits::ToPrimitive;
use serde_json::{json, Value};

use crate::abi::{AbiCodec, OutputDescriptor};
use crate::dispatcher::RpcDispatcher;
use crate::error::GatewayError;
use crate::signer::{KeyMaterial, Signer};
use crate::units;

/// JSON-RPC method names used by [`ChainClient`].
pub mod methods {
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const NET_VERSION: &str = "net_version";
    pub const CLIENT_VERSION: &str = "web3_clientVersion";
    pub const BLOCK_NUMBER: &str = "eth_blockNumber";
    pub const GAS_PRICE: &str = "eth_gasPrice";
    pub const MAX_PRIORITY_FEE: &str = "eth_maxPriorityFeePerGas";
    pub const SYNCING: &str = "eth_syncing";
    pub const GET_BALANCE: &str = "eth_getBalance";
    pub const GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
    pub const GET_CODE: &str = "eth_getCode";
    pub const GET_STORAGE_AT: &str = "eth_getStorageAt";
    pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
    pub const GET_BLOCK_BY_HASH: &str = "eth_getBlockByHash";
    pub const GET_TRANSACTION_BY_HASH: &str = "eth_getTransactionByHash";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
    pub const GET_LOGS: &str = "eth_getLogs";
    pub const FEE_HISTORY: &str = "eth_feeHistory";
    pub const ESTIMATE_GAS: &str = "eth_estimateGas";
    pub const CALL: &str = "eth_call";
    pub const SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
}

/// Block selector accepted by state-reading methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Earliest,
    Pending,
    Safe,
    Finalized,
    Number(u64),
}

impl BlockTag {
    pub fn to_param(self) -> Result<Value, GatewayError> {
        Ok(match self {
            Self::Latest => json!("latest"),
            Self::Earliest => json!("earliest"),
            Self::Pending => json!("pending"),
            Self::Safe => json!("safe"),
            Self::Finalized => json!("finalized"),
            Self::Number(n) => Value::String(units::decimal_to_hex(n)?),
        })
    }
}

impl FromStr for BlockTag {
    type Err = GatewayError;

    /// Accepts the named tags, decimal block numbers and wire hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "earliest" => Ok(Self::Earliest),
            "pending" => Ok(Self::Pending),
            "safe" => Ok(Self::Safe),
            "finalized" => Ok(Self::Finalized),
            _ if units::is_wire_value(s) => {
                let n = units::parse_wire(s)?;
                n.to_u64().map(Self::Number).ok_or_else(|| GatewayError::InvalidNumber {
                    value: s.to_string(),
                    reason: "block number exceeds u64".into(),
                })
            }
            _ => s.parse().map(Self::Number).map_err(|_| GatewayError::InvalidNumber {
                value: s.to_string(),
                reason: "expected a block tag or block number".into(),
            }),
        }
    }
}

/// High-level client over a shared [`RpcDispatcher`].
#[derive(Debug, Clone)]
pub struct ChainClient {
    dispatcher: Arc<RpcDispatcher>,
}

impl ChainClient {
    pub fn new(dispatcher: Arc<RpcDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &RpcDispatcher {
        &self.dispatcher
    }

    fn encode_tx(&self, tx: &Value) -> Result<Value, GatewayError> {
        self.dispatcher.normalizer().serialize_for_wire(tx)
    }

    pub async fn chain_id(&self) -> Result<Value, GatewayError> {
        self.dispatcher.call(methods::CHAIN_ID, vec![]).await
    }

    pub async fn net_version(&self) -> Result<Value, GatewayError> {
        self.dispatcher.call(methods::NET_VERSION, vec![]).await
    }

    pub async fn client_version(&self) -> Result<Value, GatewayError> {
        self.dispatcher.call(methods::CLIENT_VERSION, vec![]).await
    }

    pub async fn block_number(&self) -> Result<Value, GatewayError> {
        self.dispatcher.call(methods::BLOCK_NUMBER, vec![]).await
    }

    pub async fn gas_price(&self) -> Result<Value, GatewayError> {
        self.dispatcher.call(methods::GAS_PRICE, vec![]).await
    }

    pub async fn max_priority_fee_per_gas(&self) -> Result<Value, GatewayError> {
        self.dispatcher.call(methods::MAX_PRIORITY_FEE, vec![]).await
    }

    /// `false` when in sync, otherwise the node's progress object.
    pub async fn syncing(&self) -> Result<Value, GatewayError> {
        self.dispatcher.call(methods::SYNCING, vec![]).await
    }

    /// Native balance of `address`, in whole units at the native scale.
    pub async fn get_balance(&self, address: &str, block: BlockTag) -> Result<Value, GatewayError> {
        self.dispatcher
            .call(methods::GET_BALANCE, vec![json!(address), block.to_param()?])
            .await
    }

    pub async fn get_transaction_count(
        &self,
        address: &str,
        block: BlockTag,
    ) -> Result<Value, GatewayError> {
        self.dispatcher
            .call(methods::GET_TRANSACTION_COUNT, vec![json!(address), block.to_param()?])
            .await
    }

    /// Contract bytecode. Returned verbatim: an empty account yields `"0x"`.
    pub async fn get_code(&self, address: &str, block: BlockTag) -> Result<Value, GatewayError> {
        self.dispatcher
            .call_raw(methods::GET_CODE, vec![json!(address), block.to_param()?])
            .await
    }

    /// A 32-byte storage word, returned verbatim.
    pub async fn get_storage_at(
        &self,
        address: &str,
        slot: &str,
        block: BlockTag,
    ) -> Result<Value, GatewayError> {
        self.dispatcher
            .call_raw(
                methods::GET_STORAGE_AT,
                vec![json!(address), json!(slot), block.to_param()?],
            )
            .await
    }

    pub async fn get_block_by_number(
        &self,
        block: BlockTag,
        full_transactions: bool,
    ) -> Result<Value, GatewayError> {
        self.dispatcher
            .call(
                methods::GET_BLOCK_BY_NUMBER,
                vec![block.to_param()?, json!(full_transactions)],
            )
            .await
    }

    pub async fn get_block_by_hash(
        &self,
        hash: &str,
        full_transactions: bool,
    ) -> Result<Value, GatewayError> {
        self.dispatcher
            .call(methods::GET_BLOCK_BY_HASH, vec![json!(hash), json!(full_transactions)])
            .await
    }

    pub async fn get_transaction_by_hash(&self, hash: &str) -> Result<Value, GatewayError> {
        self.dispatcher
            .call(methods::GET_TRANSACTION_BY_HASH, vec![json!(hash)])
            .await
    }

    /// Receipt of a mined transaction; an empty object while still pending.
    pub async fn get_transaction_receipt(&self, hash: &str) -> Result<Value, GatewayError> {
        self.dispatcher
            .call(methods::GET_TRANSACTION_RECEIPT, vec![json!(hash)])
            .await
    }

    /// Numeric filter fields (`fromBlock: 100`) are wire-encoded first.
    pub async fn get_logs(&self, filter: &Value) -> Result<Value, GatewayError> {
        let filter = self.encode_tx(filter)?;
        self.dispatcher.call(methods::GET_LOGS, vec![filter]).await
    }

    pub async fn fee_history(
        &self,
        block_count: u64,
        newest: BlockTag,
        reward_percentiles: &[f64],
    ) -> Result<Value, GatewayError> {
        let block_count = units::decimal_to_hex(block_count)?;
        self.dispatcher
            .call(
                methods::FEE_HISTORY,
                vec![json!(block_count), newest.to_param()?, json!(reward_percentiles)],
            )
            .await
    }

    pub async fn estimate_gas(&self, tx: &Value) -> Result<Value, GatewayError> {
        let tx = self.encode_tx(tx)?;
        self.dispatcher.call(methods::ESTIMATE_GAS, vec![tx]).await
    }

    /// `eth_call`. The return data is ABI bytes and comes back verbatim.
    pub async fn call(&self, tx: &Value, block: BlockTag) -> Result<Value, GatewayError> {
        let tx = self.encode_tx(tx)?;
        self.dispatcher
            .call_raw(methods::CALL, vec![tx, block.to_param()?])
            .await
    }

    /// Submit an already-signed transaction; returns its hash.
    pub async fn send_raw_transaction(&self, raw: &str) -> Result<Value, GatewayError> {
        self.dispatcher
            .call(methods::SEND_RAW_TRANSACTION, vec![json!(raw)])
            .await
    }

    /// Wire-encode `tx`, have `signer` sign it and submit the opaque result.
    pub async fn sign_and_send(
        &self,
        tx: &Value,
        signer: &dyn Signer,
        key: &KeyMaterial,
    ) -> Result<Value, GatewayError> {
        let payload = self.encode_tx(tx)?;
        let signed = signer.sign(&payload, key).await?;
        tracing::debug!(bytes = signed.as_wire().len(), "submitting signed transaction");
        self.send_raw_transaction(signed.as_wire()).await
    }

    /// Read a contract through `eth_call` with pre-encoded `calldata`.
    ///
    /// The raw return bytes are decoded by `codec` against `outputs`, and the
    /// decoded structure is normalized like any other response.
    pub async fn read_contract(
        &self,
        to: &str,
        calldata: &str,
        outputs: &[OutputDescriptor],
        codec: &dyn AbiCodec,
        block: BlockTag,
    ) -> Result<Value, GatewayError> {
        let raw = self
            .dispatcher
            .call_raw(
                methods::CALL,
                vec![json!({"to": to, "data": calldata}), block.to_param()?],
            )
            .await?;
        let data = raw.as_str().ok_or_else(|| GatewayError::Abi(format!(
            "eth_call returned non-string data: {raw}"
        )))?;
        let decoded = codec.decode_output(data, outputs)?;
        Ok(self.dispatcher.normalizer().normalize_from_wire(decoded))
    }
}
