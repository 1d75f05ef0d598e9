//! chaingate-core — JSON-RPC dispatch and lossless value normalization.
//!
//! # Overview
//!
//! ChainGate turns typed calls ("balance of X") into JSON-RPC envelopes,
//! correlates responses (batched ones included) back to their callers,
//! classifies failures, and converts every numeric value between wire hex
//! base units and decimal whole units without ever going through floating
//! point. The core crate defines:
//!
//! - [`units`] — exact hex ⇄ decimal conversion at a decimal scale
//! - [`Normalizer`] — field-name driven request/response normalization
//! - [`RpcDispatcher`] — single and batched calls with ordered middleware
//! - [`RpcTransport`] — the async trait every transport implements
//! - [`ChainClient`] — the typed call surface
//! - [`Signer`] / [`AbiCodec`] — seams to the external signing and ABI modules
//! - [`GatewayError`] / [`TransportError`] — the error taxonomy

pub mod abi;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod normalize;
pub mod request;
pub mod signer;
pub mod transport;
pub mod units;

pub use abi::{AbiCodec, OutputDescriptor};
pub use client::{methods, BlockTag, ChainClient};
pub use config::GatewayConfig;
pub use dispatcher::{BatchResult, RpcDispatcher};
pub use error::{GatewayError, TransportError};
pub use middleware::{MiddlewareStack, RequestMiddleware, ResponseMiddleware};
pub use normalize::{classify_field, classify_method, FieldClass, IdentifierSet, Normalizer, ResultClass};
pub use request::{JsonRpcError, JsonRpcRequest, RawResponse, RpcCall, RpcId, RpcParam};
pub use signer::{KeyMaterial, SignedPayload, Signer};
pub use transport::RpcTransport;
pub use units::DecimalValue;
