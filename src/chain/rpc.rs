//! Solana JSON-RPC access and the `RecordSource` built on it.
//!
//! Listing an owner's NFTs takes two round trips: the owner's SPL token
//! accounts give the candidate mints, then the Metaplex metadata accounts
//! for those mints are read in batches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use super::pda::{self, PdaError};
use super::token_metadata::MetadataAccount;
use super::{Pubkey, TOKEN_METADATA_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::metadata::MetadataFetcher;
use crate::records::{FetchError, OnChainRecord, RecordSource};

pub const JSON_RPC_VERSION: &str = "2.0";

/// Upper bound on addresses per `getMultipleAccounts` call.
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}")]
    Http { endpoint: String, status: u16 },

    #[error("rpc error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("empty result for {method}")]
    MissingResult { method: &'static str },

    #[error("failed to decode {method} result: {message}")]
    Decode {
        method: &'static str,
        message: String,
    },

    #[error("failed to derive metadata address: {0}")]
    Pda(#[from] PdaError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn into_typed_result<T: DeserializeOwned>(
        self,
        method: &'static str,
    ) -> Result<T, RpcError> {
        if let Some(err) = self.error {
            return Err(RpcError::Server {
                code: err.code,
                message: err.message,
            });
        }
        let value = self.result.ok_or(RpcError::MissingResult { method })?;
        serde_json::from_value(value).map_err(|e| RpcError::Decode {
            method,
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WithContext<T> {
    pub value: T,
}

#[derive(Debug, Deserialize)]
pub struct KeyedTokenAccount {
    pub account: ParsedTokenAccount,
}

#[derive(Debug, Deserialize)]
pub struct ParsedTokenAccount {
    pub data: ParsedTokenData,
}

#[derive(Debug, Deserialize)]
pub struct ParsedTokenData {
    pub parsed: ParsedTokenInfo,
}

#[derive(Debug, Deserialize)]
pub struct ParsedTokenInfo {
    pub info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    pub mint: String,
    pub token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
pub struct TokenAmount {
    pub amount: String,
    pub decimals: u8,
}

#[derive(Debug, Deserialize)]
pub struct EncodedAccount {
    pub data: (String, String),
    pub owner: String,
}

/// Mints of token accounts holding exactly one indivisible token, in the
/// order the node listed the accounts.
pub fn nft_mints(accounts: &[KeyedTokenAccount]) -> Vec<Pubkey> {
    accounts
        .iter()
        .map(|keyed| &keyed.account.data.parsed.info)
        .filter(|info| info.token_amount.decimals == 0 && info.token_amount.amount == "1")
        .filter_map(|info| Pubkey::parse(&info.mint).ok())
        .collect()
}

/// Raw data of each account, `None` where the account does not exist, is not
/// owned by the metadata program or is not base64 encoded.
pub fn decode_accounts(accounts: Vec<Option<EncodedAccount>>) -> Vec<Option<Vec<u8>>> {
    let program = TOKEN_METADATA_PROGRAM_ID.to_string();
    accounts
        .into_iter()
        .map(|account| {
            let account = account?;
            if account.owner != program || account.data.1 != "base64" {
                return None;
            }
            base64::engine::general_purpose::STANDARD
                .decode(account.data.0)
                .ok()
        })
        .collect()
}

/// Pairs each mint with its metadata account data and builds the records.
/// Mints without a readable account are left out.
pub fn assemble_records(
    mints: &[Pubkey],
    accounts: Vec<Option<Vec<u8>>>,
    fetcher: &Arc<dyn MetadataFetcher>,
) -> Vec<OnChainRecord> {
    mints
        .iter()
        .zip(accounts)
        .filter_map(|(mint, data)| {
            let data = data?;
            match MetadataAccount::decode(&data) {
                Ok(account) if account.mint == *mint => {
                    Some(OnChainRecord::from_account(account, Arc::clone(fetcher)))
                }
                Ok(account) => {
                    debug!(%mint, found = %account.mint, "metadata account names another mint");
                    None
                }
                Err(e) => {
                    debug!(%mint, error = %e, "skipping undecodable metadata account");
                    None
                }
            }
        })
        .collect()
}

/// Injectable Solana RPC client.
pub struct SolanaRpc {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
    fetcher: Arc<dyn MetadataFetcher>,
}

impl SolanaRpc {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        fetcher: Arc<dyn MetadataFetcher>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
            fetcher,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, method: &'static str, params: Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, RpcError> {
        let request = self.build_request(method, params);
        debug!(method, id = request.id, endpoint = %self.endpoint, "rpc call");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }
        let body: RpcResponse = response.json().await.map_err(|e| RpcError::Decode {
            method,
            message: e.to_string(),
        })?;
        body.into_typed_result(method)
    }

    pub async fn nft_mints_by_owner(&self, owner: &Pubkey) -> Result<Vec<Pubkey>, RpcError> {
        let accounts: WithContext<Vec<KeyedTokenAccount>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([
                    owner.to_string(),
                    { "programId": TOKEN_PROGRAM_ID.to_string() },
                    { "encoding": "jsonParsed" }
                ]),
            )
            .await?;
        let mints = nft_mints(&accounts.value);
        debug!(%owner, token_accounts = accounts.value.len(), nfts = mints.len(), "token accounts listed");
        Ok(mints)
    }

    pub async fn account_data(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, RpcError> {
        let mut out = Vec::with_capacity(addresses.len());
        for chunk in addresses.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let keys: Vec<String> = chunk.iter().map(Pubkey::to_string).collect();
            let accounts: WithContext<Vec<Option<EncodedAccount>>> = self
                .call(
                    "getMultipleAccounts",
                    json!([keys, { "encoding": "base64" }]),
                )
                .await?;
            if accounts.value.len() != chunk.len() {
                return Err(RpcError::Decode {
                    method: "getMultipleAccounts",
                    message: format!(
                        "expected {} accounts, got {}",
                        chunk.len(),
                        accounts.value.len()
                    ),
                });
            }
            out.extend(decode_accounts(accounts.value));
        }
        Ok(out)
    }

    pub async fn records_by_owner(&self, owner: &Pubkey) -> Result<Vec<OnChainRecord>, RpcError> {
        let mints = self.nft_mints_by_owner(owner).await?;
        let addresses = mints
            .iter()
            .map(pda::metadata_address)
            .collect::<Result<Vec<_>, _>>()?;
        let accounts = self.account_data(&addresses).await?;
        let records = assemble_records(&mints, accounts, &self.fetcher);
        info!(%owner, mints = mints.len(), records = records.len(), "nft records loaded");
        Ok(records)
    }
}

impl RecordSource for SolanaRpc {
    fn find_all_by_owner<'a>(
        &'a self,
        owner: &'a Pubkey,
    ) -> BoxFuture<'a, Result<Vec<OnChainRecord>, FetchError>> {
        async move { self.records_by_owner(owner).await.map_err(FetchError::from) }.boxed()
    }
}
