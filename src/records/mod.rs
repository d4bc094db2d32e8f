use std::ops::Range;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::info;

use crate::chain::rpc::RpcError;
use crate::chain::token_metadata::MetadataAccount;
use crate::chain::{IdentityError, Pubkey};
use crate::metadata::MetadataFetcher;
use crate::task::MetadataTask;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid owner identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    #[error("{0}")]
    Rpc(#[from] RpcError),

    #[error("record lookup failed: {message}")]
    Source { message: String },
}

impl FetchError {
    pub fn is_invalid_identity(&self) -> bool {
        matches!(self, Self::InvalidIdentity(_))
    }
}

/// An NFT as known from its on-chain metadata account. The off-chain
/// document is only reachable through `metadata_task`.
#[derive(Clone, Debug)]
pub struct OnChainRecord {
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub update_authority: Pubkey,
    pub seller_fee_basis_points: u16,
    pub metadata_task: MetadataTask,
}

impl OnChainRecord {
    pub fn new(
        mint: Pubkey,
        name: impl Into<String>,
        uri: impl Into<String>,
        fetcher: Arc<dyn MetadataFetcher>,
    ) -> Self {
        let uri = uri.into();
        Self {
            mint,
            name: name.into(),
            symbol: String::new(),
            metadata_task: MetadataTask::new(uri.clone(), fetcher),
            uri,
            update_authority: Pubkey::default(),
            seller_fee_basis_points: 0,
        }
    }

    pub fn from_account(account: MetadataAccount, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        let data = account.data;
        Self {
            mint: account.mint,
            name: data.name,
            symbol: data.symbol,
            metadata_task: MetadataTask::new(data.uri.clone(), fetcher),
            uri: data.uri,
            update_authority: account.update_authority,
            seller_fee_basis_points: data.seller_fee_basis_points,
        }
    }
}

/// Everything an owner holds, in the order the source returned it.
#[derive(Clone, Debug)]
pub struct RecordSet {
    owner: Pubkey,
    records: Arc<[OnChainRecord]>,
}

impl RecordSet {
    pub fn new(owner: Pubkey, records: Vec<OnChainRecord>) -> Self {
        Self {
            owner,
            records: records.into(),
        }
    }

    pub fn owner(&self) -> Pubkey {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OnChainRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OnChainRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[OnChainRecord] {
        &self.records
    }

    pub fn slice(&self, range: Range<usize>) -> &[OnChainRecord] {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        &self.records[start..end]
    }
}

/// Anything that can list the NFTs held by an owner.
pub trait RecordSource: Send + Sync {
    fn find_all_by_owner<'a>(
        &'a self,
        owner: &'a Pubkey,
    ) -> BoxFuture<'a, Result<Vec<OnChainRecord>, FetchError>>;
}

impl<S: RecordSource + ?Sized> RecordSource for Arc<S> {
    fn find_all_by_owner<'a>(
        &'a self,
        owner: &'a Pubkey,
    ) -> BoxFuture<'a, Result<Vec<OnChainRecord>, FetchError>> {
        (**self).find_all_by_owner(owner)
    }
}

/// Validates `owner` and loads its full record set. A malformed address is
/// rejected before the source is touched.
pub async fn fetch_record_set<S: RecordSource + ?Sized>(
    source: &S,
    owner: &str,
) -> Result<RecordSet, FetchError> {
    let owner = Pubkey::parse(owner)?;
    let records = source.find_all_by_owner(&owner).await?;
    info!(%owner, count = records.len(), "loaded record set");
    Ok(RecordSet::new(owner, records))
}
