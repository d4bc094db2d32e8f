//! Pages through a wallet's NFTs using the library directly.
//!
//! cargo run --example library_gallery -- <OWNER> [PAGE_SIZE]

use std::num::NonZeroUsize;
use std::sync::Arc;

use nftpager::chain::rpc::SolanaRpc;
use nftpager::chain::Cluster;
use nftpager::gallery::{Gallery, GalleryOptions};
use nftpager::metadata::{HttpMetadataFetcher, MetadataFetcher};
use nftpager::pager::Direction;
use nftpager::utils;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let owner = args.next().ok_or("usage: library_gallery <OWNER> [PAGE_SIZE]")?;
    let page_size = match args.next() {
        Some(raw) => utils::parse_positive(&raw)?,
        None => NonZeroUsize::MIN,
    };

    let client = utils::build_http_client(utils::DEFAULT_TIMEOUT_SECONDS)?;
    let fetcher: Arc<dyn MetadataFetcher> = Arc::new(HttpMetadataFetcher::new(client.clone()));
    let rpc = SolanaRpc::new(client, Cluster::MainnetBeta.rpc_url(), fetcher);

    let mut gallery = Gallery::new(
        rpc,
        GalleryOptions {
            page_size,
            ..GalleryOptions::default()
        },
    );
    gallery.fetch(&owner).await?;
    println!("{} NFTs over {} pages", gallery.record_count(), gallery.last_page());

    loop {
        println!("-- page {}/{}", gallery.current_page(), gallery.last_page());
        for entry in gallery.visible_slice().unwrap_or_default() {
            println!("{:>4}  {}  {}", entry.index + 1, entry.name, entry.image);
        }
        if !gallery.change_page(Direction::Next).await {
            break;
        }
    }
    Ok(())
}
