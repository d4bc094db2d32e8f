use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nftpager",
    version,
    about = "browse the NFTs held by a Solana wallet",
    long_about = "nftpager lists the NFTs held by a Solana wallet and pages through them, fetching each NFT's off-chain metadata only when its page is shown.\n\nExamples:\n  nftpager -o Geh5Ss5knQGym81toYGXDbH3MFU2JCMK7E4QyeBHor1b\n  nftpager -o <ADDRESS> --page-size 5 --cluster devnet\n  nftpager -o <ADDRESS> --format json\n\nWhile running, type n (next), p (prev), r (refetch) or q (quit)."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'F',
        long = "format",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Page output format: text or json."
    )]
    pub format: Option<String>,

    #[arg(
        long = "fallback-image",
        value_name = "URL",
        help_heading = "Output",
        help = "Image shown for NFTs without one (default /fallbackImage.jpg)."
    )]
    pub fallback_image: Option<String>,

    #[arg(
        short = 'o',
        long = "owner",
        visible_alias = "address",
        value_name = "ADDRESS",
        help_heading = "Input",
        help = "Wallet address whose NFTs are listed."
    )]
    pub owner: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.nftpager/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'c',
        long = "cluster",
        value_name = "NAME",
        help_heading = "Network",
        help = "Cluster to query: mainnet-beta, devnet or testnet."
    )]
    pub cluster: Option<String>,

    #[arg(
        short = 'u',
        long = "rpc-url",
        value_name = "URL",
        help_heading = "Network",
        help = "Custom RPC endpoint (overrides --cluster)."
    )]
    pub rpc_url: Option<String>,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Network",
        help = "HTTP timeout for RPC and metadata requests."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'n',
        long = "page-size",
        visible_alias = "per-page",
        value_name = "N",
        help_heading = "Paging",
        help = "NFTs shown per page."
    )]
    pub page_size: Option<usize>,
}
