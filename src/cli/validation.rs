use crate::chain::Cluster;
use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.cluster.as_deref() {
        if Cluster::parse(raw).is_none() {
            return Err(format!(
                "invalid --cluster '{raw}', expected mainnet-beta, devnet or testnet"
            ));
        }
    }
    if let Some(raw) = args.rpc_url.as_deref() {
        validate_rpc_url(raw).map_err(|e| format!("invalid --rpc-url '{raw}': {e}"))?;
    }
    if let Some(raw) = args.format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --format '{raw}', expected text or json"));
        }
    }
    Ok(())
}

pub fn validate_rpc_url(raw: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}
