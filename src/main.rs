fn main() {
    if let Err(e) = nftpager::app::run_cli() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
