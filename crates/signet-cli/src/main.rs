fn main() {
    if let Err(e) = signet_cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
