fn main() {
    if let Err(e) = pkgconsole::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
