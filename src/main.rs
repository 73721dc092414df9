fn main() {
    if let Err(e) = arena_scout::run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
