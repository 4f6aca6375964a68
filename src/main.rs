fn main() {
    if let Err(e) = industrial_reconstruct_lib::run() {
        eprintln!("[STARTUP] Fatal: {}", e);
        std::process::exit(1);
    }
}
