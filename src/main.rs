fn main() {
    if let Err(err) = edge_connections::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
