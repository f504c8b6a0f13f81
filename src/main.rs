fn main() {
    if let Err(err) = fitscan_lib::run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}
