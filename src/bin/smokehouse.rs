// Command-line front end: list, dump, or diff a filtered corpus.
// Usage: cargo run --bin smokehouse -- list --skip oopif

fn main() {
    smokehouse::cli::run();
}
