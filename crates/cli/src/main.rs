//! Entry point for the `unisync` executable; the work happens in the
//! library crate.

fn main() -> anyhow::Result<()> {
    unisync::run()
}
