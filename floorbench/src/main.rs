//! FloorBench binary entry point.

fn main() -> anyhow::Result<()> {
    floorbench::run()
}
