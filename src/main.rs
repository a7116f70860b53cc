fn main() -> anyhow::Result<()> {
    byteme_lib::run()
}
