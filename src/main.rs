fn main() -> anyhow::Result<()> {
    csvloop_lib::run()
}
