fn main() -> anyhow::Result<()> {
    tabletop::run()
}
