fn main() -> anyhow::Result<()> {
    truckmaps::cli::run_cli()
}
