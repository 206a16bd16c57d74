use anyhow::Result;

fn main() -> Result<()> {
    asmrun::cli::run()
}
