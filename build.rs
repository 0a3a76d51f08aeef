// The custom build script, needed as we use built for version reporting.

fn main() -> Result<(), anyhow::Error> {
    built::write_built_file()?;
    Ok(())
}
