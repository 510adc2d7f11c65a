use crate::config::Config;

pub fn execute() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
