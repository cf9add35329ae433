use eyre::Result;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    if !config.automation.is_configured() {
        eyre::bail!("No DomoticzHost configured");
    }
    println!("{}", config.automation.switch_on_url());
    Ok(())
}
