//! Post command

use crate::config::Settings;
use anyhow::Result;
use sttr_cloud::SlackChatClient;

pub async fn execute(settings: &Settings, channel: &str, text: &str) -> Result<()> {
    let client = SlackChatClient::new(settings.slack_token.clone(), sttr_cloud::http_client()?)?;
    let ts = client.post_message(channel, text).await?;
    println!("{}", ts);
    Ok(())
}
