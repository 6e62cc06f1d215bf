use anyhow::Context;
use async_trait::async_trait;

use super::{EmailMessage, Mailer};

pub struct SendGridMailer {
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl SendGridMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        });

        self.client
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to send SendGrid request")?
            .error_for_status()
            .context("SendGrid API returned error")?;

        Ok(())
    }
}
