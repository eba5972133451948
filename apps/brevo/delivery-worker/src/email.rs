use async_trait::async_trait;
use brevo_mailer::{Mailer, MailerResult, Params, Recipient, Sendable};

/// An email assembled from command-line arguments
#[derive(Debug, Clone)]
pub struct TemplateEmail {
    pub template_id: i64,
    pub to: Vec<Recipient>,
    pub reply_to: Option<Recipient>,
    pub params: Params,
}

#[async_trait]
impl Sendable for TemplateEmail {
    async fn execute(&self, mailer: &Mailer) -> MailerResult<String> {
        mailer
            .send_email(
                self.template_id,
                self.to.clone(),
                self.reply_to.clone(),
                self.params.clone(),
            )
            .await
    }
}

/// Parse `email` or `Display Name <email>`.
pub fn parse_recipient(raw: &str) -> Recipient {
    let raw = raw.trim();

    if let Some((name, rest)) = raw.split_once('<') {
        if let Some(email) = rest.strip_suffix('>') {
            let recipient = Recipient::new(email.trim());
            let name = name.trim().trim_matches('"');
            return if name.is_empty() {
                recipient
            } else {
                recipient.with_name(name)
            };
        }
    }

    Recipient::new(raw)
}
